//! Request validation from catalog rules.

use crate::config::{ColumnInfo, ColumnKind, ResolvedEntity};
use crate::error::AppError;
use serde_json::{Map, Value};

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create body: all required fields present, no unknown fields.
    /// Returns the written columns and their values in catalog order.
    pub fn validate(entity: &ResolvedEntity, body: &Map<String, Value>) -> Result<(Vec<String>, Vec<Value>), AppError> {
        reject_unknown(entity, body)?;
        for col in &entity.columns {
            let val = body.get(&col.name);
            if col.required() && (val.is_none() || val == Some(&Value::Null)) {
                return Err(AppError::InvalidArgument(format!("{} is required", col.name)));
            }
        }
        collect(entity, body)
    }

    /// Validate only the fields present in body (for PUT). Required is not enforced for missing fields.
    pub fn validate_partial(
        entity: &ResolvedEntity,
        body: &Map<String, Value>,
    ) -> Result<(Vec<String>, Vec<Value>), AppError> {
        reject_unknown(entity, body)?;
        if body.is_empty() {
            return Err(AppError::InvalidArgument("body must set at least one field".into()));
        }
        collect(entity, body)
    }
}

fn reject_unknown(entity: &ResolvedEntity, body: &Map<String, Value>) -> Result<(), AppError> {
    for key in body.keys() {
        if *key == entity.pk_column {
            return Err(AppError::InvalidArgument(format!("{} is not writable", key)));
        }
        if entity.column(key).is_none() {
            return Err(AppError::InvalidArgument(format!("unknown field {}", key)));
        }
    }
    Ok(())
}

fn collect(entity: &ResolvedEntity, body: &Map<String, Value>) -> Result<(Vec<String>, Vec<Value>), AppError> {
    let mut columns = Vec::new();
    let mut data = Vec::new();
    for col in &entity.columns {
        if let Some(v) = body.get(&col.name) {
            validate_field(col, v)?;
            columns.push(col.name.clone());
            data.push(v.clone());
        }
    }
    Ok((columns, data))
}

fn validate_field(col: &ColumnInfo, v: &Value) -> Result<(), AppError> {
    let name = col.name.as_str();
    let rule = &col.validation;
    if v.is_null() {
        if col.nullable {
            return Ok(());
        }
        return Err(AppError::InvalidArgument(format!("{} must not be null", name)));
    }

    match col.kind {
        ColumnKind::Text if !v.is_string() => {
            return Err(AppError::InvalidArgument(format!("{} must be a string", name)));
        }
        ColumnKind::Integer if v.as_i64().is_none() => {
            return Err(AppError::InvalidArgument(format!("{} must be an integer", name)));
        }
        ColumnKind::Numeric if !v.is_number() => {
            return Err(AppError::InvalidArgument(format!("{} must be a number", name)));
        }
        ColumnKind::Boolean if !v.is_boolean() => {
            return Err(AppError::InvalidArgument(format!("{} must be a boolean", name)));
        }
        _ => {}
    }

    if let Some(s) = v.as_str() {
        let len = s.chars().count();
        if let Some(max) = rule.max_length {
            if len > max as usize {
                return Err(AppError::InvalidArgument(format!(
                    "{} must be at most {} characters",
                    name, max
                )));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min as usize {
                return Err(AppError::InvalidArgument(format!(
                    "{} must be at least {} characters",
                    name, min
                )));
            }
        }
        if let Some(re) = &col.pattern {
            if !re.is_match(s) {
                return Err(AppError::InvalidArgument(format!("{} does not match required pattern", name)));
            }
        }
    }

    if let Some(n) = v.as_f64() {
        if let Some(min) = rule.minimum {
            if n < min {
                return Err(AppError::InvalidArgument(format!("{} must be at least {}", name, min)));
            }
        }
        if let Some(min) = rule.exclusive_minimum {
            if n <= min {
                return Err(AppError::InvalidArgument(format!("{} must be greater than {}", name, min)));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                return Err(AppError::InvalidArgument(format!("{} must be at most {}", name, max)));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_catalog, resolve, ResolvedModel};
    use serde_json::json;

    fn model() -> ResolvedModel {
        resolve(&default_catalog().unwrap()).unwrap()
    }

    fn body(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::InvalidArgument(m) => m,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn game_body_comes_back_in_catalog_order() {
        let m = model();
        let games = m.entity_by_path("games").unwrap();
        let (cols, data) = RequestValidator::validate(
            games,
            &body(json!({"price": 19.99, "name": "Celeste", "publisher_id": 2, "description": null})),
        )
        .unwrap();
        assert_eq!(cols, ["publisher_id", "name", "description", "price"]);
        assert_eq!(data, vec![json!(2), json!("Celeste"), Value::Null, json!(19.99)]);
    }

    #[test]
    fn missing_required_field() {
        let m = model();
        let games = m.entity_by_path("games").unwrap();
        let err = RequestValidator::validate(games, &body(json!({"name": "Celeste", "price": 5}))).unwrap_err();
        assert_eq!(message(err), "publisher_id is required");
    }

    #[test]
    fn username_length_limit_counts_characters() {
        let m = model();
        let users = m.entity_by_path("users").unwrap();
        let ok = "é".repeat(45);
        assert!(RequestValidator::validate(
            users,
            &body(json!({"username": ok, "email": "a@b.ch", "password": "pw"}))
        )
        .is_ok());
        let err = RequestValidator::validate(
            users,
            &body(json!({"username": "x".repeat(46), "email": "a@b.ch", "password": "pw"})),
        )
        .unwrap_err();
        assert_eq!(message(err), "username must be at most 45 characters");
    }

    #[test]
    fn numeric_ranges() {
        let m = model();
        let games = m.entity_by_path("games").unwrap();
        let base = json!({"publisher_id": 1, "name": "Celeste", "price": 5});

        let mut b = body(base.clone());
        b.insert("price".into(), json!(0));
        assert_eq!(message(RequestValidator::validate(games, &b).unwrap_err()), "price must be greater than 0");

        let mut b = body(base.clone());
        b.insert("publisher_id".into(), json!(0));
        assert_eq!(message(RequestValidator::validate(games, &b).unwrap_err()), "publisher_id must be at least 1");

        let mut b = body(base);
        b.insert("publisher_id".into(), json!("1"));
        assert_eq!(message(RequestValidator::validate(games, &b).unwrap_err()), "publisher_id must be an integer");
    }

    #[test]
    fn description_may_be_null_but_not_too_long() {
        let m = model();
        let games = m.entity_by_path("games").unwrap();
        let err = RequestValidator::validate_partial(games, &body(json!({"description": "d".repeat(256)}))).unwrap_err();
        assert_eq!(message(err), "description must be at most 255 characters");
        assert!(RequestValidator::validate_partial(games, &body(json!({"description": null}))).is_ok());
        let err = RequestValidator::validate_partial(games, &body(json!({"name": null}))).unwrap_err();
        assert_eq!(message(err), "name must not be null");
    }

    #[test]
    fn unknown_and_key_fields_rejected() {
        let m = model();
        let genres = m.entity_by_path("genres").unwrap();
        let err = RequestValidator::validate(genres, &body(json!({"name": "rpg", "rating": 5}))).unwrap_err();
        assert_eq!(message(err), "unknown field rating");
        let err = RequestValidator::validate_partial(genres, &body(json!({"id": 3}))).unwrap_err();
        assert_eq!(message(err), "id is not writable");
    }

    #[test]
    fn partial_requires_at_least_one_field() {
        let m = model();
        let genres = m.entity_by_path("genres").unwrap();
        assert!(RequestValidator::validate_partial(genres, &Map::new()).is_err());
        let (cols, _) = RequestValidator::validate_partial(genres, &body(json!({"name": "action"}))).unwrap();
        assert_eq!(cols, ["name"]);
    }

    #[test]
    fn email_pattern() {
        let m = model();
        let users = m.entity_by_path("users").unwrap();
        let err = RequestValidator::validate_partial(users, &body(json!({"email": "not-an-email"}))).unwrap_err();
        assert_eq!(message(err), "email does not match required pattern");
    }
}
