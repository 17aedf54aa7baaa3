//! Entity CRUD handlers: list, create, read, update, delete.
//! Everything here validates before touching the store.

use crate::config::ResolvedEntity;
use crate::error::AppError;
use crate::response::{self, DeleteOutcome};
use crate::service::{RequestValidator, Written};
use crate::sql::Filter;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

fn entity_for<'a>(state: &'a AppState, path_segment: &str, operation: &str) -> Result<&'a ResolvedEntity, AppError> {
    let entity = state
        .model
        .entity_by_path(path_segment)
        .ok_or_else(|| AppError::NotFound(format!("resource {}", path_segment)))?;
    if !entity.allows(operation) {
        return Err(AppError::InvalidArgument(format!(
            "{} not allowed on {}",
            operation, path_segment
        )));
    }
    Ok(entity)
}

/// Path ids must be positive integers; anything else is rejected before the store sees it.
pub fn parse_id(id_str: &str) -> Result<i64, AppError> {
    match id_str.parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::InvalidArgument("id must be a positive integer".into())),
    }
}

fn body_to_map(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, AppError> {
    let Json(value) = body.map_err(|e| AppError::InvalidArgument(e.body_text()))?;
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::InvalidArgument("body must be a JSON object".into())),
    }
}

/// Query string -> (filter, limit). Accepts `?column=c&filter=s` or `?<column>=s`, at most one filter.
pub fn list_params(
    entity: &ResolvedEntity,
    params: &HashMap<String, String>,
) -> Result<(Option<Filter>, Option<u32>), AppError> {
    let limit = match params.get("limit") {
        None => None,
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(n) if n > 0 => Some(n),
            _ => return Err(AppError::InvalidArgument("limit must be a positive integer".into())),
        },
    };

    let mut filters = Vec::new();
    match (params.get("column"), params.get("filter")) {
        (Some(c), Some(f)) => {
            if !f.is_empty() {
                filters.push(Filter::new(c.as_str(), f.as_str()));
            }
        }
        (None, None) => {}
        _ => {
            return Err(AppError::InvalidArgument(
                "column and filter must be given together".into(),
            ))
        }
    }
    for (k, v) in params {
        if entity.column(k).is_some() && !v.is_empty() {
            filters.push(Filter::new(k.as_str(), v.as_str()));
        }
    }
    if filters.len() > 1 {
        return Err(AppError::InvalidArgument("only one filter is supported".into()));
    }
    let filter = filters.pop();
    if let Some(f) = &filter {
        if entity.column(&f.column).is_none() || entity.sensitive_columns.contains(&f.column) {
            return Err(AppError::InvalidArgument(format!("cannot filter on {}", f.column)));
        }
    }
    Ok((filter, limit))
}

fn strip_sensitive(entity: &ResolvedEntity, row: &mut Value) {
    if let Value::Object(map) = row {
        for c in &entity.sensitive_columns {
            map.remove(c);
        }
    }
}

fn strip_sensitive_written(entity: &ResolvedEntity, mut written: Written) -> Written {
    for c in &entity.sensitive_columns {
        written.data.remove(c);
    }
    written
}

pub async fn list(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment, "read")?;
    let (filter, limit) = list_params(entity, &params)?;
    let mut rows = state.store.list_all(entity, filter.as_ref(), limit).await?;
    for row in &mut rows {
        strip_sensitive(entity, row);
    }
    Ok(response::ok(rows))
}

pub async fn create(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment, "create")?;
    let body = body_to_map(body)?;
    let (columns, data) = RequestValidator::validate(entity, &body)?;
    let written = state.store.create(entity, &columns, &data).await?;
    Ok(response::created(strip_sensitive_written(entity, written)))
}

pub async fn read(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment, "read")?;
    let id = parse_id(&id_str)?;
    let mut row = state
        .store
        .get_by_id(entity, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", path_segment, id)))?;
    strip_sensitive(entity, &mut row);
    Ok(response::ok(row))
}

pub async fn update(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment, "update")?;
    let id = parse_id(&id_str)?;
    let body = body_to_map(body)?;
    let (columns, data) = RequestValidator::validate_partial(entity, &body)?;
    let written = state.store.update(entity, id, &columns, &data).await?;
    Ok(response::ok(strip_sensitive_written(entity, written)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment, "delete")?;
    let id = parse_id(&id_str)?;
    let deleted = state.store.delete(entity, id).await?;
    Ok(response::ok(DeleteOutcome { success: true, deleted }))
}
