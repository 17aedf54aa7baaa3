//! Convert serde_json::Value into typed values that sqlx can bind.

use crate::config::{ColumnInfo, ColumnKind};
use crate::error::AppError;
use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

/// A value bound to a PostgreSQL query. Never rendered into SQL text.
/// Each column kind maps to exactly one wire type, NULL included, so a cached statement
/// always sees the parameter types it was prepared with.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Null(ColumnKind),
    Bool(bool),
    I64(i64),
    /// Decimal text, cast to `numeric` in SQL so no binary float rounding happens on the way in.
    Numeric(String),
    String(String),
}

impl PgBindValue {
    /// Convert a JSON value destined for `col`, rejecting values of the wrong shape.
    pub fn for_column(col: &ColumnInfo, v: &Value) -> Result<Self, AppError> {
        let mismatch = || {
            AppError::InvalidArgument(format!(
                "{} must be of type {}",
                col.name,
                col.kind.as_str()
            ))
        };
        Ok(match (col.kind, v) {
            (kind, Value::Null) => PgBindValue::Null(kind),
            (ColumnKind::Text, Value::String(s)) => PgBindValue::String(s.clone()),
            (ColumnKind::Integer, Value::Number(n)) => PgBindValue::I64(n.as_i64().ok_or_else(mismatch)?),
            (ColumnKind::Numeric, Value::Number(n)) => PgBindValue::Numeric(n.to_string()),
            (ColumnKind::Boolean, Value::Bool(b)) => PgBindValue::Bool(*b),
            _ => return Err(mismatch()),
        })
    }

    pub fn bind<'q>(self, query: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments> {
        match self {
            PgBindValue::Null(ColumnKind::Integer) => query.bind(None::<i64>),
            PgBindValue::Null(ColumnKind::Boolean) => query.bind(None::<bool>),
            PgBindValue::Null(ColumnKind::Text | ColumnKind::Numeric) => query.bind(None::<String>),
            PgBindValue::Bool(b) => query.bind(b),
            PgBindValue::I64(n) => query.bind(n),
            PgBindValue::Numeric(s) | PgBindValue::String(s) => query.bind(s),
        }
    }
}

/// SQL cast applied to every placeholder of a column so int8 and decimal-text values land in the column type.
pub fn cast_for(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Text => "text",
        ColumnKind::Integer => "bigint",
        ColumnKind::Numeric => "numeric",
        ColumnKind::Boolean => "boolean",
    }
}
