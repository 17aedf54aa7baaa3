//! Generic CRUD execution against PostgreSQL.

use crate::config::ResolvedEntity;
use crate::error::AppError;
use crate::sql::{delete, insert, select_by_id, select_list, update, Filter, QueryBuf};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;

/// Row written by create/update: the key plus the written values, flattened into one object.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Written {
    pub id: i64,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Written {
    pub fn new(id: i64, columns: &[String], data: &[Value]) -> Self {
        Written {
            id,
            data: columns.iter().cloned().zip(data.iter().cloned()).collect(),
        }
    }
}

/// The entity-CRUD contract. Every operation is one round trip; errors are surfaced, never retried.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Insert `data` into `columns` (matched positionally). Returns the generated id and the stored values.
    async fn create(&self, entity: &ResolvedEntity, columns: &[String], data: &[Value]) -> Result<Written, AppError>;

    /// All rows, optionally restricted by a substring filter and capped by `limit`.
    async fn list_all(
        &self,
        entity: &ResolvedEntity,
        filter: Option<&Filter>,
        limit: Option<u32>,
    ) -> Result<Vec<Value>, AppError>;

    /// `Ok(None)` when no row has the id.
    async fn get_by_id(&self, entity: &ResolvedEntity, id: i64) -> Result<Option<Value>, AppError>;

    /// Set exactly `columns` on the row and return their stored values; `NotFound` when no row has the id.
    async fn update(
        &self,
        entity: &ResolvedEntity,
        id: i64,
        columns: &[String],
        data: &[Value],
    ) -> Result<Written, AppError>;

    /// Idempotent. Returns whether a row was removed.
    async fn delete(&self, entity: &ResolvedEntity, id: i64) -> Result<bool, AppError>;

    /// Cheap round trip used by readiness checks.
    async fn ping(&self) -> Result<(), AppError>;
}

/// PostgreSQL store over the shared connection.
#[derive(Clone)]
pub struct CrudService {
    pool: PgPool,
    timeout: Duration,
}

impl CrudService {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        CrudService { pool, timeout }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn timed<T, F>(&self, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res,
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "store call timed out");
                Err(AppError::Timeout(self.timeout))
            }
        }
    }

    async fn query_many(&self, q: QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in q.params {
            query = p.bind(query);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn query_optional(&self, q: QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in q.params {
            query = p.bind(query);
        }
        let row = query.fetch_optional(&self.pool).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    /// Run an INSERT/UPDATE ending in `RETURNING <pk>, <written columns>`; `None` when it touched no row.
    async fn returning_written(&self, entity: &ResolvedEntity, q: QueryBuf) -> Result<Option<Written>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in q.params {
            query = p.bind(query);
        }
        let row = query.fetch_optional(&self.pool).await?;
        row.map(|r| written_from_row(entity, &r)).transpose()
    }

    /// Run a statement ending in `RETURNING <pk>`; `None` when it touched no row.
    async fn returning_key(&self, q: QueryBuf) -> Result<Option<i64>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in q.params {
            query = p.bind(query);
        }
        let row = query.fetch_optional(&self.pool).await?;
        row.map(|r| key_of(&r)).transpose()
    }
}

#[async_trait]
impl EntityStore for CrudService {
    async fn create(&self, entity: &ResolvedEntity, columns: &[String], data: &[Value]) -> Result<Written, AppError> {
        let q = insert(entity, columns, data)?;
        let written = self
            .timed(self.returning_written(entity, q))
            .await?
            .ok_or(AppError::Storage(sqlx::Error::RowNotFound))?;
        tracing::info!(table = %entity.table_name, id = written.id, "row created");
        Ok(written)
    }

    async fn list_all(
        &self,
        entity: &ResolvedEntity,
        filter: Option<&Filter>,
        limit: Option<u32>,
    ) -> Result<Vec<Value>, AppError> {
        let q = select_list(entity, filter, limit)?;
        self.timed(self.query_many(q)).await
    }

    async fn get_by_id(&self, entity: &ResolvedEntity, id: i64) -> Result<Option<Value>, AppError> {
        let q = select_by_id(entity, id);
        self.timed(self.query_optional(q)).await
    }

    async fn update(
        &self,
        entity: &ResolvedEntity,
        id: i64,
        columns: &[String],
        data: &[Value],
    ) -> Result<Written, AppError> {
        let q = update(entity, id, columns, data)?;
        match self.timed(self.returning_written(entity, q)).await? {
            Some(written) => {
                tracing::info!(table = %entity.table_name, id, "row updated");
                Ok(written)
            }
            None => Err(AppError::NotFound(format!("{} {}", entity.path_segment, id))),
        }
    }

    async fn delete(&self, entity: &ResolvedEntity, id: i64) -> Result<bool, AppError> {
        let q = delete(entity, id);
        let removed = self.timed(self.returning_key(q)).await?.is_some();
        tracing::info!(table = %entity.table_name, id, removed, "row delete");
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.timed(async {
            sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
            Ok::<(), AppError>(())
        })
        .await
    }
}

fn key_of(row: &sqlx::postgres::PgRow) -> Result<i64, AppError> {
    use sqlx::Row;
    if let Ok(n) = row.try_get::<i32, _>(0) {
        return Ok(n as i64);
    }
    Ok(row.try_get::<i64, _>(0)?)
}

/// Key plus the values the database actually stored (rounded to the column's scale, for one).
fn written_from_row(entity: &ResolvedEntity, row: &sqlx::postgres::PgRow) -> Result<Written, AppError> {
    let id = key_of(row)?;
    let mut data = match row_to_json(row) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    data.remove(&entity.pk_column);
    Ok(Written { id, data })
}

fn row_to_json(row: &sqlx::postgres::PgRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = Map::new();
    for col in row.columns() {
        let name = col.name();
        let v = cell_to_value(row, name);
        map.insert(name.to_string(), v);
    }
    Value::Object(map)
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn written_zips_columns_and_values() {
        let w = Written::new(4, &["name".to_string()], &[json!("rpg")]);
        assert_eq!(serde_json::to_value(&w).unwrap(), json!({"id": 4, "name": "rpg"}));
    }

    #[tokio::test]
    async fn unreachable_store_surfaces_error_without_retry() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .unwrap();
        let store = CrudService::new(pool, Duration::from_secs(5));
        let err = store.ping().await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_) | AppError::Timeout(_)));
    }

    #[tokio::test]
    async fn slow_call_becomes_timeout() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .unwrap();
        let store = CrudService::new(pool, Duration::from_millis(20));
        let err = store
            .timed(async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, AppError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Timeout(d) if d == Duration::from_millis(20)));
    }
}
