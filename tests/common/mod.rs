//! Shared fixtures: an in-memory `EntityStore` and router helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use videogames_api::sql::{check_write, Filter};
use videogames_api::{app, default_catalog, resolve, AppError, AppState, EntityStore, ResolvedEntity, Settings, Written};

/// Tables keyed by name, rows keyed by id. Counts every store call.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<String, BTreeMap<i64, Map<String, Value>>>>>,
    next_id: Arc<Mutex<HashMap<String, i64>>>,
    calls: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.lock().unwrap().get(table).map_or(0, |t| t.len())
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn with_id(id: i64, row: &Map<String, Value>) -> Value {
    let mut out = Map::new();
    out.insert("id".into(), Value::from(id));
    out.extend(row.clone());
    Value::Object(out)
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn create(&self, entity: &ResolvedEntity, columns: &[String], data: &[Value]) -> Result<Written, AppError> {
        self.touch();
        check_write(entity, columns, data)?;
        let id = {
            let mut ids = self.next_id.lock().unwrap();
            let next = ids.entry(entity.table_name.clone()).or_insert(0);
            *next += 1;
            *next
        };
        let mut row: Map<String, Value> = entity.columns.iter().map(|c| (c.name.clone(), Value::Null)).collect();
        for (c, v) in columns.iter().zip(data) {
            row.insert(c.clone(), v.clone());
        }
        self.tables
            .lock()
            .unwrap()
            .entry(entity.table_name.clone())
            .or_default()
            .insert(id, row);
        Ok(Written::new(id, columns, data))
    }

    async fn list_all(
        &self,
        entity: &ResolvedEntity,
        filter: Option<&Filter>,
        limit: Option<u32>,
    ) -> Result<Vec<Value>, AppError> {
        self.touch();
        let tables = self.tables.lock().unwrap();
        let Some(table) = tables.get(&entity.table_name) else {
            return Ok(Vec::new());
        };
        let rows = table
            .iter()
            .filter(|(_, row)| match filter {
                None => true,
                Some(f) => row
                    .get(&f.column)
                    .is_some_and(|v| !v.is_null() && cell_text(v).contains(&f.substring)),
            })
            .map(|(id, row)| with_id(*id, row));
        Ok(match limit {
            Some(n) => rows.take(n as usize).collect(),
            None => rows.collect(),
        })
    }

    async fn get_by_id(&self, entity: &ResolvedEntity, id: i64) -> Result<Option<Value>, AppError> {
        self.touch();
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .get(&entity.table_name)
            .and_then(|t| t.get(&id))
            .map(|row| with_id(id, row)))
    }

    async fn update(
        &self,
        entity: &ResolvedEntity,
        id: i64,
        columns: &[String],
        data: &[Value],
    ) -> Result<Written, AppError> {
        self.touch();
        check_write(entity, columns, data)?;
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .get_mut(&entity.table_name)
            .and_then(|t| t.get_mut(&id))
            .ok_or_else(|| AppError::NotFound(format!("{} {}", entity.path_segment, id)))?;
        for (c, v) in columns.iter().zip(data) {
            row.insert(c.clone(), v.clone());
        }
        Ok(Written::new(id, columns, data))
    }

    async fn delete(&self, entity: &ResolvedEntity, id: i64) -> Result<bool, AppError> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        Ok(tables
            .get_mut(&entity.table_name)
            .is_some_and(|t| t.remove(&id).is_some()))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Store whose every call fails, for readiness and error mapping checks.
pub struct DownStore;

#[async_trait]
impl EntityStore for DownStore {
    async fn create(&self, _: &ResolvedEntity, _: &[String], _: &[Value]) -> Result<Written, AppError> {
        Err(AppError::Storage(sqlx::Error::PoolTimedOut))
    }
    async fn list_all(&self, _: &ResolvedEntity, _: Option<&Filter>, _: Option<u32>) -> Result<Vec<Value>, AppError> {
        Err(AppError::Timeout(std::time::Duration::from_millis(5)))
    }
    async fn get_by_id(&self, _: &ResolvedEntity, _: i64) -> Result<Option<Value>, AppError> {
        Err(AppError::Storage(sqlx::Error::PoolTimedOut))
    }
    async fn update(&self, _: &ResolvedEntity, _: i64, _: &[String], _: &[Value]) -> Result<Written, AppError> {
        Err(AppError::Storage(sqlx::Error::PoolTimedOut))
    }
    async fn delete(&self, _: &ResolvedEntity, _: i64) -> Result<bool, AppError> {
        Err(AppError::Storage(sqlx::Error::PoolTimedOut))
    }
    async fn ping(&self) -> Result<(), AppError> {
        Err(AppError::Storage(sqlx::Error::PoolTimedOut))
    }
}

pub fn settings() -> Settings {
    Settings::from_lookup(|_| None).unwrap()
}

pub fn router_with<S: EntityStore + 'static>(store: S) -> Router {
    let model = resolve(&default_catalog().unwrap()).unwrap();
    app(AppState::new(store, model), &settings())
}

pub fn router() -> (Router, MemoryStore) {
    let store = MemoryStore::default();
    (router_with(store.clone()), store)
}

/// Send one request; returns status and the body parsed as JSON (or a JSON string for non-JSON bodies).
pub async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let res = router.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

pub async fn send_raw(router: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}
