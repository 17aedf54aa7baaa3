//! Video games platform API: catalog-driven REST CRUD over PostgreSQL.

pub mod config;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{default_catalog, load_catalog_from_path, resolve, CatalogConfig, ResolvedEntity, ResolvedModel, Settings};
pub use error::{AppError, ConfigError};
pub use openapi::build_openapi;
pub use response::error_body;
pub use routes::{app, common_routes, docs_routes, entity_routes};
pub use service::{CrudService, EntityStore, RequestValidator, Written};
pub use state::AppState;
