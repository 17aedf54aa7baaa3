//! Router assembly.

mod common;
mod entity;

pub use common::common_routes;
pub use entity::entity_routes;

use crate::config::Settings;
use crate::handlers::{api_root, not_found, openapi_json, welcome};
use crate::openapi::OPENAPI_PATH;
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Welcome text at `/`, `/api` redirecting to it, and the API document.
pub fn docs_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/api", get(api_root))
        .route(OPENAPI_PATH, get(openapi_json))
        .with_state(state)
}

/// Full application router: ambient routes, `/api/{resource}` CRUD, JSON 404 fallback.
pub fn app(state: AppState, settings: &Settings) -> Router {
    Router::new()
        .merge(docs_routes(state.clone()))
        .merge(common_routes(state.clone()))
        .nest("/api", entity_routes(state))
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(settings.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
}
