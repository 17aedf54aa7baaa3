//! Root, redirect, API document and fallback handlers.

use crate::openapi::build_openapi;
use crate::response::error_body;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Redirect},
    Json,
};

pub const WELCOME: &str = "Welcome to the video games platform API. Resources live under /api/{resource}.";

pub async fn welcome() -> &'static str {
    WELCOME
}

pub async fn api_root() -> Redirect {
    Redirect::to("/")
}

pub async fn openapi_json(State(state): State<AppState>) -> impl IntoResponse {
    Json(build_openapi(&state.model))
}

pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(error_body("not_found", format!("no route for {}", uri.path()))),
    )
}
