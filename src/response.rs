//! Response helpers for entity routes.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeleteOutcome {
    pub success: bool,
    /// False when no row had the id; delete is still reported as a success.
    pub deleted: bool,
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(data))
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

/// Same envelope `AppError` renders: `{"error": {"code", "message"}}`.
pub fn error_body(code: &str, message: String) -> Value {
    serde_json::json!({
        "error": {
            "code": code,
            "message": message
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn delete_outcome_reports_both_flags() {
        let body = serde_json::to_value(DeleteOutcome { success: true, deleted: false }).unwrap();
        assert_eq!(body, json!({"success": true, "deleted": false}));
    }

    #[test]
    fn error_body_has_envelope() {
        let body = error_body("not_found", "no such route".into());
        assert_eq!(body, json!({"error": {"code": "not_found", "message": "no such route"}}));
    }
}
