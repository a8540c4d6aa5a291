//! Structured error responses.
//!
//! # Responsibilities
//! - Render rejections produced by the gateway itself as JSON
//!
//! # Design Decisions
//! - Bodies are `{"error": "..."}` so clients can tell "no such route" from "credentials rejected"
//! - Handlers own their responses; only the pipeline uses these

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}

/// 404 for requests no route matched.
pub fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "not found")
}

/// 401 for requests the authorization engine denied.
pub fn unauthorized() -> Response {
    error_response(StatusCode::UNAUTHORIZED, "unauthorized")
}
