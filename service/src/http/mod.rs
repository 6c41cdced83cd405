//! HTTP utilities and middleware shared by the API routes.

pub mod security;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

pub use security::{build_security_headers, security_headers_middleware};

/// JSON error body returned by every non-2xx API response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Build an error response with the given status and message.
pub fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

pub fn bad_request(message: &str) -> axum::response::Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

pub fn internal_error() -> axum::response::Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
