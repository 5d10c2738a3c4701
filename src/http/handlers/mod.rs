pub mod health;
pub mod users;

use axum::http::StatusCode;

use crate::http::error::ApiError;

/// Fallback for paths with no route.
pub async fn not_found() -> ApiError {
    ApiError::not_found("not found")
}

/// Fallback for known paths hit with an unsupported method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
}
