//! Per-request deadline.
//!
//! Bounds the time spent producing a response. A handler that runs past the
//! deadline is dropped and the caller gets a JSON 503.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::time::Duration;

use crate::http::error::ApiError;

pub const TIMEOUT_MESSAGE: &str = "request timed out";

pub async fn enforce_deadline(
    State(deadline): State<Duration>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match tokio::time::timeout(deadline, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(
                timeout_ms = deadline.as_millis() as u64,
                "Request deadline exceeded"
            );
            ApiError::new(StatusCode::SERVICE_UNAVAILABLE, TIMEOUT_MESSAGE).into_response()
        }
    }
}
