//! Correlation-identifier injection stage.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;

use crate::observability::context::{CorrelationContext, X_REQUEST_ID};

/// Settings shared by every request passing through the stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationSettings {
    /// Link to inbound W3C traces and capture trace/span ids.
    pub capture_trace: bool,
}

/// Derive the request's [`CorrelationContext`], run the rest of the chain
/// inside its span and echo the id back in `X-Request-ID`.
pub async fn inject_correlation(
    State(settings): State<CorrelationSettings>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let ctx = CorrelationContext::derive(request.headers(), settings.capture_trace);
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).instrument(ctx.span().clone()).await;

    if let Ok(value) = HeaderValue::from_str(ctx.correlation_id()) {
        response.headers_mut().insert(&X_REQUEST_ID, value);
    }
    response
}
