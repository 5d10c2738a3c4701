//! Per-request correlation context.
//!
//! # Responsibilities
//! - Reuse or generate the request's correlation id
//! - Link the request span to an inbound W3C trace, when telemetry is on
//! - Capture trace/span identifiers for log correlation
//! - Expose the request span as the structured logger for the request
//!
//! The context is built once by the correlation middleware, stored in the
//! request extensions and only ever cloned afterwards.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName};
use opentelemetry::propagation::Extractor;
use opentelemetry::trace::TraceContextExt;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::field::Empty;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use uuid::Uuid;

/// Header carrying the correlation id in both directions.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Immutable correlation bundle for one request.
#[derive(Debug, Clone)]
pub struct CorrelationContext {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    correlation_id: String,
    trace_id: Option<String>,
    span_id: Option<String>,
    span: Span,
}

impl CorrelationContext {
    /// Build the context for an inbound request.
    ///
    /// A usable `X-Request-ID` header is reused verbatim; otherwise a new
    /// UUID v4 is generated. With `capture_trace` set, the request span is
    /// parented to any inbound `traceparent` and its OpenTelemetry ids are
    /// recorded.
    pub fn derive(headers: &HeaderMap, capture_trace: bool) -> Self {
        let correlation_id = incoming_request_id(headers).unwrap_or_else(generate_id);
        let span = request_span(&correlation_id);

        let (trace_id, span_id) = if capture_trace {
            link_remote_parent(&span, headers);
            capture_trace_ids(&span)
        } else {
            (None, None)
        };

        if let Some(trace_id) = &trace_id {
            span.record("trace_id", trace_id.as_str());
        }
        if let Some(span_id) = &span_id {
            span.record("span_id", span_id.as_str());
        }

        Self::from_parts(correlation_id, trace_id, span_id, span)
    }

    /// Context for work that did not arrive over HTTP (background jobs, tests).
    pub fn detached(correlation_id: impl Into<String>) -> Self {
        let correlation_id = correlation_id.into();
        let span = request_span(&correlation_id);
        Self::from_parts(correlation_id, None, None, span)
    }

    /// Detached context with a freshly generated id.
    pub fn generate() -> Self {
        Self::detached(generate_id())
    }

    fn from_parts(
        correlation_id: String,
        trace_id: Option<String>,
        span_id: Option<String>,
        span: Span,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                correlation_id,
                trace_id,
                span_id,
                span,
            }),
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.inner.correlation_id
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.inner.trace_id.as_deref()
    }

    pub fn span_id(&self) -> Option<&str> {
        self.inner.span_id.as_deref()
    }

    /// The request span. Events emitted with it as parent carry the
    /// correlation fields.
    pub fn span(&self) -> &Span {
        &self.inner.span
    }
}

impl<S> FromRequestParts<S> for CorrelationContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CorrelationContext>()
            .cloned()
            .unwrap_or_else(|| CorrelationContext::derive(&parts.headers, false)))
    }
}

fn request_span(correlation_id: &str) -> Span {
    tracing::info_span!(
        "request",
        correlation_id = %correlation_id,
        trace_id = Empty,
        span_id = Empty,
    )
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

fn incoming_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map(str::to_owned)
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

fn link_remote_parent(span: &Span, headers: &HeaderMap) {
    let parent = opentelemetry::global::get_text_map_propagator(|propagator| {
        propagator.extract(&HeaderExtractor(headers))
    });
    if parent.span().span_context().is_valid() {
        let _ = span.set_parent(parent);
    }
}

fn capture_trace_ids(span: &Span) -> (Option<String>, Option<String>) {
    let cx = span.context();
    let otel_span = cx.span();
    let span_context = otel_span.span_context();
    if span_context.is_valid() {
        (
            Some(span_context.trace_id().to_string()),
            Some(span_context.span_id().to_string()),
        )
    } else {
        (None, None)
    }
}
