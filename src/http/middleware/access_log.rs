//! Structured request logging stage.
//!
//! # Responsibilities
//! - Record the start instant of every request
//! - Count response body bytes without altering them
//! - Emit exactly one `Request completed` record per request
//!
//! The completion record is emitted when the response body finishes or is
//! dropped, so it reflects what was actually written, including responses
//! produced by panic containment further in. A request dropped before any
//! response exists is recorded with status 499.

use axum::body::{Body, Bytes};
use axum::extract::ConnectInfo;
use axum::http::{Method, Request};
use axum::middleware::Next;
use axum::response::Response;
use http_body::{Body as HttpBody, Frame, SizeHint};
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tracing::Span;

use crate::observability::context::CorrelationContext;

/// Status logged for a request whose response was never produced because
/// the caller went away (client disconnect, connection force-closed).
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

pub async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let ctx = request
        .extensions()
        .get::<CorrelationContext>()
        .cloned()
        .unwrap_or_else(CorrelationContext::generate);
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    // Emits on drop, so a cancelled request is still recorded once.
    let mut completion = Completion {
        span: ctx.span().clone(),
        method: request.method().clone(),
        path: request.uri().path().to_string(),
        remote_addr,
        status: CLIENT_CLOSED_REQUEST,
        started: Instant::now(),
        bytes: 0,
    };

    let response = next.run(request).await;
    completion.status = response.status().as_u16();

    let (parts, body) = response.into_parts();
    Response::from_parts(
        parts,
        Body::new(CountingBody {
            inner: body,
            completion: Some(completion),
        }),
    )
}

/// The pending completion record of one request. Logged exactly once, when
/// dropped.
struct Completion {
    span: Span,
    method: Method,
    path: String,
    remote_addr: String,
    status: u16,
    started: Instant,
    bytes: u64,
}

impl Drop for Completion {
    fn drop(&mut self) {
        tracing::info!(
            parent: &self.span,
            method = %self.method,
            path = %self.path,
            remote_addr = %self.remote_addr,
            status = self.status,
            duration_ms = self.started.elapsed().as_secs_f64() * 1000.0,
            bytes = self.bytes,
            "Request completed"
        );
    }
}

/// Response body wrapper that counts bytes and emits the completion record
/// once, at end of stream or on drop.
struct CountingBody {
    inner: Body,
    completion: Option<Completion>,
}

impl CountingBody {
    fn finish(&mut self) {
        drop(self.completion.take());
    }
}

impl HttpBody for CountingBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);

        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let (Some(data), Some(completion)) = (frame.data_ref(), this.completion.as_mut()) {
                    completion.bytes += data.len() as u64;
                }
                if this.inner.is_end_stream() {
                    this.finish();
                }
            }
            Poll::Ready(None) | Poll::Ready(Some(Err(_))) => this.finish(),
            Poll::Pending => {}
        }

        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for CountingBody {
    fn drop(&mut self) {
        self.finish();
    }
}
