//! Request lifecycle pipeline.
//!
//! # Data Flow
//! ```text
//! request
//!     → cors.rs         (origin policy; OPTIONS answered here with 204)
//!     → correlation.rs  (CorrelationContext, X-Request-ID, request span)
//!     → access_log.rs   (start time, byte count, one completion record)
//!     → recovery.rs     (panic → JSON 500)
//!     → deadline.rs     (per-request timeout → JSON 503, added by the route table)
//!     → route dispatch
//! ```
//!
//! The order is fixed for every request. Each stage wraps the next one.

pub mod access_log;
pub mod correlation;
pub mod cors;
pub mod deadline;
pub mod recovery;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tower::ServiceBuilder;

pub use correlation::CorrelationSettings;

/// Wrap `router` in the request pipeline.
pub fn apply(router: Router, settings: CorrelationSettings) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(from_fn(cors::origin_policy))
            .layer(from_fn_with_state(settings, correlation::inject_correlation))
            .layer(from_fn(access_log::log_requests))
            .layer(recovery::layer()),
    )
}
