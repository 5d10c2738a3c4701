//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! main
//!     → telemetry.rs (OTLP exporter + tracer provider, when enabled)
//!     → logging.rs   (one registry: filter, fmt layer, OpenTelemetry layer)
//!
//! Per request:
//!     → context.rs   (correlation id, trace ids, request span)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through all subsystems
//! - Tracing is optional to reduce overhead when not needed

pub mod context;
pub mod logging;
pub mod telemetry;

pub use context::{CorrelationContext, X_REQUEST_ID};
pub use telemetry::{TelemetryError, TelemetryGuard};

use crate::config::AppConfig;

/// Install logging and, when enabled, span export. Call once per process.
pub fn init(config: &AppConfig) -> Result<Option<TelemetryGuard>, TelemetryError> {
    let (layer, guard) = match telemetry::init_tracer(&config.telemetry, &config.service)? {
        Some((layer, guard)) => (Some(layer), Some(guard)),
        None => (None, None),
    };

    logging::init(&config.logging, layer)?;
    Ok(guard)
}
