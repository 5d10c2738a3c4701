//! Structured logging.
//!
//! # Responsibilities
//! - Install the process-wide `tracing` subscriber once
//! - Pick the log level from `RUST_LOG`, falling back to configuration
//! - Emit JSON in production and human-readable output in development
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - The OpenTelemetry layer, when present, sits on the same registry

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::observability::telemetry::{OtelLayer, TelemetryError};

/// Filter directives used when `RUST_LOG` is not set.
pub fn default_directives(level: &str) -> String {
    format!("{crate}={level},tower_http={level}", crate = env!("CARGO_CRATE_NAME"))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(default_directives(&config.level))?),
    }
}

/// Install the global subscriber.
pub fn init(config: &LoggingConfig, otel: Option<OtelLayer>) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;

    let (json, pretty) = match config.format {
        LogFormat::Json => (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            ),
            None,
        ),
        LogFormat::Pretty => (None, Some(tracing_subscriber::fmt::layer().pretty())),
    };

    tracing_subscriber::registry()
        .with(otel)
        .with(filter)
        .with(json)
        .with(pretty)
        .try_init()?;

    Ok(())
}
