//! OpenTelemetry span export.
//!
//! # Responsibilities
//! - Build the OTLP gRPC span exporter and the batch tracer provider
//! - Install the W3C trace-context propagator
//! - Hand back the `tracing` layer and a guard that flushes on shutdown

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{SdkTracerProvider, Tracer};
use opentelemetry_sdk::Resource;
use thiserror::Error;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::Registry;

use crate::config::{ServiceConfig, TelemetryConfig};

/// Layer bridging `tracing` spans into OpenTelemetry.
pub type OtelLayer = OpenTelemetryLayer<Registry, Tracer>;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to build OTLP exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),

    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),

    #[error("Invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
}

/// Owns the tracer provider for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct TelemetryGuard {
    provider: SdkTracerProvider,
}

impl TelemetryGuard {
    /// Flush pending spans and close the exporter.
    pub async fn shutdown(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let provider = self.provider;
        tokio::task::spawn_blocking(move || provider.shutdown()).await??;
        Ok(())
    }
}

/// Build the OpenTelemetry pipeline. Returns `None` when telemetry is disabled.
pub fn init_tracer(
    config: &TelemetryConfig,
    service: &ServiceConfig,
) -> Result<Option<(OtelLayer, TelemetryGuard)>, TelemetryError> {
    if !config.enabled {
        return Ok(None);
    }

    global::set_text_map_propagator(TraceContextPropagator::new());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .with_timeout(config.export_timeout())
        .build()?;

    let resource = Resource::builder()
        .with_service_name(service.name.clone())
        .with_attribute(KeyValue::new("service.version", service.version.clone()))
        .build();

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();

    global::set_tracer_provider(provider.clone());

    let tracer = provider.tracer(service.name.clone());
    let layer = OpenTelemetryLayer::new(tracer);

    Ok(Some((layer, TelemetryGuard { provider })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_telemetry_builds_nothing() {
        let config = TelemetryConfig::default();
        assert!(!config.enabled);

        let built = init_tracer(&config, &ServiceConfig::default()).unwrap();
        assert!(built.is_none());
    }
}
