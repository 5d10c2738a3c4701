//! Users REST API (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net::listener ──▶ http::server ──▶ http::middleware
//!                                                              │
//!                                                              ▼
//!                      users::store ◀── users::service ◀── http::handlers
//!                    (postgres | memory)
//!
//!     Cross-cutting: config, observability (logging, OTLP), lifecycle
//!                    (signals, drain, shutdown hooks)
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use users_api::config::{self, AppConfig};
use users_api::http::{build_router, AppState, CorrelationSettings, HttpServer};
use users_api::lifecycle::{shutdown_signal, ShutdownHook};
use users_api::observability::{self, TelemetryGuard};
use users_api::users::{postgres, InMemoryUserStore, PgUserStore, UserService, UserStore};

#[derive(Debug, Parser)]
#[command(name = "users-api", version, about = "Read-only users REST API")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?;
    let telemetry = observability::init(&config)?;

    tracing::info!(
        service = %config.service.name,
        version = %config.service.version,
        bind_address = %config.server.bind_address,
        telemetry = config.telemetry.enabled,
        "Configuration loaded"
    );

    let (store, database_hook) = open_store(&config)?;
    let state = AppState::new(UserService::new(store), config.service.clone());
    let router = build_router(
        state,
        CorrelationSettings {
            capture_trace: config.telemetry.enabled,
        },
        config.server.write_timeout(),
    );

    let mut server = HttpServer::new(config.server.clone(), router);
    if let Some(hook) = database_hook {
        server = server.on_shutdown(hook);
    }
    if let Some(guard) = telemetry {
        server = server.on_shutdown(telemetry_hook(&config, guard));
    }

    let bound = server.bind().await?;
    let report = bound.serve(shutdown_signal()).await?;

    tracing::info!(
        drain = ?report.drain,
        hooks = report.hooks.len(),
        "Shutdown complete"
    );
    Ok(())
}

/// Postgres when a database URL is configured, the in-memory store otherwise.
fn open_store(
    config: &AppConfig,
) -> Result<(Arc<dyn UserStore>, Option<ShutdownHook>), Box<dyn std::error::Error>> {
    let Some(url) = config.database.url.as_deref() else {
        tracing::warn!("No database URL configured, serving from the in-memory store");
        return Ok((Arc::new(InMemoryUserStore::new()), None));
    };

    let pool = postgres::connect_lazy(&config.database, url)?;
    let closing = pool.clone();
    let hook = ShutdownHook::new(
        "database",
        config.database.acquire_timeout(),
        move || async move {
            closing.close().await;
            Ok(())
        },
    );

    tracing::info!(
        max_connections = config.database.max_connections,
        "Database pool configured"
    );
    Ok((Arc::new(PgUserStore::new(pool)), Some(hook)))
}

fn telemetry_hook(config: &AppConfig, guard: TelemetryGuard) -> ShutdownHook {
    ShutdownHook::new("telemetry", config.telemetry.flush_timeout(), move || {
        guard.shutdown()
    })
}
