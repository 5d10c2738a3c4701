//! Shared utilities for integration tests.

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use users_api::config::{ServerConfig, ServiceConfig};
use users_api::http::{build_router, AppState, CorrelationSettings, HttpServer, ServerError};
use users_api::lifecycle::{LifecycleState, Shutdown, ShutdownHook, ShutdownReport};
use users_api::users::{InMemoryUserStore, UserService};

/// Server settings for tests: ephemeral port, short deadlines.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        bind_address: "127.0.0.1:0".into(),
        read_timeout_secs: 5,
        write_timeout_secs: 5,
        idle_timeout_secs: 60,
        shutdown_timeout_secs: 5,
        max_connections: 64,
    }
}

/// The full application over `store`.
#[allow(dead_code)]
pub fn app(store: Arc<InMemoryUserStore>) -> Router {
    let state = AppState::new(UserService::new(store), ServiceConfig::default());
    build_router(state, CorrelationSettings::default(), Duration::from_secs(5))
}

/// A running server and the handle to stop it.
pub struct TestServer {
    pub addr: SocketAddr,
    pub lifecycle: watch::Receiver<LifecycleState>,
    stop: Shutdown,
    handle: JoinHandle<Result<ShutdownReport, ServerError>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Ask the server to shut down without waiting for it.
    pub fn trigger(&self) {
        self.stop.trigger();
    }

    /// Shut down and wait for the report.
    pub async fn stop(self) -> Result<ShutdownReport, ServerError> {
        self.stop.trigger();
        self.handle.await.unwrap()
    }
}

pub async fn spawn_server(config: ServerConfig, router: Router) -> TestServer {
    spawn_server_with_hooks(config, router, Vec::new()).await
}

pub async fn spawn_server_with_hooks(
    config: ServerConfig,
    router: Router,
    hooks: Vec<ShutdownHook>,
) -> TestServer {
    let mut server = HttpServer::new(config, router);
    for hook in hooks {
        server = server.on_shutdown(hook);
    }
    let mut lifecycle = server.lifecycle();

    let bound = server.bind().await.unwrap();
    let addr = bound.local_addr();

    let stop = Shutdown::new();
    let signal = {
        let stop = stop.clone();
        async move { stop.triggered().await }
    };
    let handle = tokio::spawn(bound.serve(signal));

    lifecycle
        .wait_for(|state| *state == LifecycleState::Running)
        .await
        .unwrap();

    TestServer {
        addr,
        lifecycle,
        stop,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap()
}
