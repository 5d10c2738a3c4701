//! HTTP server and connection lifecycle.
//!
//! # Responsibilities
//! - Bind the bounded listener and publish lifecycle state
//! - Serve each connection over HTTP/1.1 or HTTP/2 on its own task
//! - Enforce read, idle and per-request deadlines
//! - Stop accepting on shutdown, drain connections within the shutdown
//!   timeout, then force-close whatever is left
//! - Run shutdown hooks and report how the shutdown went

use axum::extract::ConnectInfo;
use axum::Router;
use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinSet;
use tower::ServiceExt;

use crate::config::ServerConfig;
use crate::lifecycle::hooks::{self, ShutdownHook};
use crate::lifecycle::{DrainOutcome, LifecycleState, Shutdown, ShutdownListener, ShutdownReport};
use crate::net::connection::{ConnectionActivity, ConnectionGuard, ConnectionTracker};
use crate::net::listener::{ConnectionPermit, Listener, ListenerError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Server failed to start: {0}")]
    Bind(#[source] ListenerError),

    #[error("Accept loop failed: {0}")]
    Accept(#[source] ListenerError),
}

/// HTTP server in the `Created` state.
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
    hooks: Vec<ShutdownHook>,
    state: watch::Sender<LifecycleState>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, router: Router) -> Self {
        let (state, _) = watch::channel(LifecycleState::Created);
        Self {
            config,
            router,
            hooks: Vec::new(),
            state,
        }
    }

    /// Register a hook to run after the drain phase. Hooks run in
    /// registration order.
    pub fn on_shutdown(mut self, hook: ShutdownHook) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Subscribe to lifecycle state changes.
    pub fn lifecycle(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Bind the listener. A bind failure is fatal and leaves the server `Failed`.
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        transition(&self.state, LifecycleState::Starting);

        let bound = Listener::bind(&self.config).await.and_then(|listener| {
            let local_addr = listener.local_addr().map_err(|source| ListenerError::Bind {
                address: self.config.bind_address.clone(),
                source,
            })?;
            Ok((listener, local_addr))
        });

        match bound {
            Ok((listener, local_addr)) => Ok(BoundServer {
                listener,
                local_addr,
                config: self.config,
                router: self.router,
                hooks: self.hooks,
                state: self.state,
            }),
            Err(e) => {
                tracing::error!(error = %e, "Failed to bind listener");
                transition(&self.state, LifecycleState::Failed);
                Err(ServerError::Bind(e))
            }
        }
    }
}

/// HTTP server with a bound listener, ready to serve.
pub struct BoundServer {
    listener: Listener,
    local_addr: SocketAddr,
    config: ServerConfig,
    router: Router,
    hooks: Vec<ShutdownHook>,
    state: watch::Sender<LifecycleState>,
}

impl BoundServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn lifecycle(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Serve until `signal` resolves or the accept loop fails, then drain
    /// and run the shutdown hooks.
    pub async fn serve<F>(self, signal: F) -> Result<ShutdownReport, ServerError>
    where
        F: Future + Send,
    {
        let Self {
            listener,
            local_addr,
            config,
            router,
            hooks,
            state,
        } = self;

        let shutdown = Shutdown::new();
        let tracker = ConnectionTracker::new();
        let (fatal_tx, mut fatal_rx) = oneshot::channel();

        let connections = Arc::new(ConnectionSettings::new(&config, router));
        let mut accept = tokio::spawn(accept_loop(
            listener,
            connections,
            shutdown.clone(),
            tracker.clone(),
            fatal_tx,
        ));

        transition(&state, LifecycleState::Running);
        tracing::info!(address = %local_addr, "HTTP server running");

        let fatal = tokio::select! {
            _ = signal => None,
            Ok(e) = &mut fatal_rx => Some(e),
        };

        transition(&state, LifecycleState::Draining);
        shutdown.trigger();
        tracing::info!(
            open_connections = tracker.active_count(),
            timeout_secs = config.shutdown_timeout_secs,
            "Draining connections"
        );

        let drain = match tokio::time::timeout(config.shutdown_timeout(), &mut accept).await {
            Ok(joined) => {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Accept task ended abnormally");
                }
                DrainOutcome::Graceful
            }
            Err(_) => {
                let remaining = tracker.active_count();
                tracing::warn!(remaining, "Drain deadline exceeded, closing connections");
                accept.abort();
                let _ = accept.await;
                DrainOutcome::Forced { remaining }
            }
        };

        let hooks = hooks::run_all(hooks).await;

        transition(&state, LifecycleState::Stopped);
        tracing::info!(drain = ?drain, "HTTP server stopped");

        match fatal {
            Some(e) => Err(ServerError::Accept(e)),
            None => Ok(ShutdownReport { drain, hooks }),
        }
    }
}

fn transition(state: &watch::Sender<LifecycleState>, next: LifecycleState) {
    let previous = state.send_replace(next);
    tracing::debug!(from = %previous, to = %next, "Lifecycle transition");
}

/// Shared per-connection serving setup.
struct ConnectionSettings {
    router: Router,
    builder: auto::Builder<TokioExecutor>,
    idle_timeout: Duration,
}

impl ConnectionSettings {
    fn new(config: &ServerConfig, router: Router) -> Self {
        let mut builder = auto::Builder::new(TokioExecutor::new());
        builder
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(config.read_timeout());
        builder.http2().timer(TokioTimer::new());

        Self {
            router,
            builder,
            idle_timeout: config.idle_timeout(),
        }
    }
}

/// Accept connections until shutdown or a fatal accept error, then wait
/// for every connection task to finish.
///
/// The connection tasks live in a `JoinSet` owned by this task, so aborting
/// it closes every connection.
async fn accept_loop(
    listener: Listener,
    settings: Arc<ConnectionSettings>,
    shutdown: Shutdown,
    tracker: ConnectionTracker,
    fatal_tx: oneshot::Sender<ListenerError>,
) {
    let mut connections = JoinSet::new();
    let mut stop = shutdown.subscribe();

    let fatal = loop {
        tokio::select! {
            _ = stop.recv() => break None,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer, permit)) => {
                    let guard = tracker.track();
                    connections.spawn(serve_connection(
                        stream,
                        peer,
                        permit,
                        guard,
                        settings.clone(),
                        shutdown.subscribe(),
                    ));
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!(error = %e, "Transient accept error");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Fatal accept error");
                    break Some(e);
                }
            },
            Some(joined) = connections.join_next(), if !connections.is_empty() => {
                log_connection_exit(joined);
            }
        }
    };

    drop(listener);
    if let Some(e) = fatal {
        let _ = fatal_tx.send(e);
    }

    while let Some(joined) = connections.join_next().await {
        log_connection_exit(joined);
    }
    tracing::debug!("All connections closed");
}

fn log_connection_exit(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if !e.is_cancelled() {
            tracing::error!(error = %e, "Connection task failed");
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    _permit: ConnectionPermit,
    guard: ConnectionGuard,
    settings: Arc<ConnectionSettings>,
    mut shutdown: ShutdownListener,
) {
    let activity = ConnectionActivity::new();
    let router = settings.router.clone();
    let requests = activity.clone();

    let service = hyper::service::service_fn(move |mut request: Request<Incoming>| {
        let router = router.clone();
        let in_flight = requests.begin();
        request.extensions_mut().insert(ConnectInfo(peer));
        async move {
            let response = router.oneshot(request).await;
            drop(in_flight);
            response
        }
    });

    let conn = settings
        .builder
        .serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let idle_timeout = settings.idle_timeout;
    let mut closing = false;

    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    tracing::debug!(connection_id = %guard.id(), peer = %peer, error = %e, "Connection error");
                }
                break;
            }
            _ = shutdown.recv(), if !closing => {
                conn.as_mut().graceful_shutdown();
                closing = true;
            }
            _ = tokio::time::sleep(activity.next_idle_check(idle_timeout)), if !closing => {
                if activity.is_idle(idle_timeout) {
                    tracing::debug!(connection_id = %guard.id(), peer = %peer, "Closing idle connection");
                    conn.as_mut().graceful_shutdown();
                    closing = true;
                }
            }
        }
    }
}
