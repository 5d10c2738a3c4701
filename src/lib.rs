//! Users REST API library.
//!
//! Read-only HTTP service over a user store with a correlation-aware request
//! pipeline and a managed server lifecycle.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod users;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
