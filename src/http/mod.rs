//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs     (accept loop, HTTP/1.1 + HTTP/2, timeouts, drain)
//!     → middleware/   (cors → correlation → access log → recovery)
//!     → routes.rs     (route table)
//!     → handlers/     (decode parameters, call the user service)
//!     → error.rs      (service outcome → status + JSON body)
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use middleware::CorrelationSettings;
pub use routes::{build_router, AppState};
pub use server::{BoundServer, HttpServer, ServerError};
