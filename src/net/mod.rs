//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Client connects
//!     → listener.rs (accept TCP, enforce max_connections)
//!     → connection.rs (track open connections and request activity)
//!     → Hand off to http/server.rs
//! ```

pub mod connection;
pub mod listener;

pub use connection::{ConnectionActivity, ConnectionTracker};
pub use listener::{Listener, ListenerError};
