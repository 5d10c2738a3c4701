//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (http/server.rs):
//!     Created → bind listener → Starting → spawn accept loop → Running
//!
//! Shutdown (shutdown.rs, hooks.rs):
//!     Signal received → Draining → stop accepting → drain connections
//!         → (deadline) force-close → run hooks → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → resolve the shutdown future
//! ```
//!
//! # Design Decisions
//! - Bind failure is fatal and ends in `Failed`
//! - Drain has a timeout: forced close after deadline
//! - Every shutdown hook has its own timeout

pub mod hooks;
pub mod shutdown;
pub mod signals;
pub mod state;

pub use hooks::{HookOutcome, HookReport, ShutdownHook};
pub use shutdown::{Shutdown, ShutdownListener};
pub use signals::{shutdown_signal, ShutdownSignal};
pub use state::{DrainOutcome, LifecycleState, ShutdownReport};
