//! Server lifecycle states and the shutdown report.

use std::fmt;

use crate::lifecycle::hooks::HookReport;

/// ```text
/// Created → Starting → Running → Draining → Stopped
///              └──────→ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Starting,
    Running,
    Draining,
    Stopped,
    Failed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Created => "created",
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How the drain phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every connection finished before the deadline.
    Graceful,
    /// The deadline passed and `remaining` connections were closed forcibly.
    Forced { remaining: u64 },
}

/// Summary returned once the server has stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub drain: DrainOutcome,
    pub hooks: Vec<HookReport>,
}
