//! Connection lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Count open connections so the drain phase can report what it cut off
//! - Track per-connection request activity for the idle timeout

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Counts open connections.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new open connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    /// Get current open connection count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }
}

/// Guard that tracks a connection's lifetime.
/// Decrements active count when dropped, including when the task is aborted.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

/// Request activity on a single connection.
///
/// A connection is idle when it has no request in flight and none has
/// started or finished for at least the idle timeout.
#[derive(Debug, Clone)]
pub struct ConnectionActivity {
    inner: Arc<ActivityState>,
}

#[derive(Debug)]
struct ActivityState {
    origin: Instant,
    in_flight: AtomicUsize,
    /// Milliseconds since `origin` of the last request start or finish.
    last_activity_ms: AtomicU64,
}

impl ConnectionActivity {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ActivityState {
                origin: Instant::now(),
                in_flight: AtomicUsize::new(0),
                last_activity_ms: AtomicU64::new(0),
            }),
        }
    }

    /// Mark a request as started. The request counts as in flight until the
    /// returned guard is dropped.
    pub fn begin(&self) -> RequestGuard {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        self.touch();
        RequestGuard {
            activity: self.clone(),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Time since the last request started or finished.
    pub fn idle_for(&self) -> Duration {
        let last = Duration::from_millis(self.inner.last_activity_ms.load(Ordering::SeqCst));
        self.inner.origin.elapsed().saturating_sub(last)
    }

    pub fn is_idle(&self, idle_timeout: Duration) -> bool {
        self.in_flight() == 0 && self.idle_for() >= idle_timeout
    }

    /// How long to wait before the idle condition can next become true.
    pub fn next_idle_check(&self, idle_timeout: Duration) -> Duration {
        if self.in_flight() > 0 {
            idle_timeout
        } else {
            idle_timeout
                .saturating_sub(self.idle_for())
                .max(Duration::from_millis(10))
        }
    }

    fn touch(&self) {
        let now = self.inner.origin.elapsed().as_millis() as u64;
        self.inner.last_activity_ms.store(now, Ordering::SeqCst);
    }
}

impl Default for ConnectionActivity {
    fn default() -> Self {
        Self::new()
    }
}

/// In-flight marker for one request. See [`ConnectionActivity::begin`].
#[derive(Debug)]
pub struct RequestGuard {
    activity: ConnectionActivity,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.activity.touch();
        self.activity.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
