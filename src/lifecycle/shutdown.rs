//! Shutdown coordination for the server.

use std::sync::Arc;
use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Any number of tasks can hold a [`ShutdownListener`]. Once triggered the
/// signal stays set, so listeners created afterwards observe it immediately.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Future resolving once the signal has been triggered.
    pub async fn triggered(&self) {
        self.subscribe().recv().await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half of [`Shutdown`].
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Wait until shutdown is triggered. Cancel safe.
    pub async fn recv(&mut self) {
        // Every `Shutdown` handle dropped counts as triggered.
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn listeners_observe_trigger() {
        let shutdown = Shutdown::new();
        let mut early = shutdown.subscribe();

        let waiter = tokio::spawn(async move { early.recv().await });
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();

        // Subscribing after the trigger still sees it.
        let mut late = shutdown.subscribe();
        tokio::time::timeout(Duration::from_secs(1), late.recv()).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), shutdown.triggered()).await.unwrap();
    }

    #[tokio::test]
    async fn untriggered_listener_keeps_waiting() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.subscribe();
        assert!(tokio::time::timeout(Duration::from_millis(50), listener.recv())
            .await
            .is_err());
    }
}
