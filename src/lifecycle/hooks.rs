//! Shutdown hooks.
//!
//! Hooks run after the drain phase, one after another, each under its own
//! timeout so a slow hook cannot hold up the ones after it.

use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

type HookFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), HookError>> + Send>;

/// A named cleanup action with its own time budget.
pub struct ShutdownHook {
    name: String,
    timeout: Duration,
    run: HookFn,
}

impl ShutdownHook {
    pub fn new<F, Fut>(name: impl Into<String>, timeout: Duration, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            timeout,
            run: Box::new(move || Box::pin(f())),
        }
    }

    /// Run the hook within its timeout.
    pub async fn execute(self) -> HookReport {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, (self.run)()).await {
            Ok(Ok(())) => HookOutcome::Completed,
            Ok(Err(e)) => HookOutcome::Failed(e.to_string()),
            Err(_) => HookOutcome::TimedOut,
        };

        match &outcome {
            HookOutcome::Completed => tracing::info!(
                hook = %self.name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Shutdown hook completed"
            ),
            HookOutcome::Failed(error) => {
                tracing::error!(hook = %self.name, error = %error, "Shutdown hook failed")
            }
            HookOutcome::TimedOut => tracing::warn!(
                hook = %self.name,
                timeout_ms = self.timeout.as_millis() as u64,
                "Shutdown hook timed out"
            ),
        }

        HookReport {
            name: self.name,
            outcome,
        }
    }
}

impl fmt::Debug for ShutdownHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownHook")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    Completed,
    Failed(String),
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookReport {
    pub name: String,
    pub outcome: HookOutcome,
}

/// Run `hooks` in registration order.
pub async fn run_all(hooks: Vec<ShutdownHook>) -> Vec<HookReport> {
    let mut reports = Vec::with_capacity(hooks.len());
    for hook in hooks {
        reports.push(hook.execute().await);
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn each_hook_gets_its_own_timeout() {
        let later_ran = Arc::new(AtomicBool::new(false));
        let flag = later_ran.clone();

        let hooks = vec![
            ShutdownHook::new("slow", Duration::from_millis(20), || async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            }),
            ShutdownHook::new("broken", Duration::from_secs(1), || async {
                Err::<(), HookError>("exporter unreachable".into())
            }),
            ShutdownHook::new("quick", Duration::from_secs(1), move || async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }),
        ];

        let reports = run_all(hooks).await;

        assert_eq!(
            reports,
            vec![
                HookReport { name: "slow".into(), outcome: HookOutcome::TimedOut },
                HookReport {
                    name: "broken".into(),
                    outcome: HookOutcome::Failed("exporter unreachable".into()),
                },
                HookReport { name: "quick".into(), outcome: HookOutcome::Completed },
            ]
        );
        assert!(later_ran.load(Ordering::SeqCst));
    }
}
