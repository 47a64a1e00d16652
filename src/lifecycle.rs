//! Process lifecycle for the one-shot wizard.
//!
//! A successful installation does not exit the process directly; it signals
//! completion here and the top-level server loop shuts down once the grace
//! period has elapsed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    shutdown: CancellationToken,
    completed: Arc<AtomicBool>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the installation as done and request shutdown after `grace`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn complete_after(&self, grace: Duration) {
        if self.completed.swap(true, Ordering::SeqCst) {
            return;
        }
        let token = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            log::info!("Installation complete, the wizard is exiting...");
            token.cancel();
        });
    }

    /// True once a run has completed successfully.
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    /// Request shutdown immediately (Ctrl-C).
    pub fn shutdown_now(&self) {
        self.shutdown.cancel();
    }

    /// Resolves when shutdown has been requested.
    pub async fn wait(&self) {
        self.shutdown.cancelled().await;
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completion_cancels_after_grace() {
        let lifecycle = Lifecycle::new();
        assert!(!lifecycle.is_completed());

        lifecycle.complete_after(Duration::from_millis(10));
        assert!(lifecycle.is_completed());

        tokio::time::timeout(Duration::from_secs(5), lifecycle.wait())
            .await
            .expect("shutdown not signalled");
        assert!(lifecycle.is_shutting_down());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let lifecycle = Lifecycle::new();
        let other = lifecycle.clone();
        other.shutdown_now();
        assert!(lifecycle.is_shutting_down());
    }
}
