use crate::error::{CxrError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Cloneable cancellation handle shared with extraction workers.
///
/// Workers poll `is_cancelled` before starting new work and await
/// `cancelled` to kill in-flight tool processes.
#[derive(Clone)]
pub struct CancelToken {
    running: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        !self.running.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(CxrError::Cancelled);
        }
        Ok(())
    }

    /// Resolves once cancellation is requested. Safe against requests
    /// that happened before the call.
    pub async fn cancelled(&self) {
        let mut notified = std::pin::pin!(self.notify.notified());
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

pub struct GracefulShutdown {
    running: Arc<AtomicBool>,
    notify: Arc<Notify>,
    shutdown_message_shown: Arc<AtomicBool>,
}

impl GracefulShutdown {
    pub fn new() -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let notify = Arc::new(Notify::new());
        let shutdown_message_shown = Arc::new(AtomicBool::new(false));

        let running_clone = running.clone();
        let notify_clone = notify.clone();
        let message_shown_clone = shutdown_message_shown.clone();

        // Handle Ctrl+C gracefully
        ctrlc::set_handler(move || {
            running_clone.store(false, Ordering::SeqCst);
            notify_clone.notify_waiters();

            if !message_shown_clone.swap(true, Ordering::SeqCst) {
                eprintln!("\n🛑 Stopping after in-flight extractions... (press Ctrl+C again to force exit)");
            } else {
                eprintln!("\n💀 Force stopping...");
                std::process::exit(1);
            }
        })
        .map_err(|e| CxrError::Config {
            message: format!("Failed to set signal handler: {}", e),
        })?;

        Ok(Self {
            running,
            notify,
            shutdown_message_shown,
        })
    }

    /// Create a GracefulShutdown instance for testing (no signal handler registration)
    pub fn new_for_test() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            notify: Arc::new(Notify::new()),
            shutdown_message_shown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn check_shutdown(&self) -> Result<()> {
        if !self.is_running() {
            return Err(CxrError::Cancelled);
        }
        Ok(())
    }

    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn reset(&self) {
        self.running.store(true, Ordering::SeqCst);
        self.shutdown_message_shown.store(false, Ordering::SeqCst);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            running: self.running.clone(),
            notify: self.notify.clone(),
        }
    }
}

impl Default for GracefulShutdown {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::new_for_test())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_state_management() {
        let shutdown = GracefulShutdown::new_for_test();

        assert!(shutdown.is_running());
        assert!(shutdown.check_shutdown().is_ok());

        shutdown.request_shutdown();
        assert!(!shutdown.is_running());
        assert!(matches!(
            shutdown.check_shutdown(),
            Err(CxrError::Cancelled)
        ));

        shutdown.reset();
        assert!(shutdown.is_running());
        assert!(shutdown.check_shutdown().is_ok());
    }

    #[test]
    fn test_token_tracks_shutdown() {
        let shutdown = GracefulShutdown::new_for_test();
        let token = shutdown.token();

        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());

        shutdown.request_shutdown();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(CxrError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancelled_resolves_for_earlier_request() {
        let shutdown = GracefulShutdown::new_for_test();
        let token = shutdown.token();

        shutdown.request_shutdown();
        // Must not hang even though the request predates the wait.
        token.cancelled().await;
    }

    #[tokio::test]
    async fn test_cancelled_resolves_for_later_request() {
        let shutdown = GracefulShutdown::new_for_test();
        let token = shutdown.token();

        let waiter = tokio::spawn(async move { token.cancelled().await });
        tokio::task::yield_now().await;
        shutdown.request_shutdown();

        waiter.await.unwrap();
    }
}
