//! Cooperative cancellation shared by the limiter, the client and the batch
//! loop.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

use crate::error::AppError;

#[derive(Debug, Default)]
pub struct Shutdown {
    requested: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Request cancellation. Wakes every waiter exactly once.
    pub fn request(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation is requested.
    pub async fn cancelled(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent request is not missed.
        notified.as_mut().enable();

        if self.is_requested() {
            return;
        }
        notified.await;
    }

    /// Run `fut` unless cancellation wins the race first.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, AppError> {
        if self.is_requested() {
            return Err(AppError::Cancelled);
        }

        tokio::select! {
            _ = self.cancelled() => Err(AppError::Cancelled),
            out = fut => Ok(out),
        }
    }

    /// Spawn a task requesting cancellation on Ctrl+C.
    pub fn watch_ctrl_c(self: &Arc<Self>) {
        let shutdown = Arc::clone(self);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("🛑 Ctrl+C received, stopping after the current request");
                shutdown.request();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn guard_runs_future_when_not_cancelled() {
        let shutdown = Shutdown::new();
        let out = shutdown.guard(async { 7 }).await.unwrap();
        assert_eq!(out, 7);
    }

    #[tokio::test]
    async fn guard_refuses_after_request() {
        let shutdown = Shutdown::new();
        shutdown.request();

        let res = shutdown.guard(async { 7 }).await;
        assert!(matches!(res, Err(AppError::Cancelled)));
    }

    #[tokio::test]
    async fn request_interrupts_pending_future() {
        let shutdown = Shutdown::shared();
        let cloned = Arc::clone(&shutdown);

        let handle = tokio::spawn(async move {
            cloned
                .guard(std::future::pending::<()>())
                .await
        });

        tokio::task::yield_now().await;
        shutdown.request();

        let res = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(res, Err(AppError::Cancelled)));
    }
}
