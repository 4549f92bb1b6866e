//! Cooperative cancellation for builds and the watch loop.
//!
//! A [`Context`] is a cheap, cloneable view of a cancellation flag backed by a
//! `tokio::sync::watch` channel. Long-running operations either poll
//! [`Context::is_cancelled`] between steps or race [`Context::cancelled`] in a
//! `select!`.

use std::future;
use tokio::sync::watch;

/// Cancellation context passed into builds and watchers.
#[derive(Debug, Clone, Default)]
pub struct Context {
    rx: Option<watch::Receiver<bool>>,
}

/// Handle that cancels every clone of its [`Context`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl Context {
    /// A context that is never cancelled.
    pub fn background() -> Self {
        Self { rx: None }
    }

    /// Create a cancellable context and its handle.
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (Self { rx: Some(rx) }, CancelHandle { tx })
    }

    /// Check the flag without waiting.
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolve once the context is cancelled.
    ///
    /// Pends forever for background contexts and for contexts whose handle was
    /// dropped without cancelling.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return future::pending().await;
        };

        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return future::pending().await;
            }
        }
    }
}

impl CancelHandle {
    /// Cancel the associated context. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    /// Another context observing this handle.
    pub fn context(&self) -> Context {
        Context {
            rx: Some(self.tx.subscribe()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_background_is_never_cancelled() {
        assert!(!Context::background().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_wakes_all_clones() {
        let (ctx, handle) = Context::with_cancel();
        let clone = ctx.clone();
        let derived = handle.context();

        let waiter = tokio::spawn(async move { clone.cancelled().await });
        handle.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("cancellation should wake waiter")
            .unwrap();
        assert!(ctx.is_cancelled());
        assert!(derived.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_handle_does_not_cancel() {
        let (ctx, handle) = Context::with_cancel();
        drop(handle);

        let res = tokio::time::timeout(Duration::from_millis(50), ctx.cancelled()).await;
        assert!(res.is_err());
        assert!(!ctx.is_cancelled());
    }
}
