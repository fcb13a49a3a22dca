//! Cooperative cancellation for reply streams.
//!
//! A [`CancelHandle`] is the caller's side; the read loop holds the matching
//! [`CancelSignal`] and races it against every await point.

use std::sync::Arc;
use tokio::sync::watch;

/// Create a connected handle/signal pair.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, CancelSignal { rx })
}

/// Requests cancellation of one stream. Cheap to clone; every clone cancels
/// the same stream.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Whether both handles control the same stream.
    pub fn same_stream(&self, other: &CancelHandle) -> bool {
        Arc::ptr_eq(&self.tx, &other.tx)
    }

    /// A fresh signal observing this handle.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observes a [`CancelHandle`].
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested.
    ///
    /// Never resolves if every handle is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        if *self.rx.borrow_and_update() {
            return;
        }
        while self.rx.changed().await.is_ok() {
            if *self.rx.borrow_and_update() {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_same_stream() {
        let (handle, _signal) = cancel_pair();
        let (other, _other_signal) = cancel_pair();
        assert!(handle.same_stream(&handle.clone()));
        assert!(!handle.same_stream(&other));
    }

    #[test]
    fn test_cancel_is_visible_to_signal() {
        let (handle, signal) = cancel_pair();
        assert!(!signal.is_cancelled());

        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(signal.is_cancelled());
        assert!(handle.signal().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_cancel() {
        let (handle, mut signal) = cancel_pair();

        let waiter = tokio::spawn(async move {
            signal.cancelled().await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.clone().cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("signal should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_pends_when_handle_dropped() {
        let (handle, mut signal) = cancel_pair();
        drop(handle);

        let result = tokio::time::timeout(Duration::from_millis(20), signal.cancelled()).await;
        assert!(result.is_err());
    }
}
