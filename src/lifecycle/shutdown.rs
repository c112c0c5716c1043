//! Cooperative shutdown coordination.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

/// Process-wide shutdown flag.
///
/// The flag flips false → true once and never resets. Long-running async
/// collaborators can also subscribe to a broadcast that is sent once the
/// request has been observed.
#[derive(Debug)]
pub struct Shutdown {
    requested: AtomicBool,
    announced: AtomicBool,
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            requested: AtomicBool::new(false),
            announced: AtomicBool::new(false),
            tx,
        }
    }

    /// Subscribe to the shutdown announcement.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Request shutdown and wake subscribers. Returns true for the first request.
    pub fn request(&self) -> bool {
        let first = !self.requested.swap(true, Ordering::SeqCst);
        if first {
            tracing::info!("Shutdown requested");
        }
        self.announce();
        first
    }

    /// Request shutdown from a signal handler.
    ///
    /// Only a lock-free store: no allocation, no locking, no logging. The
    /// event loop notices the flag at its next poll tick and announces it.
    pub fn request_from_signal(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Broadcast the request to subscribers, once.
    pub(crate) fn announce(&self) {
        if self.is_requested() && !self.announced.swap(true, Ordering::SeqCst) {
            let _ = self.tx.send(());
        }
    }

    /// Get the number of active subscribers (tasks still listening).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_idempotent() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_requested());
        assert!(shutdown.request());
        assert!(!shutdown.request());
        assert!(shutdown.is_requested());
    }

    #[tokio::test]
    async fn subscribers_hear_exactly_one_announcement() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();

        shutdown.request();
        shutdown.request();

        assert!(rx.recv().await.is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn signal_path_defers_announcement() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();

        shutdown.request_from_signal();
        assert!(shutdown.is_requested());
        assert!(rx.try_recv().is_err());

        shutdown.announce();
        assert!(rx.recv().await.is_ok());
    }
}
