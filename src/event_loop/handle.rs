//! Cloneable handle for feeding work onto the strand.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::mpsc;

use crate::event_loop::strand::Event;

/// Posts events onto the loop from any thread.
#[derive(Debug, Clone)]
pub struct EventLoopHandle {
    tx: mpsc::UnboundedSender<Event>,
    pending: Arc<AtomicUsize>,
    runtime: tokio::runtime::Handle,
}

impl EventLoopHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<Event>,
        pending: Arc<AtomicUsize>,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        Self { tx, pending, runtime }
    }

    /// Queue an event. Returns false if the loop is gone.
    pub fn post<F>(&self, event: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx.send(Box::new(event)).is_ok()
    }

    /// Queue an event once `delay` has elapsed on the loop's clock.
    pub fn post_after<F>(&self, delay: Duration, event: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let guard = PendingWork::track(&self.pending);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Box::new(event));
            drop(guard);
        });
    }

    /// Drive `future` on the loop's runtime and dispatch `on_complete` with
    /// its output onto the strand. If the future panics nothing is
    /// dispatched and the panic is logged.
    pub fn spawn<Fut, C>(&self, future: Fut, on_complete: C)
    where
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
        C: FnOnce(Fut::Output) + Send + 'static,
    {
        let guard = PendingWork::track(&self.pending);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            match AssertUnwindSafe(future).catch_unwind().await {
                Ok(output) => {
                    let _ = tx.send(Box::new(move || on_complete(output)));
                }
                Err(_) => tracing::error!("Async operation panicked; completion dropped"),
            }
            drop(guard);
        });
    }

    /// Timers and async completions not yet delivered to the queue.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

/// Counts one outstanding timer or task. Decrements on drop, so an aborted
/// or panicked task never leaves the loop waiting on it.
#[derive(Debug)]
struct PendingWork {
    pending: Arc<AtomicUsize>,
}

impl PendingWork {
    fn track(pending: &Arc<AtomicUsize>) -> Self {
        pending.fetch_add(1, Ordering::SeqCst);
        Self {
            pending: Arc::clone(pending),
        }
    }
}

impl Drop for PendingWork {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }
}
