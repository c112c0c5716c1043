//! The dispatch loop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::config::schema::EventLoopConfig;
use crate::error::{ProcessError, ProcessResult};
use crate::event_loop::handle::EventLoopHandle;
use crate::lifecycle::shutdown::Shutdown;

/// A unit of work dispatched on the strand.
pub type Event = Box<dyn FnOnce() + Send + 'static>;

/// Why a call into the loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Shutdown was observed and the queue drained.
    Shutdown,
    /// Nothing queued, nothing pending, and no keep-alive.
    OutOfWork,
    /// The time budget given to `run_for` ran out.
    TimedOut,
}

/// Single logical thread of control for timers and async completions.
pub struct EventLoop {
    runtime: Runtime,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    pending: Arc<AtomicUsize>,
    keep_alive: bool,
    poll_interval: Duration,
}

impl EventLoop {
    pub fn new(config: &EventLoopConfig) -> ProcessResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .thread_name("process-strand")
            .build()
            .map_err(ProcessError::EventLoop)?;
        let (tx, rx) = mpsc::unbounded_channel();

        Ok(Self {
            runtime,
            tx,
            rx,
            pending: Arc::new(AtomicUsize::new(0)),
            keep_alive: config.keep_alive,
            poll_interval: Duration::from_millis(config.shutdown_poll_ms.max(1)),
        })
    }

    pub fn handle(&self) -> EventLoopHandle {
        EventLoopHandle::new(
            self.tx.clone(),
            Arc::clone(&self.pending),
            self.runtime.handle().clone(),
        )
    }

    /// Drop the keep-alive so `run` returns once work runs out.
    pub fn release_keep_alive(&mut self) {
        self.keep_alive = false;
    }

    /// Events queued and not yet dispatched.
    pub fn queued(&self) -> usize {
        self.rx.len()
    }

    /// Run until shutdown is observed or work runs out.
    pub fn run(&mut self, shutdown: &Shutdown) -> LoopExit {
        let Self { runtime, rx, pending, keep_alive, poll_interval, .. } = self;
        runtime.block_on(dispatch(rx, pending, *keep_alive, *poll_interval, shutdown))
    }

    /// Run for at most `budget`, returning even if work remains.
    pub fn run_for(&mut self, budget: Duration, shutdown: &Shutdown) -> LoopExit {
        let Self { runtime, rx, pending, keep_alive, poll_interval, .. } = self;
        runtime.block_on(async {
            tokio::time::timeout(budget, dispatch(rx, pending, *keep_alive, *poll_interval, shutdown))
                .await
                .unwrap_or(LoopExit::TimedOut)
        })
    }

    /// Dispatch the events already queued, once each. Returns how many ran.
    pub fn poll(&mut self) -> usize {
        // Let tasks whose timers already expired deliver their events first.
        self.runtime.block_on(tokio::task::yield_now());
        let _enter = self.runtime.enter();
        drain_queued(&mut self.rx)
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("queued", &self.rx.len())
            .field("pending", &self.pending.load(Ordering::SeqCst))
            .field("keep_alive", &self.keep_alive)
            .finish()
    }
}

async fn dispatch(
    rx: &mut mpsc::UnboundedReceiver<Event>,
    pending: &AtomicUsize,
    keep_alive: bool,
    poll_interval: Duration,
    shutdown: &Shutdown,
) -> LoopExit {
    let mut shutdown_rx = shutdown.subscribe();
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if shutdown.is_requested() {
            shutdown.announce();
            let drained = drain_queued(rx);
            tracing::debug!(drained, "Event loop stopping for shutdown");
            return LoopExit::Shutdown;
        }
        if !keep_alive && rx.is_empty() && pending.load(Ordering::SeqCst) == 0 {
            tracing::debug!("Event loop out of work");
            return LoopExit::OutOfWork;
        }

        tokio::select! {
            event = rx.recv() => {
                if let Some(event) = event {
                    event();
                }
            }
            _ = shutdown_rx.recv() => {}
            _ = ticker.tick() => {}
        }
    }
}

/// Run what is queued right now. Events posted while draining wait for the
/// next call.
fn drain_queued(rx: &mut mpsc::UnboundedReceiver<Event>) -> usize {
    let queued = rx.len();
    let mut ran = 0;
    while ran < queued {
        match rx.try_recv() {
            Ok(event) => {
                event();
                ran += 1;
            }
            Err(_) => break,
        }
    }
    ran
}
