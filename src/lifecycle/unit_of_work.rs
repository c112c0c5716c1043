//! Scoped unit-of-work guard.
//!
//! # States
//! ```text
//! InProgress → Completing → Completed
//!     └──────────┴────────→ Aborted   (explicit abort, or drop while unfinished)
//! ```
//!
//! Exactly one of completed/aborted is reported per guard, on every exit
//! path including `?` early returns and panics unwinding through the scope.

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::lifecycle::listeners::ListenerRegistry;
use crate::lifecycle::phase::Phase;
use crate::observability::monitor::ProcessMonitor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkState {
    InProgress,
    /// Pre-completion hooks have fired; still unfinished.
    Completing,
    Completed,
    Aborted,
}

impl WorkState {
    pub fn is_finished(self) -> bool {
        matches!(self, WorkState::Completed | WorkState::Aborted)
    }
}

/// One traceable logical operation.
///
/// Created through [`crate::lifecycle::Process::unit_of_work`] or
/// [`UnitOfWork::begin`].
#[must_use = "dropping a unit of work immediately reports it aborted"]
pub struct UnitOfWork {
    id: Uuid,
    label: String,
    state: WorkState,
    started: Instant,
    listeners: Arc<ListenerRegistry>,
    monitor: Arc<dyn ProcessMonitor>,
}

impl UnitOfWork {
    /// Start a unit of work, notifying the monitor and thread-started listeners.
    pub fn begin(
        label: impl Into<String>,
        listeners: Arc<ListenerRegistry>,
        monitor: Arc<dyn ProcessMonitor>,
    ) -> Self {
        let label = label.into();
        let id = Uuid::new_v4();
        tracing::debug!(unit = %id, label = %label, "Unit of work started");

        monitor.thread_started();
        listeners.fire_thread_started(&label);

        Self {
            id,
            label,
            state: WorkState::InProgress,
            started: Instant::now(),
            listeners,
            monitor,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> WorkState {
        self.state
    }

    /// Fire the pre-completion hooks (flush buffered output and the like).
    ///
    /// Fires at most once per unit: the first call moves the state to
    /// [`WorkState::Completing`] and later calls do nothing.
    pub fn completing(&mut self) {
        if self.state == WorkState::InProgress {
            self.listeners.fire(Phase::ThreadCompleting);
            self.monitor.thread_completing();
            self.state = WorkState::Completing;
        }
    }

    pub fn complete(&mut self) {
        if self.state.is_finished() {
            return;
        }
        self.listeners.fire(Phase::ThreadCompleted);
        self.monitor.thread_completed();
        self.state = WorkState::Completed;
        tracing::debug!(
            unit = %self.id,
            label = %self.label,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Unit of work completed"
        );
    }

    pub fn abort(&mut self) {
        if self.state.is_finished() {
            return;
        }
        self.listeners.fire(Phase::ThreadAborted);
        self.monitor.thread_aborted();
        self.state = WorkState::Aborted;
        tracing::warn!(
            unit = %self.id,
            label = %self.label,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Unit of work aborted"
        );
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        self.abort();
    }
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("state", &self.state)
            .finish()
    }
}
