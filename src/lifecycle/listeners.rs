//! Per-phase listener sets.
//!
//! Listeners are kept in registration order and invoked in that order; the
//! same callback may be registered more than once. Firing takes a snapshot of
//! the table, so a listener may register or remove listeners without
//! affecting the firing in progress.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::lifecycle::phase::Phase;

type Callback = Arc<dyn Fn(Option<&str>) + Send + Sync>;

/// Opaque handle returned by registration, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken {
    phase: Phase,
    id: u64,
}

impl ListenerToken {
    pub fn phase(&self) -> Phase {
        self.phase
    }
}

#[derive(Clone, Default)]
struct Table {
    slots: [Vec<(u64, Callback)>; Phase::COUNT],
}

/// Ordered listener lists, one per [`Phase`].
pub struct ListenerRegistry {
    table: ArcSwap<Table>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(Table::default()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a callback for `phase`.
    ///
    /// On [`Phase::ThreadStarted`] the unit-of-work label is available through
    /// [`ListenerRegistry::register_thread_started`] instead.
    pub fn register<F>(&self, phase: Phase, listener: F) -> ListenerToken
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.insert(phase, Arc::new(move |_: Option<&str>| listener()))
    }

    /// Register a thread-started callback that receives the unit-of-work label.
    pub fn register_thread_started<F>(&self, listener: F) -> ListenerToken
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.insert(
            Phase::ThreadStarted,
            Arc::new(move |label: Option<&str>| listener(label.unwrap_or_default())),
        )
    }

    /// Detach a listener. Returns false if it was already gone.
    pub fn remove(&self, token: ListenerToken) -> bool {
        let mut removed = false;
        self.table.rcu(|table| {
            let mut next = Table::clone(table);
            let slot = &mut next.slots[token.phase.index()];
            let before = slot.len();
            slot.retain(|(id, _)| *id != token.id);
            removed = slot.len() != before;
            next
        });
        removed
    }

    /// Number of listeners currently attached to `phase`.
    pub fn count(&self, phase: Phase) -> usize {
        self.table.load().slots[phase.index()].len()
    }

    pub(crate) fn fire(&self, phase: Phase) {
        self.fire_with(phase, None);
    }

    pub(crate) fn fire_thread_started(&self, label: &str) {
        self.fire_with(Phase::ThreadStarted, Some(label));
    }

    fn fire_with(&self, phase: Phase, label: Option<&str>) {
        let snapshot = self.table.load_full();
        let slot = &snapshot.slots[phase.index()];
        tracing::trace!(phase = %phase, listeners = slot.len(), "Firing listeners");
        for (_, callback) in slot {
            callback(label);
        }
    }

    fn insert(&self, phase: Phase, callback: Callback) -> ListenerToken {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.table.rcu(|table| {
            let mut next = Table::clone(table);
            next.slots[phase.index()].push((id, Arc::clone(&callback)));
            next
        });
        ListenerToken { phase, id }
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.load();
        let mut map = f.debug_map();
        for phase in Phase::ALL {
            map.entry(&phase.as_str(), &table.slots[phase.index()].len());
        }
        map.finish()
    }
}
