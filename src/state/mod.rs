//! Shared dashboard state.
//!
//! [`StateStore`] is the only mutable state shared between the push channel
//! and the interaction loop. Every write installs a complete new
//! [`DashboardSnapshot`]; readers always get a whole snapshot, either the one
//! before a write or the one after it.
//!
//! Writers are serialized by the underlying `tokio::sync::watch` channel, which
//! also wakes subscribers when a new snapshot lands.

mod snapshot;

pub use snapshot::*;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Process-wide holder of the latest dashboard snapshot.
///
/// # Examples
///
/// ```
/// use rxwatch::state::{ConnectionState, StateStore};
///
/// let store = StateStore::new();
/// assert_eq!(store.snapshot().connection.state, ConnectionState::Disconnected);
///
/// store.apply(|current| {
///     let mut next = current.clone();
///     next.connection.state = ConnectionState::Connecting;
///     next
/// });
/// assert_eq!(store.snapshot().connection.state, ConnectionState::Connecting);
/// ```
pub struct StateStore {
    tx: watch::Sender<Arc<DashboardSnapshot>>,
    search_sequence: AtomicU64,
}

impl StateStore {
    /// Create a store holding an empty snapshot.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(DashboardSnapshot::default()));
        Self {
            tx,
            search_sequence: AtomicU64::new(0),
        }
    }

    /// The current snapshot. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.tx.borrow().clone()
    }

    /// Install the snapshot produced by `patch` from the current one.
    ///
    /// `patch` runs while the write side is held, so concurrent writers never
    /// interleave. Returns the generation of the installed snapshot.
    pub fn apply<F>(&self, patch: F) -> u64
    where
        F: FnOnce(&DashboardSnapshot) -> DashboardSnapshot,
    {
        let mut generation = 0;
        self.tx.send_modify(|current| {
            let mut next = patch(current);
            next.generation = current.generation + 1;
            generation = next.generation;
            *current = Arc::new(next);
        });
        generation
    }

    /// Like [`apply`](Self::apply), but `patch` may decline by returning `None`.
    ///
    /// Returns true if a new snapshot was installed.
    pub fn try_apply<F>(&self, patch: F) -> bool
    where
        F: FnOnce(&DashboardSnapshot) -> Option<DashboardSnapshot>,
    {
        self.tx.send_if_modified(|current| match patch(current) {
            Some(mut next) => {
                next.generation = current.generation + 1;
                *current = Arc::new(next);
                true
            }
            None => false,
        })
    }

    /// Record a user-visible notice.
    pub fn notify(&self, notice: Notice) {
        self.apply(|current| current.with_notice(notice));
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardSnapshot>> {
        self.tx.subscribe()
    }

    /// Tag for a new search request. Strictly increasing.
    pub fn next_search_sequence(&self) -> u64 {
        self.search_sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Mark a handler as in flight until the returned guard drops.
    pub fn enter_busy(&self) -> BusyGuard<'_> {
        self.apply(|current| {
            let mut next = current.clone();
            next.busy_depth += 1;
            next
        });
        BusyGuard { store: self }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped busy marker. Leaves the busy state on drop, whatever the exit path.
#[must_use = "the busy state ends as soon as the guard is dropped"]
pub struct BusyGuard<'a> {
    store: &'a StateStore,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.store.apply(|current| {
            let mut next = current.clone();
            next.busy_depth = next.busy_depth.saturating_sub(1);
            next
        });
    }
}
