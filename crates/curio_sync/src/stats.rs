//! Counters shared across the engine's components.

use parking_lot::RwLock;
use std::sync::Arc;

/// Statistics about sync activity.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Mutations applied to the remote store during replay.
    pub mutations_replayed: u64,
    /// Mutations moved to the queue tail after a failed apply.
    pub mutations_requeued: u64,
    /// Mutations dropped after exhausting their attempt budget.
    pub mutations_dead_lettered: u64,
    /// Mutations evicted because the queue was at capacity.
    pub mutations_evicted: u64,
    /// Remote changes reconciled into the local store.
    pub changes_applied: u64,
    /// Remote changes skipped (duplicates, unknown IDs, malformed).
    pub changes_skipped: u64,
    /// Completed drain cycles.
    pub drains_completed: u64,
    /// Last absorbed error, if any.
    pub last_error: Option<String>,
}

/// Cloneable handle to the engine's shared statistics.
#[derive(Clone, Default)]
pub struct SharedStats {
    inner: Arc<RwLock<SyncStats>>,
}

impl SharedStats {
    /// Creates a fresh set of counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current counters.
    pub fn snapshot(&self) -> SyncStats {
        self.inner.read().clone()
    }

    pub(crate) fn record_replayed(&self, count: u64) {
        self.inner.write().mutations_replayed += count;
    }

    pub(crate) fn record_requeued(&self) {
        self.inner.write().mutations_requeued += 1;
    }

    pub(crate) fn record_dead_lettered(&self) {
        self.inner.write().mutations_dead_lettered += 1;
    }

    pub(crate) fn record_evicted(&self) {
        self.inner.write().mutations_evicted += 1;
    }

    pub(crate) fn record_change_applied(&self) {
        self.inner.write().changes_applied += 1;
    }

    pub(crate) fn record_change_skipped(&self) {
        self.inner.write().changes_skipped += 1;
    }

    pub(crate) fn record_drain_completed(&self) {
        self.inner.write().drains_completed += 1;
    }

    pub(crate) fn record_error(&self, message: impl Into<String>) {
        self.inner.write().last_error = Some(message.into());
    }
}
