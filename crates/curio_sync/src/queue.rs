//! Bounded FIFO queue of pending local mutations.
//!
//! The queue is in-memory only. A crash while offline drops all
//! unreplayed mutations; that is a documented limitation of the
//! design, not a bug.

use crate::stats::SharedStats;
use curio_model::PendingMutation;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::warn;

/// A bounded FIFO of mutations awaiting replay.
///
/// At capacity the oldest entry is evicted before the newest is
/// appended. Eviction is an explicit, logged event distinct from an
/// error.
pub struct MutationQueue {
    entries: Mutex<VecDeque<PendingMutation>>,
    max_size: usize,
    stats: SharedStats,
}

impl MutationQueue {
    /// Creates a queue holding at most `max_size` mutations.
    pub fn new(max_size: usize, stats: SharedStats) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            max_size,
            stats,
        }
    }

    /// Appends a mutation, evicting the oldest entry at capacity.
    ///
    /// Returns the evicted mutation, if any.
    pub fn enqueue(&self, mutation: PendingMutation) -> Option<PendingMutation> {
        let evicted = {
            let mut entries = self.entries.lock();
            let evicted = if entries.len() >= self.max_size {
                entries.pop_front()
            } else {
                None
            };
            entries.push_back(mutation);
            evicted
        };

        if let Some(victim) = &evicted {
            warn!(
                mutation_id = %victim.id,
                kind = victim.mutation.kind_name(),
                "queue at capacity, evicting oldest pending mutation"
            );
            self.stats.record_evicted();
        }
        evicted
    }

    /// Atomically swaps the queue contents out for an empty queue.
    ///
    /// A mutation enqueued during a subsequent drain of the returned
    /// snapshot is untouched; it simply waits for the next swap.
    pub fn swap_out(&self) -> VecDeque<PendingMutation> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Number of queued mutations.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Copies the current contents, oldest first. Test observability.
    pub fn snapshot(&self) -> Vec<PendingMutation> {
        self.entries.lock().iter().cloned().collect()
    }
}
