//! Replay of queued mutations against the remote store.
//!
//! Draining swaps the whole queue out under one critical section and
//! then applies the snapshot sequentially. The swap guarantees that
//! two concurrent drains never see the same mutation and that an
//! enqueue during a drain is neither lost nor replayed twice; it waits
//! for the next drain.
//!
//! Delivery is at-least-once: a mutation whose apply fails is moved to
//! the queue tail and retried on the next drain, until its attempt
//! budget runs out and it is dead-lettered.

use crate::config::RetryConfig;
use crate::error::SyncResult;
use crate::queue::MutationQueue;
use crate::remote::RemoteStore;
use crate::stats::SharedStats;
use curio_model::{Mutation, PendingMutation, RemotePath};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one drain cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Mutations applied to the remote store.
    pub applied: u64,
    /// Mutations moved to the queue tail for another attempt.
    pub requeued: u64,
    /// Mutations dropped after exhausting their attempt budget.
    pub dead_lettered: u64,
}

/// Drains the mutation queue into the remote store.
pub struct MutationReplayer<R: RemoteStore> {
    remote: Arc<R>,
    queue: Arc<MutationQueue>,
    retry: RetryConfig,
    dead_letters: Mutex<VecDeque<PendingMutation>>,
    stats: SharedStats,
}

impl<R: RemoteStore> MutationReplayer<R> {
    /// Creates a replayer draining `queue` into `remote`.
    pub fn new(
        remote: Arc<R>,
        queue: Arc<MutationQueue>,
        retry: RetryConfig,
        stats: SharedStats,
    ) -> Self {
        Self {
            remote,
            queue,
            retry,
            dead_letters: Mutex::new(VecDeque::new()),
            stats,
        }
    }

    /// Applies a single mutation to the remote store immediately.
    pub fn apply_now(&self, user_id: &str, mutation: &Mutation) -> SyncResult<()> {
        match mutation {
            Mutation::CreateCollection { collection_id, doc } => self.remote.create_document(
                &RemotePath::collections(user_id),
                collection_id,
                doc.to_snapshot(),
            ),
            Mutation::UpdateCollection { collection_id, doc } => self.remote.set_document(
                &RemotePath::collections(user_id),
                collection_id,
                doc.to_snapshot(),
            ),
            Mutation::DeleteCollection { collection_id } => self
                .remote
                .delete_document(&RemotePath::collections(user_id), collection_id),
            Mutation::CreateItem {
                collection_id,
                item_id,
                doc,
            } => self.remote.create_document(
                &RemotePath::items(user_id, collection_id),
                item_id,
                doc.to_snapshot(),
            ),
            Mutation::UpdateItem {
                collection_id,
                item_id,
                doc,
            } => self.remote.set_document(
                &RemotePath::items(user_id, collection_id),
                item_id,
                doc.to_snapshot(),
            ),
            Mutation::DeleteItem {
                collection_id,
                item_id,
            } => self
                .remote
                .delete_document(&RemotePath::items(user_id, collection_id), item_id),
        }
    }

    /// Drains the queue and replays every swapped-out mutation.
    ///
    /// A failed apply is logged and the mutation requeued at the tail
    /// (or dead-lettered once its attempts are spent); the drain
    /// continues with the next mutation either way.
    pub fn drain_and_replay(&self, user_id: &str) -> DrainReport {
        let batch = self.queue.swap_out();
        let mut report = DrainReport::default();

        for mut pending in batch {
            match self.apply_now(user_id, &pending.mutation) {
                Ok(()) => {
                    debug!(
                        mutation_id = %pending.id,
                        kind = pending.mutation.kind_name(),
                        "replayed mutation"
                    );
                    report.applied += 1;
                }
                Err(err) => {
                    pending.attempts += 1;
                    self.stats.record_error(err.to_string());
                    if pending.attempts >= self.retry.max_attempts {
                        warn!(
                            mutation_id = %pending.id,
                            kind = pending.mutation.kind_name(),
                            attempts = pending.attempts,
                            %err,
                            "mutation exhausted its attempts, dead-lettering"
                        );
                        self.dead_letter(pending);
                        report.dead_lettered += 1;
                        self.stats.record_dead_lettered();
                    } else {
                        warn!(
                            mutation_id = %pending.id,
                            kind = pending.mutation.kind_name(),
                            attempts = pending.attempts,
                            %err,
                            "replay failed, requeueing at tail"
                        );
                        self.queue.enqueue(pending);
                        report.requeued += 1;
                        self.stats.record_requeued();
                    }
                }
            }
        }

        self.stats.record_replayed(report.applied);
        self.stats.record_drain_completed();
        report
    }

    /// Mutations dropped after exhausting their attempt budget,
    /// oldest first.
    pub fn dead_letters(&self) -> Vec<PendingMutation> {
        self.dead_letters.lock().iter().cloned().collect()
    }

    fn dead_letter(&self, pending: PendingMutation) {
        let mut letters = self.dead_letters.lock();
        if letters.len() >= self.retry.dead_letter_capacity {
            letters.pop_front();
        }
        letters.push_back(pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MockRemoteStore;
    use curio_model::CollectionDoc;
    use std::thread;

    fn create(collection_id: &str) -> PendingMutation {
        PendingMutation::new(Mutation::CreateCollection {
            collection_id: collection_id.into(),
            doc: CollectionDoc {
                name: collection_id.to_uppercase(),
                category: "misc".into(),
                created_at_ms: 0,
                item_count: 0,
            },
        })
    }

    fn replayer(
        remote: &Arc<MockRemoteStore>,
        retry: RetryConfig,
    ) -> (Arc<MutationQueue>, MutationReplayer<MockRemoteStore>) {
        let stats = SharedStats::new();
        let queue = Arc::new(MutationQueue::new(1000, stats.clone()));
        let replayer = MutationReplayer::new(Arc::clone(remote), Arc::clone(&queue), retry, stats);
        (queue, replayer)
    }

    #[test]
    fn drain_applies_in_fifo_order() {
        let remote = Arc::new(MockRemoteStore::new());
        let (queue, replayer) = replayer(&remote, RetryConfig::default());

        queue.enqueue(create("c1"));
        queue.enqueue(create("c2"));

        let report = replayer.drain_and_replay("u1");
        assert_eq!(report.applied, 2);
        assert!(queue.is_empty());

        let log = remote.op_log();
        assert_eq!(
            log,
            vec![("create", "c1".to_string()), ("create", "c2".to_string())]
        );
    }

    #[test]
    fn failed_mutation_moves_to_tail_and_drain_continues() {
        let remote = Arc::new(MockRemoteStore::new());
        let (queue, replayer) = replayer(&remote, RetryConfig::default());

        remote.fail_times("c1", 1);
        queue.enqueue(create("c1"));
        queue.enqueue(create("c2"));

        let report = replayer.drain_and_replay("u1");
        assert_eq!(report.applied, 1);
        assert_eq!(report.requeued, 1);

        // c2 applied despite c1's failure; c1 back in the queue with
        // an attempt recorded.
        assert_eq!(remote.apply_count("create", "c2"), 1);
        let queued = queue.snapshot();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].mutation.collection_id(), "c1");
        assert_eq!(queued[0].attempts, 1);

        // Next drain succeeds.
        let report = replayer.drain_and_replay("u1");
        assert_eq!(report.applied, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn exhausted_mutation_is_dead_lettered() {
        let remote = Arc::new(MockRemoteStore::new());
        let (queue, replayer) = replayer(&remote, RetryConfig::new(2));

        remote.fail_times("c1", 10);
        queue.enqueue(create("c1"));

        let first = replayer.drain_and_replay("u1");
        assert_eq!(first.requeued, 1);
        let second = replayer.drain_and_replay("u1");
        assert_eq!(second.dead_lettered, 1);

        assert!(queue.is_empty());
        let letters = replayer.dead_letters();
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].mutation.collection_id(), "c1");
        assert_eq!(letters[0].attempts, 2);
    }

    #[test]
    fn dead_letter_buffer_is_bounded() {
        let remote = Arc::new(MockRemoteStore::new());
        let retry = RetryConfig::new(1).with_dead_letter_capacity(2);
        let (queue, replayer) = replayer(&remote, retry);

        for id in ["c1", "c2", "c3"] {
            remote.fail_times(id, 10);
            queue.enqueue(create(id));
        }
        replayer.drain_and_replay("u1");

        let letters = replayer.dead_letters();
        assert_eq!(letters.len(), 2);
        assert_eq!(letters[0].mutation.collection_id(), "c2");
        assert_eq!(letters[1].mutation.collection_id(), "c3");
    }

    #[test]
    fn concurrent_drains_never_double_apply() {
        let remote = Arc::new(MockRemoteStore::new());
        let stats = SharedStats::new();
        let queue = Arc::new(MutationQueue::new(1000, stats.clone()));
        let replayer = Arc::new(MutationReplayer::new(
            Arc::clone(&remote),
            Arc::clone(&queue),
            RetryConfig::default(),
            stats,
        ));

        let ids: Vec<String> = (0..50).map(|i| format!("c{i}")).collect();
        for id in &ids {
            queue.enqueue(create(id));
        }

        let mut handles = Vec::new();
        for _ in 0..2 {
            let replayer = Arc::clone(&replayer);
            handles.push(thread::spawn(move || replayer.drain_and_replay("u1")));
        }
        let total_applied: u64 = handles
            .into_iter()
            .map(|h| h.join().unwrap().applied)
            .sum();

        assert_eq!(total_applied, 50);
        for id in &ids {
            assert_eq!(remote.apply_count("create", id), 1);
        }
    }

    #[test]
    fn apply_now_routes_item_mutations_to_the_item_path() {
        let remote = Arc::new(MockRemoteStore::new());
        let (_queue, replayer) = replayer(&remote, RetryConfig::default());

        let mutation = Mutation::DeleteItem {
            collection_id: "c1".into(),
            item_id: "i1".into(),
        };
        replayer.apply_now("u1", &mutation).unwrap();
        assert_eq!(remote.apply_count("delete", "i1"), 1);
    }
}
