//! Reconciliation of remote change batches into the local store.
//!
//! Each listener delivers batches in its own order; the mirror applies
//! one batch at a time, change by change, idempotently:
//!
//! - `Added` for a known document is a no-op (duplicate initial
//!   snapshots redeliver)
//! - `Modified` for an unknown document is dropped, never a create
//! - `Removed` for an unknown document is a no-op
//!
//! A malformed snapshot skips that single change; the rest of the
//! batch still applies. Store failures are logged and absorbed; a
//! listener callback never panics or propagates.

use crate::stats::SharedStats;
use curio_model::{ActivityDoc, ChangeType, CollectionDoc, ItemDoc, RemoteChange};
use curio_store::{LocalActivity, LocalCollection, LocalItem, LocalStore};
use std::sync::Arc;
use tracing::{debug, warn};

/// Applies remote change batches to the local store.
pub struct RemoteMirror<S: LocalStore> {
    store: Arc<S>,
    stats: SharedStats,
}

impl<S: LocalStore> RemoteMirror<S> {
    /// Creates a mirror writing to `store`.
    pub fn new(store: Arc<S>, stats: SharedStats) -> Self {
        Self { store, stats }
    }

    /// The local store this mirror writes to.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Applies one collections change batch.
    ///
    /// Returns the document ID of every `Added` collection in the
    /// batch that is locally materialized afterwards, duplicates
    /// included: the session attaches an items listener for each
    /// (listener fan-out), and after a listener restart the local row
    /// already exists while the listener does not.
    pub fn apply_collection_changes(&self, batch: &[RemoteChange]) -> Vec<String> {
        let mut added = Vec::new();
        for change in batch {
            match change.change_type {
                ChangeType::Added => {
                    if self.collection_exists(&change.doc_id) {
                        debug!(doc_id = %change.doc_id, "duplicate collection added, skipping");
                        self.stats.record_change_skipped();
                        added.push(change.doc_id.clone());
                        continue;
                    }
                    let doc = match CollectionDoc::from_snapshot(&change.data) {
                        Ok(doc) => doc,
                        Err(err) => {
                            self.skip_malformed("collection", &change.doc_id, &err);
                            continue;
                        }
                    };
                    self.absorb(self.store.insert_collection(LocalCollection {
                        doc_id: change.doc_id.clone(),
                        doc,
                    }));
                    self.stats.record_change_applied();
                    added.push(change.doc_id.clone());
                }
                ChangeType::Modified => {
                    if !self.collection_exists(&change.doc_id) {
                        debug!(doc_id = %change.doc_id, "modified unknown collection, dropping");
                        self.stats.record_change_skipped();
                        continue;
                    }
                    match CollectionDoc::from_snapshot(&change.data) {
                        Ok(doc) => {
                            self.absorb(self.store.update_collection(&change.doc_id, doc));
                            self.stats.record_change_applied();
                        }
                        Err(err) => self.skip_malformed("collection", &change.doc_id, &err),
                    }
                }
                ChangeType::Removed => {
                    if self.collection_exists(&change.doc_id) {
                        self.absorb(self.store.delete_collection(&change.doc_id));
                        self.stats.record_change_applied();
                    } else {
                        self.stats.record_change_skipped();
                    }
                }
            }
        }
        self.commit();
        added
    }

    /// Applies one items change batch for a collection.
    ///
    /// An item `Added` whose parent collection is not locally
    /// materialized is dropped; the remote store gives no ordering
    /// guarantee across listeners, so item changes can overtake their
    /// parent collection's `Added`.
    pub fn apply_item_changes(&self, collection_id: &str, batch: &[RemoteChange]) {
        for change in batch {
            match change.change_type {
                ChangeType::Added => {
                    if !self.collection_exists(collection_id) {
                        warn!(
                            collection_id,
                            doc_id = %change.doc_id,
                            "item change arrived before its parent collection, dropping"
                        );
                        self.stats.record_change_skipped();
                        continue;
                    }
                    if self.item_exists(collection_id, &change.doc_id) {
                        debug!(doc_id = %change.doc_id, "duplicate item added, skipping");
                        self.stats.record_change_skipped();
                        continue;
                    }
                    match ItemDoc::from_snapshot(&change.data) {
                        Ok(doc) => {
                            self.absorb(self.store.insert_item(LocalItem {
                                collection_id: collection_id.to_string(),
                                doc_id: change.doc_id.clone(),
                                doc,
                            }));
                            self.stats.record_change_applied();
                        }
                        Err(err) => self.skip_malformed("item", &change.doc_id, &err),
                    }
                }
                ChangeType::Modified => {
                    if !self.item_exists(collection_id, &change.doc_id) {
                        debug!(doc_id = %change.doc_id, "modified unknown item, dropping");
                        self.stats.record_change_skipped();
                        continue;
                    }
                    match ItemDoc::from_snapshot(&change.data) {
                        Ok(doc) => {
                            self.absorb(self.store.update_item(collection_id, &change.doc_id, doc));
                            self.stats.record_change_applied();
                        }
                        Err(err) => self.skip_malformed("item", &change.doc_id, &err),
                    }
                }
                ChangeType::Removed => {
                    if self.item_exists(collection_id, &change.doc_id) {
                        self.absorb(self.store.delete_item(collection_id, &change.doc_id));
                        self.stats.record_change_applied();
                    } else {
                        self.stats.record_change_skipped();
                    }
                }
            }
        }
        self.commit();
    }

    /// Applies one activity change batch.
    ///
    /// Only `Added` events are processed; the feed is append-only from
    /// the mirror's perspective, and the store keeps it ordered newest
    /// first and capped.
    pub fn apply_activity_changes(&self, batch: &[RemoteChange]) {
        for change in batch {
            match change.change_type {
                ChangeType::Added => {
                    if self.activity_exists(&change.doc_id) {
                        self.stats.record_change_skipped();
                        continue;
                    }
                    match ActivityDoc::from_snapshot(&change.data) {
                        Ok(doc) => {
                            self.absorb(self.store.insert_activity(LocalActivity {
                                doc_id: change.doc_id.clone(),
                                doc,
                            }));
                            self.stats.record_change_applied();
                        }
                        Err(err) => self.skip_malformed("activity", &change.doc_id, &err),
                    }
                }
                ChangeType::Modified | ChangeType::Removed => {
                    // Ignored by design for the activity feed.
                    self.stats.record_change_skipped();
                }
            }
        }
        self.commit();
    }

    fn collection_exists(&self, doc_id: &str) -> bool {
        matches!(self.store.get_collection(doc_id), Ok(Some(_)))
    }

    fn item_exists(&self, collection_id: &str, doc_id: &str) -> bool {
        matches!(self.store.get_item(collection_id, doc_id), Ok(Some(_)))
    }

    fn activity_exists(&self, doc_id: &str) -> bool {
        matches!(self.store.get_activity(doc_id), Ok(Some(_)))
    }

    fn skip_malformed(&self, kind: &str, doc_id: &str, err: &curio_model::ModelError) {
        warn!(kind, doc_id, %err, "malformed remote document, skipping change");
        self.stats.record_change_skipped();
        self.stats.record_error(err.to_string());
    }

    fn absorb(&self, result: curio_store::StoreResult<()>) {
        if let Err(err) = result {
            warn!(%err, "local store write failed, absorbing");
            self.stats.record_error(err.to_string());
        }
    }

    fn commit(&self) {
        if let Err(err) = self.store.commit() {
            warn!(%err, "local store commit failed, absorbing");
            self.stats.record_error(err.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curio_model::Snapshot;
    use curio_store::MemoryStore;

    fn mirror() -> RemoteMirror<MemoryStore> {
        RemoteMirror::new(Arc::new(MemoryStore::new()), SharedStats::new())
    }

    fn collection_snapshot(name: &str) -> Snapshot {
        CollectionDoc {
            name: name.into(),
            category: "misc".into(),
            created_at_ms: 1_000,
            item_count: 0,
        }
        .to_snapshot()
    }

    fn item_snapshot(name: &str) -> Snapshot {
        ItemDoc {
            name: name.into(),
            notes: String::new(),
            acquired_at_ms: 2_000,
            estimated_value_cents: None,
        }
        .to_snapshot()
    }

    fn activity_snapshot(message: &str, at: i64) -> Snapshot {
        ActivityDoc {
            message: message.into(),
            occurred_at_ms: at,
        }
        .to_snapshot()
    }

    #[test]
    fn added_is_idempotent_under_duplicate_delivery() {
        let mirror = mirror();
        let batch = vec![RemoteChange::added("c1", collection_snapshot("Stamps"))];

        let first = mirror.apply_collection_changes(&batch);
        assert_eq!(first, vec!["c1".to_string()]);

        // Redelivered initial snapshot: the row is untouched, but the
        // fan-out target is still reported so a restarted session can
        // re-attach its item listener.
        let second = mirror.apply_collection_changes(&batch);
        assert_eq!(second, vec!["c1".to_string()]);
        assert_eq!(mirror.store().list_collections().unwrap().len(), 1);
    }

    #[test]
    fn modified_unknown_document_leaves_store_unchanged() {
        let mirror = mirror();
        mirror.apply_collection_changes(&[RemoteChange::modified(
            "ghost",
            collection_snapshot("Ghost"),
        )]);
        assert!(mirror.store().list_collections().unwrap().is_empty());
    }

    #[test]
    fn removed_unknown_document_is_a_noop() {
        let mirror = mirror();
        mirror.apply_collection_changes(&[RemoteChange::removed("ghost")]);
        assert!(mirror.store().list_collections().unwrap().is_empty());
    }

    #[test]
    fn modified_overwrites_fields_last_write_wins() {
        let mirror = mirror();
        mirror.apply_collection_changes(&[RemoteChange::added("c1", collection_snapshot("Old"))]);
        mirror
            .apply_collection_changes(&[RemoteChange::modified("c1", collection_snapshot("New"))]);

        assert_eq!(
            mirror.store().get_collection("c1").unwrap().unwrap().doc.name,
            "New"
        );
    }

    #[test]
    fn malformed_change_is_skipped_rest_of_batch_applies() {
        let mirror = mirror();
        let mut bad = collection_snapshot("Bad");
        bad.remove("name");

        mirror.apply_collection_changes(&[
            RemoteChange::added("c1", collection_snapshot("Good")),
            RemoteChange::added("c2", bad),
            RemoteChange::added("c3", collection_snapshot("AlsoGood")),
        ]);

        let store = mirror.store();
        assert!(store.get_collection("c1").unwrap().is_some());
        assert!(store.get_collection("c2").unwrap().is_none());
        assert!(store.get_collection("c3").unwrap().is_some());
    }

    #[test]
    fn item_added_lands_under_materialized_parent() {
        let mirror = mirror();
        mirror.apply_collection_changes(&[RemoteChange::added("c1", collection_snapshot("Coins"))]);
        mirror.apply_item_changes("c1", &[RemoteChange::added("i1", item_snapshot("Denarius"))]);

        let item = mirror.store().get_item("c1", "i1").unwrap().unwrap();
        assert_eq!(item.doc.name, "Denarius");
    }

    #[test]
    fn orphan_item_change_is_dropped_not_reparented() {
        // Cross-listener ordering is not guaranteed by the remote
        // store: an items batch can overtake its parent collection's
        // Added. The mirror drops the orphan rather than inventing a
        // parent.
        let mirror = mirror();
        mirror.apply_item_changes("c1", &[RemoteChange::added("i1", item_snapshot("Early"))]);
        assert!(mirror.store().get_item("c1", "i1").unwrap().is_none());

        // Once the parent materializes, a redelivered item applies.
        mirror.apply_collection_changes(&[RemoteChange::added("c1", collection_snapshot("Coins"))]);
        mirror.apply_item_changes("c1", &[RemoteChange::added("i1", item_snapshot("Early"))]);
        assert!(mirror.store().get_item("c1", "i1").unwrap().is_some());
    }

    #[test]
    fn activity_processes_added_only() {
        let mirror = mirror();
        mirror.apply_activity_changes(&[
            RemoteChange::added("a1", activity_snapshot("created Coins", 10)),
            RemoteChange::modified("a1", activity_snapshot("edited", 20)),
            RemoteChange::removed("a1"),
        ]);

        let feed = mirror.store().activity_feed().unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].doc.message, "created Coins");
    }

    #[test]
    fn duplicate_activity_added_is_skipped() {
        let mirror = mirror();
        let batch = vec![RemoteChange::added("a1", activity_snapshot("x", 10))];
        mirror.apply_activity_changes(&batch);
        mirror.apply_activity_changes(&batch);
        assert_eq!(mirror.store().activity_feed().unwrap().len(), 1);
    }

    #[test]
    fn batches_commit_once() {
        let mirror = mirror();
        mirror.apply_collection_changes(&[
            RemoteChange::added("c1", collection_snapshot("A")),
            RemoteChange::added("c2", collection_snapshot("B")),
        ]);
        assert_eq!(mirror.store().commit_count(), 1);
    }
}
