//! In-memory local store.
//!
//! The reference [`LocalStore`] implementation and the test double.
//! Every operation takes the single table lock, which is the
//! serialization contract the sync engine relies on.

use crate::error::StoreResult;
use crate::store::LocalStore;
use crate::types::{LocalActivity, LocalCollection, LocalItem};
use curio_model::{CollectionDoc, ItemDoc};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Default cap on the activity feed.
pub const DEFAULT_ACTIVITY_CAP: usize = 50;

#[derive(Default)]
struct Tables {
    collections: HashMap<String, CollectionDoc>,
    // Items keyed by parent collection, then by document ID.
    items: HashMap<String, HashMap<String, ItemDoc>>,
    // Kept sorted by occurred_at_ms descending, truncated to the cap.
    activity: Vec<LocalActivity>,
    commits: u64,
}

/// An in-memory [`LocalStore`] with a single-lock access contract.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    activity_cap: usize,
}

impl MemoryStore {
    /// Creates an empty store with the default activity cap.
    pub fn new() -> Self {
        Self::with_activity_cap(DEFAULT_ACTIVITY_CAP)
    }

    /// Creates an empty store with a specific activity cap.
    pub fn with_activity_cap(activity_cap: usize) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            activity_cap,
        }
    }

    /// Number of `commit` calls so far. Test observability.
    pub fn commit_count(&self) -> u64 {
        self.tables.lock().commits
    }

    /// Total number of item rows across all collections.
    pub fn item_count(&self) -> usize {
        self.tables.lock().items.values().map(HashMap::len).sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStore for MemoryStore {
    fn get_collection(&self, doc_id: &str) -> StoreResult<Option<LocalCollection>> {
        let tables = self.tables.lock();
        Ok(tables.collections.get(doc_id).map(|doc| LocalCollection {
            doc_id: doc_id.to_string(),
            doc: doc.clone(),
        }))
    }

    fn list_collections(&self) -> StoreResult<Vec<LocalCollection>> {
        self.find_collections(&|_| true)
    }

    fn find_collections(
        &self,
        predicate: &dyn Fn(&LocalCollection) -> bool,
    ) -> StoreResult<Vec<LocalCollection>> {
        let tables = self.tables.lock();
        Ok(tables
            .collections
            .iter()
            .map(|(doc_id, doc)| LocalCollection {
                doc_id: doc_id.clone(),
                doc: doc.clone(),
            })
            .filter(|row| predicate(row))
            .collect())
    }

    fn insert_collection(&self, row: LocalCollection) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        tables.collections.insert(row.doc_id, row.doc);
        Ok(())
    }

    fn update_collection(&self, doc_id: &str, doc: CollectionDoc) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if let Some(existing) = tables.collections.get_mut(doc_id) {
            *existing = doc;
        }
        Ok(())
    }

    fn delete_collection(&self, doc_id: &str) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        tables.collections.remove(doc_id);
        tables.items.remove(doc_id);
        Ok(())
    }

    fn get_item(&self, collection_id: &str, doc_id: &str) -> StoreResult<Option<LocalItem>> {
        let tables = self.tables.lock();
        Ok(tables
            .items
            .get(collection_id)
            .and_then(|items| items.get(doc_id))
            .map(|doc| LocalItem {
                collection_id: collection_id.to_string(),
                doc_id: doc_id.to_string(),
                doc: doc.clone(),
            }))
    }

    fn items_in_collection(&self, collection_id: &str) -> StoreResult<Vec<LocalItem>> {
        let tables = self.tables.lock();
        Ok(tables
            .items
            .get(collection_id)
            .map(|items| {
                items
                    .iter()
                    .map(|(doc_id, doc)| LocalItem {
                        collection_id: collection_id.to_string(),
                        doc_id: doc_id.clone(),
                        doc: doc.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn insert_item(&self, row: LocalItem) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        tables
            .items
            .entry(row.collection_id)
            .or_default()
            .insert(row.doc_id, row.doc);
        Ok(())
    }

    fn update_item(&self, collection_id: &str, doc_id: &str, doc: ItemDoc) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if let Some(existing) = tables
            .items
            .get_mut(collection_id)
            .and_then(|items| items.get_mut(doc_id))
        {
            *existing = doc;
        }
        Ok(())
    }

    fn delete_item(&self, collection_id: &str, doc_id: &str) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if let Some(items) = tables.items.get_mut(collection_id) {
            items.remove(doc_id);
        }
        Ok(())
    }

    fn get_activity(&self, doc_id: &str) -> StoreResult<Option<LocalActivity>> {
        let tables = self.tables.lock();
        Ok(tables
            .activity
            .iter()
            .find(|row| row.doc_id == doc_id)
            .cloned())
    }

    fn activity_feed(&self) -> StoreResult<Vec<LocalActivity>> {
        Ok(self.tables.lock().activity.clone())
    }

    fn insert_activity(&self, row: LocalActivity) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        tables.activity.push(row);
        tables
            .activity
            .sort_by(|a, b| b.doc.occurred_at_ms.cmp(&a.doc.occurred_at_ms));
        tables.activity.truncate(self.activity_cap);
        Ok(())
    }

    fn commit(&self) -> StoreResult<()> {
        self.tables.lock().commits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curio_model::ActivityDoc;

    fn collection(name: &str) -> CollectionDoc {
        CollectionDoc {
            name: name.into(),
            category: "misc".into(),
            created_at_ms: 0,
            item_count: 0,
        }
    }

    fn item(name: &str) -> ItemDoc {
        ItemDoc {
            name: name.into(),
            notes: String::new(),
            acquired_at_ms: 0,
            estimated_value_cents: None,
        }
    }

    fn activity(doc_id: &str, at: i64) -> LocalActivity {
        LocalActivity {
            doc_id: doc_id.into(),
            doc: ActivityDoc {
                message: format!("event {doc_id}"),
                occurred_at_ms: at,
            },
        }
    }

    #[test]
    fn collection_crud() {
        let store = MemoryStore::new();
        assert!(store.get_collection("c1").unwrap().is_none());

        store
            .insert_collection(LocalCollection {
                doc_id: "c1".into(),
                doc: collection("Stamps"),
            })
            .unwrap();
        assert_eq!(
            store.get_collection("c1").unwrap().unwrap().doc.name,
            "Stamps"
        );

        store.update_collection("c1", collection("Rare Stamps")).unwrap();
        assert_eq!(
            store.get_collection("c1").unwrap().unwrap().doc.name,
            "Rare Stamps"
        );

        store.delete_collection("c1").unwrap();
        assert!(store.get_collection("c1").unwrap().is_none());
    }

    #[test]
    fn update_absent_collection_is_noop() {
        let store = MemoryStore::new();
        store.update_collection("ghost", collection("x")).unwrap();
        assert!(store.list_collections().unwrap().is_empty());
    }

    #[test]
    fn deleting_collection_cascades_items() {
        let store = MemoryStore::new();
        store
            .insert_collection(LocalCollection {
                doc_id: "c1".into(),
                doc: collection("Coins"),
            })
            .unwrap();
        store
            .insert_item(LocalItem {
                collection_id: "c1".into(),
                doc_id: "i1".into(),
                doc: item("Denarius"),
            })
            .unwrap();
        assert_eq!(store.item_count(), 1);

        store.delete_collection("c1").unwrap();
        assert_eq!(store.item_count(), 0);
        assert!(store.items_in_collection("c1").unwrap().is_empty());
    }

    #[test]
    fn find_collections_by_predicate() {
        let store = MemoryStore::new();
        for (id, cat) in [("c1", "coins"), ("c2", "stamps"), ("c3", "coins")] {
            store
                .insert_collection(LocalCollection {
                    doc_id: id.into(),
                    doc: CollectionDoc {
                        category: cat.into(),
                        ..collection(id)
                    },
                })
                .unwrap();
        }

        let coins = store
            .find_collections(&|row| row.doc.category == "coins")
            .unwrap();
        assert_eq!(coins.len(), 2);
    }

    #[test]
    fn activity_feed_is_capped_and_ordered() {
        let store = MemoryStore::with_activity_cap(3);
        for i in 0..5 {
            store.insert_activity(activity(&format!("a{i}"), i)).unwrap();
        }

        let feed = store.activity_feed().unwrap();
        assert_eq!(feed.len(), 3);
        // Newest first: timestamps 4, 3, 2 survive.
        assert_eq!(feed[0].doc.occurred_at_ms, 4);
        assert_eq!(feed[1].doc.occurred_at_ms, 3);
        assert_eq!(feed[2].doc.occurred_at_ms, 2);
    }

    #[test]
    fn activity_out_of_order_insert_keeps_descending_order() {
        let store = MemoryStore::new();
        store.insert_activity(activity("a1", 10)).unwrap();
        store.insert_activity(activity("a2", 30)).unwrap();
        store.insert_activity(activity("a3", 20)).unwrap();

        let feed = store.activity_feed().unwrap();
        let times: Vec<i64> = feed.iter().map(|r| r.doc.occurred_at_ms).collect();
        assert_eq!(times, vec![30, 20, 10]);
    }

    #[test]
    fn commit_is_counted() {
        let store = MemoryStore::new();
        assert_eq!(store.commit_count(), 0);
        store.commit().unwrap();
        store.commit().unwrap();
        assert_eq!(store.commit_count(), 2);
    }
}
