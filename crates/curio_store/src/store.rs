//! The local store trait.

use crate::error::StoreResult;
use crate::types::{LocalActivity, LocalCollection, LocalItem};
use curio_model::{CollectionDoc, ItemDoc};

/// The local persistent store all sync write paths serialize through.
///
/// Lookup is by remote document ID. Update methods overwrite in place
/// when the row is present and are silent no-ops when it is absent;
/// callers that need create-vs-update semantics check existence first.
pub trait LocalStore: Send + Sync {
    /// Fetches a collection by document ID.
    fn get_collection(&self, doc_id: &str) -> StoreResult<Option<LocalCollection>>;

    /// Returns all collections, in unspecified order.
    fn list_collections(&self) -> StoreResult<Vec<LocalCollection>>;

    /// Returns collections matching a predicate.
    fn find_collections(
        &self,
        predicate: &dyn Fn(&LocalCollection) -> bool,
    ) -> StoreResult<Vec<LocalCollection>>;

    /// Inserts a collection row.
    fn insert_collection(&self, row: LocalCollection) -> StoreResult<()>;

    /// Overwrites the fields of an existing collection.
    fn update_collection(&self, doc_id: &str, doc: CollectionDoc) -> StoreResult<()>;

    /// Deletes a collection and every item under it.
    fn delete_collection(&self, doc_id: &str) -> StoreResult<()>;

    /// Fetches an item by collection and document ID.
    fn get_item(&self, collection_id: &str, doc_id: &str) -> StoreResult<Option<LocalItem>>;

    /// Returns all items in a collection, in unspecified order.
    fn items_in_collection(&self, collection_id: &str) -> StoreResult<Vec<LocalItem>>;

    /// Inserts an item row.
    fn insert_item(&self, row: LocalItem) -> StoreResult<()>;

    /// Overwrites the fields of an existing item.
    fn update_item(&self, collection_id: &str, doc_id: &str, doc: ItemDoc) -> StoreResult<()>;

    /// Deletes an item.
    fn delete_item(&self, collection_id: &str, doc_id: &str) -> StoreResult<()>;

    /// Fetches an activity entry by document ID.
    fn get_activity(&self, doc_id: &str) -> StoreResult<Option<LocalActivity>>;

    /// Returns the activity feed, newest first, capped by the store.
    fn activity_feed(&self) -> StoreResult<Vec<LocalActivity>>;

    /// Inserts an activity entry, preserving the feed's order and cap.
    fn insert_activity(&self, row: LocalActivity) -> StoreResult<()>;

    /// Persists outstanding changes.
    fn commit(&self) -> StoreResult<()>;
}
