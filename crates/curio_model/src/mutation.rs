//! Local mutations queued while offline.
//!
//! `Mutation` is a tagged union with one strongly typed payload per
//! kind; there are no dynamically typed dictionaries anywhere in the
//! queue path. The serde derive gives the payloads a stable schema.

use crate::document::{CollectionDoc, ItemDoc};
use crate::snapshot::now_ms;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A local mutation awaiting replay against the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    /// Create a collection document.
    CreateCollection {
        /// Remote document ID for the new collection.
        collection_id: String,
        /// Collection contents.
        doc: CollectionDoc,
    },
    /// Overwrite a collection document.
    UpdateCollection {
        /// Remote document ID.
        collection_id: String,
        /// New collection contents (last-write-wins).
        doc: CollectionDoc,
    },
    /// Delete a collection document.
    DeleteCollection {
        /// Remote document ID.
        collection_id: String,
    },
    /// Create an item document inside a collection.
    CreateItem {
        /// Parent collection document ID.
        collection_id: String,
        /// Remote document ID for the new item.
        item_id: String,
        /// Item contents.
        doc: ItemDoc,
    },
    /// Overwrite an item document.
    UpdateItem {
        /// Parent collection document ID.
        collection_id: String,
        /// Remote document ID.
        item_id: String,
        /// New item contents (last-write-wins).
        doc: ItemDoc,
    },
    /// Delete an item document.
    DeleteItem {
        /// Parent collection document ID.
        collection_id: String,
        /// Remote document ID.
        item_id: String,
    },
}

impl Mutation {
    /// Short name of the mutation kind, for logging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Mutation::CreateCollection { .. } => "create_collection",
            Mutation::UpdateCollection { .. } => "update_collection",
            Mutation::DeleteCollection { .. } => "delete_collection",
            Mutation::CreateItem { .. } => "create_item",
            Mutation::UpdateItem { .. } => "update_item",
            Mutation::DeleteItem { .. } => "delete_item",
        }
    }

    /// The collection document ID this mutation touches.
    pub fn collection_id(&self) -> &str {
        match self {
            Mutation::CreateCollection { collection_id, .. }
            | Mutation::UpdateCollection { collection_id, .. }
            | Mutation::DeleteCollection { collection_id }
            | Mutation::CreateItem { collection_id, .. }
            | Mutation::UpdateItem { collection_id, .. }
            | Mutation::DeleteItem { collection_id, .. } => collection_id,
        }
    }
}

/// A mutation plus its queue bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMutation {
    /// Opaque identifier, unique per enqueue.
    pub id: Uuid,
    /// The mutation payload.
    pub mutation: Mutation,
    /// When the mutation was first enqueued, milliseconds since epoch.
    pub enqueued_at_ms: i64,
    /// How many replay attempts have failed so far.
    pub attempts: u32,
}

impl PendingMutation {
    /// Wraps a mutation for queueing, stamped with the current time.
    pub fn new(mutation: Mutation) -> Self {
        Self {
            id: Uuid::new_v4(),
            mutation,
            enqueued_at_ms: now_ms(),
            attempts: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_collection() -> CollectionDoc {
        CollectionDoc {
            name: "Coins".into(),
            category: "numismatics".into(),
            created_at_ms: 1_700_000_000_000,
            item_count: 0,
        }
    }

    #[test]
    fn kind_names() {
        let m = Mutation::CreateCollection {
            collection_id: "c1".into(),
            doc: sample_collection(),
        };
        assert_eq!(m.kind_name(), "create_collection");
        assert_eq!(m.collection_id(), "c1");

        let m = Mutation::DeleteItem {
            collection_id: "c1".into(),
            item_id: "i1".into(),
        };
        assert_eq!(m.kind_name(), "delete_item");
    }

    #[test]
    fn pending_mutations_get_distinct_ids() {
        let a = PendingMutation::new(Mutation::DeleteCollection {
            collection_id: "c1".into(),
        });
        let b = PendingMutation::new(Mutation::DeleteCollection {
            collection_id: "c1".into(),
        });
        assert_ne!(a.id, b.id);
        assert_eq!(a.attempts, 0);
    }

    #[test]
    fn serde_schema_is_tagged() {
        let m = Mutation::DeleteCollection {
            collection_id: "c1".into(),
        };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["kind"], "delete_collection");
        assert_eq!(json["collection_id"], "c1");

        let back: Mutation = serde_json::from_value(json).unwrap();
        assert_eq!(back, m);
    }
}
