//! Fixture builders for documents, change events, and seeded stores.

use curio_model::{ActivityDoc, CollectionDoc, ItemDoc, RemoteChange};
use curio_store::{LocalCollection, LocalStore, MemoryStore};

/// A collection document with sensible defaults.
pub fn collection_doc(name: &str) -> CollectionDoc {
    CollectionDoc {
        name: name.to_string(),
        category: "misc".to_string(),
        created_at_ms: 1_700_000_000_000,
        item_count: 0,
    }
}

/// An item document with sensible defaults.
pub fn item_doc(name: &str) -> ItemDoc {
    ItemDoc {
        name: name.to_string(),
        notes: String::new(),
        acquired_at_ms: 1_700_000_000_000,
        estimated_value_cents: None,
    }
}

/// An activity entry at a specific time.
pub fn activity_doc(message: &str, occurred_at_ms: i64) -> ActivityDoc {
    ActivityDoc {
        message: message.to_string(),
        occurred_at_ms,
    }
}

/// An `Added` change carrying a default collection snapshot.
pub fn collection_added(doc_id: &str) -> RemoteChange {
    RemoteChange::added(doc_id, collection_doc(&doc_id.to_uppercase()).to_snapshot())
}

/// An `Added` change carrying a default item snapshot.
pub fn item_added(doc_id: &str) -> RemoteChange {
    RemoteChange::added(doc_id, item_doc(&doc_id.to_uppercase()).to_snapshot())
}

/// An `Added` change carrying an activity snapshot.
pub fn activity_added(doc_id: &str, occurred_at_ms: i64) -> RemoteChange {
    RemoteChange::added(
        doc_id,
        activity_doc(&format!("event {doc_id}"), occurred_at_ms).to_snapshot(),
    )
}

/// A memory store pre-populated with collections by document ID.
pub fn seeded_store(collection_ids: &[&str]) -> MemoryStore {
    let store = MemoryStore::new();
    for id in collection_ids {
        store
            .insert_collection(LocalCollection {
                doc_id: id.to_string(),
                doc: collection_doc(&id.to_uppercase()),
            })
            .expect("memory store insert cannot fail");
    }
    store
}
