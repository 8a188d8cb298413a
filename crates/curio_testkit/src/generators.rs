//! Property-based generators using proptest.
//!
//! Strategies for random documents and mutations that maintain the
//! model's invariants.

use curio_model::{ActivityDoc, CollectionDoc, ItemDoc, Mutation};
use proptest::prelude::*;

/// Strategy for valid document IDs.
pub fn doc_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9]{4,20}").expect("Invalid regex")
}

/// Strategy for collection documents.
pub fn collection_doc_strategy() -> impl Strategy<Value = CollectionDoc> {
    (
        "[a-zA-Z ]{1,32}",
        "[a-z]{1,16}",
        0i64..2_000_000_000_000,
        0u32..10_000,
    )
        .prop_map(|(name, category, created_at_ms, item_count)| CollectionDoc {
            name,
            category,
            created_at_ms,
            item_count,
        })
}

/// Strategy for item documents.
pub fn item_doc_strategy() -> impl Strategy<Value = ItemDoc> {
    (
        "[a-zA-Z ]{1,32}",
        "[a-zA-Z ,.]{0,64}",
        0i64..2_000_000_000_000,
        prop::option::of(0i64..100_000_000),
    )
        .prop_map(
            |(name, notes, acquired_at_ms, estimated_value_cents)| ItemDoc {
                name,
                notes,
                acquired_at_ms,
                estimated_value_cents,
            },
        )
}

/// Strategy for activity entries.
pub fn activity_doc_strategy() -> impl Strategy<Value = ActivityDoc> {
    ("[a-zA-Z ]{1,64}", 0i64..2_000_000_000_000).prop_map(|(message, occurred_at_ms)| {
        ActivityDoc {
            message,
            occurred_at_ms,
        }
    })
}

/// Strategy for any mutation kind.
pub fn mutation_strategy() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        (doc_id_strategy(), collection_doc_strategy())
            .prop_map(|(collection_id, doc)| Mutation::CreateCollection { collection_id, doc }),
        (doc_id_strategy(), collection_doc_strategy())
            .prop_map(|(collection_id, doc)| Mutation::UpdateCollection { collection_id, doc }),
        doc_id_strategy().prop_map(|collection_id| Mutation::DeleteCollection { collection_id }),
        (doc_id_strategy(), doc_id_strategy(), item_doc_strategy()).prop_map(
            |(collection_id, item_id, doc)| Mutation::CreateItem {
                collection_id,
                item_id,
                doc,
            }
        ),
        (doc_id_strategy(), doc_id_strategy(), item_doc_strategy()).prop_map(
            |(collection_id, item_id, doc)| Mutation::UpdateItem {
                collection_id,
                item_id,
                doc,
            }
        ),
        (doc_id_strategy(), doc_id_strategy()).prop_map(|(collection_id, item_id)| {
            Mutation::DeleteItem {
                collection_id,
                item_id,
            }
        }),
    ]
}
