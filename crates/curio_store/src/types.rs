//! Local row types, keyed by remote document ID.
//!
//! The document ID is the identity mapping between a remote document
//! and its local record; existence checks against it are the
//! idempotence guard used by the mirror.

use curio_model::{ActivityDoc, CollectionDoc, ItemDoc};

/// A locally materialized collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCollection {
    /// Remote document ID.
    pub doc_id: String,
    /// Collection fields.
    pub doc: CollectionDoc,
}

/// A locally materialized item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalItem {
    /// Parent collection document ID.
    pub collection_id: String,
    /// Remote document ID.
    pub doc_id: String,
    /// Item fields.
    pub doc: ItemDoc,
}

/// A locally materialized activity entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalActivity {
    /// Remote document ID.
    pub doc_id: String,
    /// Activity fields.
    pub doc: ActivityDoc,
}
