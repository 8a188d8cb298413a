//! Typed documents for the three mirrored entity kinds.
//!
//! Each document decodes from a [`Snapshot`] with field-level errors and
//! encodes back to one. Encode/decode is total over the typed side: any
//! document produced by `to_snapshot` round-trips through `from_snapshot`.

use crate::error::ModelResult;
use crate::snapshot::{
    optional_i64_field, require_i64_field, require_str_field, require_u32_field, Snapshot,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A user's collection of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDoc {
    /// Display name of the collection.
    pub name: String,
    /// Free-form category (e.g. "coins", "vinyl").
    pub category: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at_ms: i64,
    /// Denormalized count of items in the collection.
    pub item_count: u32,
}

impl CollectionDoc {
    /// Decodes a collection document from a remote snapshot.
    pub fn from_snapshot(snapshot: &Snapshot) -> ModelResult<Self> {
        Ok(Self {
            name: require_str_field(snapshot, "name")?,
            category: require_str_field(snapshot, "category")?,
            created_at_ms: require_i64_field(snapshot, "created_at_ms")?,
            item_count: require_u32_field(snapshot, "item_count")?,
        })
    }

    /// Encodes this document as a remote snapshot.
    pub fn to_snapshot(&self) -> Snapshot {
        let mut map = Snapshot::new();
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert("category".into(), Value::String(self.category.clone()));
        map.insert("created_at_ms".into(), Value::from(self.created_at_ms));
        map.insert("item_count".into(), Value::from(self.item_count));
        map
    }
}

/// A single item inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDoc {
    /// Display name of the item.
    pub name: String,
    /// Owner-entered notes.
    pub notes: String,
    /// Acquisition time, milliseconds since the Unix epoch.
    pub acquired_at_ms: i64,
    /// Estimated value in cents, if appraised.
    pub estimated_value_cents: Option<i64>,
}

impl ItemDoc {
    /// Decodes an item document from a remote snapshot.
    pub fn from_snapshot(snapshot: &Snapshot) -> ModelResult<Self> {
        Ok(Self {
            name: require_str_field(snapshot, "name")?,
            notes: require_str_field(snapshot, "notes")?,
            acquired_at_ms: require_i64_field(snapshot, "acquired_at_ms")?,
            estimated_value_cents: optional_i64_field(snapshot, "estimated_value_cents")?,
        })
    }

    /// Encodes this document as a remote snapshot.
    pub fn to_snapshot(&self) -> Snapshot {
        let mut map = Snapshot::new();
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert("notes".into(), Value::String(self.notes.clone()));
        map.insert("acquired_at_ms".into(), Value::from(self.acquired_at_ms));
        map.insert(
            "estimated_value_cents".into(),
            self.estimated_value_cents.map(Value::from).unwrap_or(Value::Null),
        );
        map
    }
}

/// One entry in the user's activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDoc {
    /// Human-readable description of what happened.
    pub message: String,
    /// Event time, milliseconds since the Unix epoch.
    pub occurred_at_ms: i64,
}

impl ActivityDoc {
    /// Decodes an activity entry from a remote snapshot.
    pub fn from_snapshot(snapshot: &Snapshot) -> ModelResult<Self> {
        Ok(Self {
            message: require_str_field(snapshot, "message")?,
            occurred_at_ms: require_i64_field(snapshot, "occurred_at_ms")?,
        })
    }

    /// Encodes this entry as a remote snapshot.
    pub fn to_snapshot(&self) -> Snapshot {
        let mut map = Snapshot::new();
        map.insert("message".into(), Value::String(self.message.clone()));
        map.insert("occurred_at_ms".into(), Value::from(self.occurred_at_ms));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;

    #[test]
    fn collection_round_trip() {
        let doc = CollectionDoc {
            name: "Stamps".into(),
            category: "philately".into(),
            created_at_ms: 1_700_000_000_000,
            item_count: 12,
        };
        let decoded = CollectionDoc::from_snapshot(&doc.to_snapshot()).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn collection_missing_field() {
        let mut snap = CollectionDoc {
            name: "Stamps".into(),
            category: "philately".into(),
            created_at_ms: 0,
            item_count: 0,
        }
        .to_snapshot();
        snap.remove("category");

        let err = CollectionDoc::from_snapshot(&snap).unwrap_err();
        assert_eq!(err, ModelError::missing("category"));
    }

    #[test]
    fn item_round_trip_with_and_without_value() {
        let appraised = ItemDoc {
            name: "Penny Black".into(),
            notes: "minor wear".into(),
            acquired_at_ms: 1_650_000_000_000,
            estimated_value_cents: Some(250_000),
        };
        assert_eq!(
            ItemDoc::from_snapshot(&appraised.to_snapshot()).unwrap(),
            appraised
        );

        let unappraised = ItemDoc {
            estimated_value_cents: None,
            ..appraised
        };
        assert_eq!(
            ItemDoc::from_snapshot(&unappraised.to_snapshot()).unwrap(),
            unappraised
        );
    }

    #[test]
    fn activity_decode_rejects_wrong_type() {
        let mut snap = ActivityDoc {
            message: "Added Penny Black".into(),
            occurred_at_ms: 5,
        }
        .to_snapshot();
        snap.insert("occurred_at_ms".into(), serde_json::Value::String("5".into()));

        assert!(ActivityDoc::from_snapshot(&snap).is_err());
    }
}
