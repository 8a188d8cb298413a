//! Remote change events delivered by snapshot listeners.

use crate::snapshot::Snapshot;

/// Classification of one document change relative to the listener's
/// prior known state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    /// Document is new to this listener.
    Added,
    /// Document existed and its fields changed.
    Modified,
    /// Document was deleted.
    Removed,
}

/// A single document change from one listener callback.
///
/// Change events are transient: they exist for the duration of one
/// batch delivery and are never persisted. Only their reconciled
/// effect on the local store survives.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteChange {
    /// Remote document ID.
    pub doc_id: String,
    /// Type of change.
    pub change_type: ChangeType,
    /// Document snapshot at the time of the change. Empty for `Removed`.
    pub data: Snapshot,
}

impl RemoteChange {
    /// Creates an added event.
    pub fn added(doc_id: impl Into<String>, data: Snapshot) -> Self {
        Self {
            doc_id: doc_id.into(),
            change_type: ChangeType::Added,
            data,
        }
    }

    /// Creates a modified event.
    pub fn modified(doc_id: impl Into<String>, data: Snapshot) -> Self {
        Self {
            doc_id: doc_id.into(),
            change_type: ChangeType::Modified,
            data,
        }
    }

    /// Creates a removed event.
    pub fn removed(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            change_type: ChangeType::Removed,
            data: Snapshot::new(),
        }
    }
}
