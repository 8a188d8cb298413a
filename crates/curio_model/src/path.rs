//! User-scoped remote collection paths.

use std::fmt;

/// A path to one remote collection, always scoped to a user.
///
/// Paths are constructed here rather than concatenated at call sites so
/// the engine, the remote-store seam, and tests agree on the layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RemotePath {
    /// `users/{uid}/collections`
    Collections {
        /// User ID.
        user_id: String,
    },
    /// `users/{uid}/collections/{cid}/items`
    Items {
        /// User ID.
        user_id: String,
        /// Parent collection document ID.
        collection_id: String,
    },
    /// `users/{uid}/activity`
    Activity {
        /// User ID.
        user_id: String,
    },
}

impl RemotePath {
    /// Path to a user's collections.
    pub fn collections(user_id: impl Into<String>) -> Self {
        Self::Collections {
            user_id: user_id.into(),
        }
    }

    /// Path to the items of one collection.
    pub fn items(user_id: impl Into<String>, collection_id: impl Into<String>) -> Self {
        Self::Items {
            user_id: user_id.into(),
            collection_id: collection_id.into(),
        }
    }

    /// Path to a user's activity feed.
    pub fn activity(user_id: impl Into<String>) -> Self {
        Self::Activity {
            user_id: user_id.into(),
        }
    }

    /// The user this path is scoped to.
    pub fn user_id(&self) -> &str {
        match self {
            RemotePath::Collections { user_id }
            | RemotePath::Items { user_id, .. }
            | RemotePath::Activity { user_id } => user_id,
        }
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemotePath::Collections { user_id } => write!(f, "users/{user_id}/collections"),
            RemotePath::Items {
                user_id,
                collection_id,
            } => write!(f, "users/{user_id}/collections/{collection_id}/items"),
            RemotePath::Activity { user_id } => write!(f, "users/{user_id}/activity"),
        }
    }
}
