//! Error types for the local store.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in a local store backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The underlying backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A commit/persist call failed.
    #[error("commit failed: {0}")]
    CommitFailed(String),
}
