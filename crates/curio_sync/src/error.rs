//! Error types for the sync engine.

use curio_model::ModelError;
use curio_store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
///
/// Nothing here is fatal to the process. Only `RateLimitExceeded` is
/// meant to travel up the call stack as an actionable error; the engine
/// logs and absorbs everything else.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The remote store rejected or failed an operation.
    #[error("remote store error: {message}")]
    Remote {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// Too many calls inside the sliding window.
    #[error("rate limit exceeded: {limit} calls per {window:?}")]
    RateLimitExceeded {
        /// Maximum calls allowed in the window.
        limit: u32,
        /// Length of the sliding window.
        window: Duration,
    },

    /// The local store failed.
    #[error("local store error: {0}")]
    Store(#[from] StoreError),

    /// A remote document snapshot failed to decode.
    #[error("malformed remote document: {0}")]
    MalformedDocument(#[from] ModelError),

    /// An operation was attempted on a stopped session.
    #[error("sync session is not started")]
    SessionNotStarted,
}

impl SyncError {
    /// Creates a retryable remote error.
    pub fn remote_retryable(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable remote error.
    pub fn remote_fatal(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if the failed operation can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Remote { retryable, .. } => *retryable,
            SyncError::RateLimitExceeded { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(SyncError::remote_retryable("connection reset").is_retryable());
        assert!(!SyncError::remote_fatal("permission denied").is_retryable());
        assert!(SyncError::RateLimitExceeded {
            limit: 10,
            window: Duration::from_secs(60),
        }
        .is_retryable());
        assert!(!SyncError::SessionNotStarted.is_retryable());
    }

    #[test]
    fn rate_limit_display_carries_hint_data() {
        let err = SyncError::RateLimitExceeded {
            limit: 10,
            window: Duration::from_secs(60),
        };
        let text = err.to_string();
        assert!(text.contains("10"));
        assert!(text.contains("60"));
    }

    #[test]
    fn malformed_document_wraps_model_error() {
        let err: SyncError = ModelError::missing("name").into();
        assert!(err.to_string().contains("name"));
        assert!(!err.is_retryable());
    }
}
