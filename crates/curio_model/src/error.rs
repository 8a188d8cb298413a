//! Error types for document decoding.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors produced while decoding remote document snapshots.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A required field was absent from the snapshot.
    #[error("missing field `{0}` in document snapshot")]
    MissingField(String),

    /// A field was present but had the wrong type or an invalid value.
    #[error("invalid field `{field}`: expected {expected}")]
    InvalidField {
        /// Name of the offending field.
        field: String,
        /// Description of the expected shape.
        expected: &'static str,
    },
}

impl ModelError {
    /// Creates a missing-field error.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Creates an invalid-field error.
    pub fn invalid(field: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidField {
            field: field.into(),
            expected,
        }
    }
}
