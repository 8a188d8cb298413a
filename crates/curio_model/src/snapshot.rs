//! Document snapshots and field accessors.
//!
//! A snapshot is the JSON object a remote listener delivers for one
//! document. Decoding into typed documents goes through the accessors
//! here so every document type reports the same field-level errors.

use crate::error::{ModelError, ModelResult};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// A remote document snapshot: a JSON object keyed by field name.
pub type Snapshot = Map<String, Value>;

/// Fetches a required string field from a snapshot.
pub fn require_str_field(snapshot: &Snapshot, field: &str) -> ModelResult<String> {
    match snapshot.get(field) {
        None => Err(ModelError::missing(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ModelError::invalid(field, "string")),
    }
}

/// Fetches a required signed integer field from a snapshot.
pub fn require_i64_field(snapshot: &Snapshot, field: &str) -> ModelResult<i64> {
    match snapshot.get(field) {
        None => Err(ModelError::missing(field)),
        Some(v) => v
            .as_i64()
            .ok_or_else(|| ModelError::invalid(field, "integer")),
    }
}

/// Fetches a required unsigned 32-bit integer field from a snapshot.
pub fn require_u32_field(snapshot: &Snapshot, field: &str) -> ModelResult<u32> {
    match snapshot.get(field) {
        None => Err(ModelError::missing(field)),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| ModelError::invalid(field, "unsigned integer")),
    }
}

/// Fetches an optional signed integer field from a snapshot.
///
/// Absent fields and explicit nulls both decode to `None`; a present
/// non-integer value is an error.
pub fn optional_i64_field(snapshot: &Snapshot, field: &str) -> ModelResult<Option<i64>> {
    match snapshot.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| ModelError::invalid(field, "integer or null")),
    }
}

/// Returns the current wall-clock time as milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
