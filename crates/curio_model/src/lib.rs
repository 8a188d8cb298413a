//! # Curio Model
//!
//! Domain and protocol types for the Curio sync core.
//!
//! This crate provides:
//! - Document types for the three mirrored entity kinds
//!   (collections, items, activity entries)
//! - `Snapshot` JSON-object snapshots with typed decode
//! - `RemoteChange` for listener-delivered change events
//! - `Mutation` as a tagged union of strongly typed payloads
//! - Remote path construction for user-scoped collections
//!
//! This is a pure model crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change;
mod document;
mod error;
mod mutation;
mod path;
mod snapshot;

pub use change::{ChangeType, RemoteChange};
pub use document::{ActivityDoc, CollectionDoc, ItemDoc};
pub use error::{ModelError, ModelResult};
pub use mutation::{Mutation, PendingMutation};
pub use path::RemotePath;
pub use snapshot::{
    now_ms, optional_i64_field, require_i64_field, require_str_field, require_u32_field, Snapshot,
};
