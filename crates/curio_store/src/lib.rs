//! # Curio Store
//!
//! Local store seam for the Curio sync core.
//!
//! This crate provides:
//! - The [`LocalStore`] trait all three write paths go through
//!   (direct edits, replayed mutations, mirror reconciliation)
//! - [`MemoryStore`], a serialized in-memory implementation that also
//!   serves as the test double
//! - Row types keyed by remote document ID
//!
//! The store is not safe for concurrent unsynchronized access; the
//! memory implementation serializes every operation through a single
//! lock, and alternative backends must provide the same contract.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod memory;
mod store;
mod types;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::LocalStore;
pub use types::{LocalActivity, LocalCollection, LocalItem};
