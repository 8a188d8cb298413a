//! # Curio Sync
//!
//! Offline-first synchronization core for Curio.
//!
//! This crate provides:
//! - Network reachability monitoring with offline-to-online edge
//!   detection
//! - A bounded, ordered queue of mutations made while offline
//! - Replay of queued mutations once connectivity resumes
//! - A listener-driven mirror that reconciles remote document changes
//!   into the local store, idempotently
//! - Per-session listener ownership with dynamic fan-out
//! - A sliding-window rate limiter for outbound calls
//!
//! ## Architecture
//!
//! Two independent asynchronous sources feed the engine: platform
//! path updates and remote snapshot-listener callbacks. The
//! offline-to-online edge is the single trigger for a queue drain;
//! listener batches flow through the mirror. Both paths serialize
//! through the same local store.
//!
//! ## Key invariants
//!
//! - The mutation queue is strict FIFO; a failed mutation moves to
//!   the tail on retry
//! - Drains swap the queue atomically, so concurrent drains never
//!   replay a mutation twice
//! - Mirror reconciliation is idempotent under duplicate delivery
//! - Delivery is at-least-once; queue eviction is the only silent drop
//! - The queue is in-memory only and does not survive the process

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod connectivity;
mod engine;
mod error;
mod limiter;
mod mirror;
mod queue;
mod remote;
mod replay;
mod session;
mod stats;

pub use config::{RateLimitConfig, RetryConfig, SyncConfig};
pub use connectivity::{
    ConnectionClass, ConnectivityState, InterfaceSet, NetworkMonitor, PathSource, PathUpdate,
};
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use limiter::RateLimiter;
pub use mirror::RemoteMirror;
pub use queue::MutationQueue;
pub use remote::{ChangeCallback, ListenerHandle, MockRemoteStore, RemoteStore};
pub use replay::{DrainReport, MutationReplayer};
pub use session::{ListenerRegistry, SyncSession};
pub use stats::{SharedStats, SyncStats};
