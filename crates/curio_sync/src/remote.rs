//! Remote document store abstraction.
//!
//! This trait is the seam between the engine and the cloud document
//! store, allowing different backends (and a mock for testing). The
//! remote store offers per-document CRUD plus snapshot-listener
//! subscriptions that deliver incremental change batches.

use crate::error::{SyncError, SyncResult};
use curio_model::{RemoteChange, RemotePath, Snapshot};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Callback invoked with each change batch a listener delivers.
pub type ChangeCallback = Arc<dyn Fn(&[RemoteChange]) + Send + Sync>;

/// An active snapshot-listener registration.
///
/// Cancelling (or dropping) the handle detaches the listener. The
/// registry owns every handle for a session, so a single `stop()`
/// tears down the whole set.
pub struct ListenerHandle {
    id: u64,
    cancel: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl ListenerHandle {
    /// Creates a handle wrapping a cancellation action.
    pub fn new(id: u64, cancel: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            id,
            cancel: Mutex::new(Some(cancel)),
        }
    }

    /// The registration's identifier within its remote store.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cancels the registration. Idempotent.
    pub fn cancel(&self) {
        if let Some(cancel) = self.cancel.lock().take() {
            cancel();
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A remote, per-user, multi-collection document store.
pub trait RemoteStore: Send + Sync {
    /// Creates a document at `path/{doc_id}`.
    fn create_document(&self, path: &RemotePath, doc_id: &str, data: Snapshot) -> SyncResult<()>;

    /// Overwrites the document at `path/{doc_id}`.
    fn set_document(&self, path: &RemotePath, doc_id: &str, data: Snapshot) -> SyncResult<()>;

    /// Deletes the document at `path/{doc_id}`.
    fn delete_document(&self, path: &RemotePath, doc_id: &str) -> SyncResult<()>;

    /// Attaches a snapshot listener to a collection path.
    ///
    /// The callback receives every subsequent change batch for the
    /// path, in the store's delivery order. No ordering is guaranteed
    /// across different listeners.
    fn subscribe(&self, path: &RemotePath, callback: ChangeCallback) -> SyncResult<ListenerHandle>;
}

struct MockListener {
    id: u64,
    callback: ChangeCallback,
}

type ListenerTable = HashMap<RemotePath, Vec<MockListener>>;

/// A scriptable in-memory remote store for testing.
///
/// Supports injected failures, per-document apply counts, and manual
/// change-batch emission to subscribed listeners.
#[derive(Default)]
pub struct MockRemoteStore {
    online: AtomicBool,
    docs: Mutex<HashMap<RemotePath, BTreeMap<String, Snapshot>>>,
    apply_counts: Mutex<HashMap<(&'static str, String), u32>>,
    op_log: Mutex<Vec<(&'static str, String)>>,
    fail_remaining: Mutex<HashMap<String, u32>>,
    listeners: Arc<Mutex<ListenerTable>>,
    next_listener_id: AtomicU64,
}

impl MockRemoteStore {
    /// Creates an online mock store.
    pub fn new() -> Self {
        Self {
            online: AtomicBool::new(true),
            ..Self::default()
        }
    }

    /// Sets whether remote calls succeed or fail as unreachable.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Makes the next `times` operations on `doc_id` fail retryably.
    pub fn fail_times(&self, doc_id: impl Into<String>, times: u32) {
        self.fail_remaining.lock().insert(doc_id.into(), times);
    }

    /// Emits a change batch to every listener on `path`.
    pub fn emit(&self, path: &RemotePath, batch: Vec<RemoteChange>) {
        // Clone callbacks out of the lock: a callback may subscribe a
        // new listener on this same store (fan-out) without deadlock.
        let callbacks: Vec<ChangeCallback> = {
            let listeners = self.listeners.lock();
            listeners
                .get(path)
                .map(|regs| regs.iter().map(|l| Arc::clone(&l.callback)).collect())
                .unwrap_or_default()
        };
        for callback in callbacks {
            callback(&batch);
        }
    }

    /// Number of times `op` was applied to `doc_id`.
    pub fn apply_count(&self, op: &'static str, doc_id: &str) -> u32 {
        self.apply_counts
            .lock()
            .get(&(op, doc_id.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Every successful operation in application order, as
    /// `(op, doc_id)` pairs.
    pub fn op_log(&self) -> Vec<(&'static str, String)> {
        self.op_log.lock().clone()
    }

    /// Returns the stored snapshot for a document, if present.
    pub fn document(&self, path: &RemotePath, doc_id: &str) -> Option<Snapshot> {
        self.docs
            .lock()
            .get(path)
            .and_then(|docs| docs.get(doc_id))
            .cloned()
    }

    /// Number of active listeners on one path.
    pub fn listener_count(&self, path: &RemotePath) -> usize {
        self.listeners.lock().get(path).map_or(0, Vec::len)
    }

    /// Number of active listeners across all paths.
    pub fn total_listener_count(&self) -> usize {
        self.listeners.lock().values().map(Vec::len).sum()
    }

    fn check_apply(&self, op: &'static str, doc_id: &str) -> SyncResult<()> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(SyncError::remote_retryable("remote store unreachable"));
        }
        let should_fail = {
            let mut failures = self.fail_remaining.lock();
            match failures.get_mut(doc_id) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            }
        };
        if should_fail {
            return Err(SyncError::remote_retryable("injected failure"));
        }
        *self
            .apply_counts
            .lock()
            .entry((op, doc_id.to_string()))
            .or_insert(0) += 1;
        self.op_log.lock().push((op, doc_id.to_string()));
        Ok(())
    }
}

impl RemoteStore for MockRemoteStore {
    fn create_document(&self, path: &RemotePath, doc_id: &str, data: Snapshot) -> SyncResult<()> {
        self.check_apply("create", doc_id)?;
        self.docs
            .lock()
            .entry(path.clone())
            .or_default()
            .insert(doc_id.to_string(), data);
        Ok(())
    }

    fn set_document(&self, path: &RemotePath, doc_id: &str, data: Snapshot) -> SyncResult<()> {
        self.check_apply("set", doc_id)?;
        self.docs
            .lock()
            .entry(path.clone())
            .or_default()
            .insert(doc_id.to_string(), data);
        Ok(())
    }

    fn delete_document(&self, path: &RemotePath, doc_id: &str) -> SyncResult<()> {
        self.check_apply("delete", doc_id)?;
        if let Some(docs) = self.docs.lock().get_mut(path) {
            docs.remove(doc_id);
        }
        Ok(())
    }

    fn subscribe(&self, path: &RemotePath, callback: ChangeCallback) -> SyncResult<ListenerHandle> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(SyncError::remote_retryable("remote store unreachable"));
        }

        let id = self.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.listeners
            .lock()
            .entry(path.clone())
            .or_default()
            .push(MockListener { id, callback });

        let listeners = Arc::clone(&self.listeners);
        let cancel_path = path.clone();
        Ok(ListenerHandle::new(
            id,
            Box::new(move || {
                if let Some(regs) = listeners.lock().get_mut(&cancel_path) {
                    regs.retain(|l| l.id != id);
                }
            }),
        ))
    }
}
