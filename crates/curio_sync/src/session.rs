//! Listener registry and per-user sync session.
//!
//! One session exists per signed-in user and owns every snapshot
//! listener registration for it, including the item listeners fanned
//! out while processing collection changes. Ownership is explicit: a
//! callback holds an `Arc` of the session, the session's registry
//! holds the handles, and a single `stop()` cancels the whole watch
//! tree. Nothing is kept alive through weak captures.

use crate::error::SyncResult;
use crate::mirror::RemoteMirror;
use crate::remote::{ListenerHandle, RemoteStore};
use curio_model::{RemoteChange, RemotePath};
use curio_store::LocalStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owns every listener registration of one session.
///
/// Top-level handles (collections, activity) sit beside an index of
/// fanned-out item listeners keyed by collection document ID.
#[derive(Default)]
pub struct ListenerRegistry {
    top_level: Mutex<Vec<ListenerHandle>>,
    item_listeners: Mutex<HashMap<String, ListenerHandle>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a top-level listener handle.
    pub fn register_top_level(&self, handle: ListenerHandle) {
        self.top_level.lock().push(handle);
    }

    /// Tracks the item listener for one collection.
    ///
    /// A previous listener for the same collection is cancelled and
    /// replaced.
    pub fn register_item_listener(&self, collection_id: impl Into<String>, handle: ListenerHandle) {
        if let Some(old) = self
            .item_listeners
            .lock()
            .insert(collection_id.into(), handle)
        {
            old.cancel();
        }
    }

    /// True when an item listener is tracked for the collection.
    pub fn has_item_listener(&self, collection_id: &str) -> bool {
        self.item_listeners.lock().contains_key(collection_id)
    }

    /// Total number of tracked registrations.
    pub fn active_count(&self) -> usize {
        self.top_level.lock().len() + self.item_listeners.lock().len()
    }

    /// Cancels every tracked registration and clears the registry.
    /// Safe to call when already empty.
    pub fn stop(&self) {
        for handle in self.top_level.lock().drain(..) {
            handle.cancel();
        }
        for (_, handle) in self.item_listeners.lock().drain() {
            handle.cancel();
        }
    }
}

/// One signed-in user's mirroring session.
///
/// Ephemeral: created by [`start`](Self::start), destroyed by
/// [`stop`](Self::stop), never persisted.
pub struct SyncSession<R: RemoteStore, S: LocalStore> {
    remote: Arc<R>,
    mirror: Arc<RemoteMirror<S>>,
    registry: ListenerRegistry,
    user: Mutex<Option<String>>,
}

impl<R: RemoteStore + 'static, S: LocalStore + 'static> SyncSession<R, S> {
    /// Creates a session that mirrors `remote` through `mirror`.
    pub fn new(remote: Arc<R>, mirror: Arc<RemoteMirror<S>>) -> Self {
        Self {
            remote,
            mirror,
            registry: ListenerRegistry::new(),
            user: Mutex::new(None),
        }
    }

    /// The signed-in user this session mirrors, if started.
    pub fn current_user(&self) -> Option<String> {
        self.user.lock().clone()
    }

    /// Number of active listener registrations, fan-out included.
    pub fn listener_count(&self) -> usize {
        self.registry.active_count()
    }

    /// Starts mirroring for a user.
    ///
    /// Idempotent: any prior registrations are discarded first. Only
    /// the collections and activity listeners attach eagerly; item
    /// listeners attach as collections are discovered.
    pub fn start(self: &Arc<Self>, user_id: &str) -> SyncResult<()> {
        self.stop();
        *self.user.lock() = Some(user_id.to_string());

        let session = Arc::clone(self);
        let fan_out_user = user_id.to_string();
        let collections = self.remote.subscribe(
            &RemotePath::collections(user_id),
            Arc::new(move |batch: &[RemoteChange]| {
                let new_ids = session.mirror.apply_collection_changes(batch);
                for collection_id in new_ids {
                    session.attach_item_listener(&fan_out_user, &collection_id);
                }
            }),
        )?;
        self.registry.register_top_level(collections);

        let session = Arc::clone(self);
        let activity = self.remote.subscribe(
            &RemotePath::activity(user_id),
            Arc::new(move |batch: &[RemoteChange]| {
                session.mirror.apply_activity_changes(batch);
            }),
        )?;
        self.registry.register_top_level(activity);

        info!(user_id, "sync session started");
        Ok(())
    }

    /// Cancels every registration and clears the session. No-op when
    /// already stopped.
    pub fn stop(&self) {
        let was_started = self.user.lock().take().is_some();
        self.registry.stop();
        if was_started {
            info!("sync session stopped");
        }
    }

    /// Full listener re-establishment: stop, then start.
    pub fn force_sync(self: &Arc<Self>, user_id: &str) -> SyncResult<()> {
        self.stop();
        self.start(user_id)
    }

    /// Attaches the items listener for one discovered collection,
    /// registered into this session's registry so teardown is uniform.
    ///
    /// Called from inside the collections listener callback; failures
    /// here are logged and absorbed, never propagated into the
    /// listener.
    fn attach_item_listener(self: &Arc<Self>, user_id: &str, collection_id: &str) {
        if self.registry.has_item_listener(collection_id) {
            return;
        }

        let session = Arc::clone(self);
        let mirror_collection = collection_id.to_string();
        match self.remote.subscribe(
            &RemotePath::items(user_id, collection_id),
            Arc::new(move |batch: &[RemoteChange]| {
                session.mirror.apply_item_changes(&mirror_collection, batch);
            }),
        ) {
            Ok(handle) => {
                debug!(collection_id, "attached item listener");
                self.registry.register_item_listener(collection_id, handle);
            }
            Err(err) => {
                warn!(collection_id, %err, "failed to attach item listener");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MockRemoteStore;
    use crate::stats::SharedStats;
    use curio_model::CollectionDoc;
    use curio_store::MemoryStore;

    fn session() -> (Arc<MockRemoteStore>, Arc<SyncSession<MockRemoteStore, MemoryStore>>) {
        let remote = Arc::new(MockRemoteStore::new());
        let mirror = Arc::new(RemoteMirror::new(
            Arc::new(MemoryStore::new()),
            SharedStats::new(),
        ));
        let session = Arc::new(SyncSession::new(Arc::clone(&remote), mirror));
        (remote, session)
    }

    fn collection_added(doc_id: &str) -> RemoteChange {
        RemoteChange::added(
            doc_id,
            CollectionDoc {
                name: doc_id.to_uppercase(),
                category: "misc".into(),
                created_at_ms: 0,
                item_count: 0,
            }
            .to_snapshot(),
        )
    }

    #[test]
    fn start_attaches_collections_and_activity_only() {
        let (remote, session) = session();
        session.start("u1").unwrap();

        assert_eq!(session.listener_count(), 2);
        assert_eq!(remote.listener_count(&RemotePath::collections("u1")), 1);
        assert_eq!(remote.listener_count(&RemotePath::activity("u1")), 1);
        assert_eq!(remote.listener_count(&RemotePath::items("u1", "c1")), 0);
    }

    #[test]
    fn start_is_idempotent() {
        let (remote, session) = session();
        session.start("u1").unwrap();
        session.start("u1").unwrap();

        assert_eq!(session.listener_count(), 2);
        assert_eq!(remote.total_listener_count(), 2);
        assert_eq!(session.current_user().as_deref(), Some("u1"));
    }

    #[test]
    fn collection_added_fans_out_an_item_listener() {
        let (remote, session) = session();
        session.start("u1").unwrap();

        remote.emit(
            &RemotePath::collections("u1"),
            vec![collection_added("c1")],
        );

        assert_eq!(remote.listener_count(&RemotePath::items("u1", "c1")), 1);
        assert_eq!(session.listener_count(), 3);

        // Duplicate delivery does not stack a second listener.
        remote.emit(
            &RemotePath::collections("u1"),
            vec![collection_added("c1")],
        );
        assert_eq!(remote.listener_count(&RemotePath::items("u1", "c1")), 1);
    }

    #[test]
    fn stop_cancels_the_whole_watch_tree() {
        let (remote, session) = session();
        session.start("u1").unwrap();
        remote.emit(
            &RemotePath::collections("u1"),
            vec![collection_added("c1"), collection_added("c2")],
        );
        assert_eq!(remote.total_listener_count(), 4);

        session.stop();
        assert_eq!(remote.total_listener_count(), 0);
        assert_eq!(session.listener_count(), 0);
        assert!(session.current_user().is_none());

        // Stopping again is a no-op.
        session.stop();
    }

    #[test]
    fn force_sync_reestablishes_listeners() {
        let (remote, session) = session();
        session.start("u1").unwrap();
        remote.emit(&RemotePath::collections("u1"), vec![collection_added("c1")]);
        assert_eq!(remote.total_listener_count(), 3);

        session.force_sync("u1").unwrap();
        // Only the eager listeners come back; fan-out waits for the
        // collections listener to rediscover its collections.
        assert_eq!(remote.total_listener_count(), 2);

        // The redelivered initial snapshot re-attaches the item
        // listener even though c1 is already materialized locally.
        remote.emit(&RemotePath::collections("u1"), vec![collection_added("c1")]);
        assert_eq!(remote.listener_count(&RemotePath::items("u1", "c1")), 1);
    }
}
