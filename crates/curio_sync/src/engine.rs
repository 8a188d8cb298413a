//! Engine assembly.
//!
//! `SyncEngine` wires the explicitly constructed service objects
//! together: the connectivity monitor feeds the replayer, the session
//! feeds the mirror, and everything shares one set of counters. It is
//! built once at process start and passed by reference to consumers;
//! there is no global state.
//!
//! Two independent event sources drive the engine: platform path
//! updates (through [`SyncEngine::handle_path_update`]) and remote
//! listener callbacks (owned by the session). Both funnel into the
//! same serialized local store.

use crate::config::SyncConfig;
use crate::connectivity::{ConnectivityState, NetworkMonitor, PathSource, PathUpdate};
use crate::error::{SyncError, SyncResult};
use crate::limiter::RateLimiter;
use crate::mirror::RemoteMirror;
use crate::queue::MutationQueue;
use crate::remote::RemoteStore;
use crate::replay::{DrainReport, MutationReplayer};
use crate::session::SyncSession;
use crate::stats::{SharedStats, SyncStats};
use curio_model::{Mutation, PendingMutation};
use curio_store::LocalStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// The sync engine for one local store and one remote store.
pub struct SyncEngine<R: RemoteStore, S: LocalStore> {
    monitor: NetworkMonitor,
    queue: Arc<MutationQueue>,
    replayer: MutationReplayer<R>,
    session: Arc<SyncSession<R, S>>,
    limiter: RateLimiter,
    stats: SharedStats,
    stopped: AtomicBool,
}

impl<R: RemoteStore + 'static, S: LocalStore + 'static> SyncEngine<R, S> {
    /// Builds an engine from its two collaborators.
    pub fn new(config: SyncConfig, remote: Arc<R>, store: Arc<S>) -> Self {
        let stats = SharedStats::new();
        let queue = Arc::new(MutationQueue::new(config.max_queue_size, stats.clone()));
        let mirror = Arc::new(RemoteMirror::new(store, stats.clone()));
        let session = Arc::new(SyncSession::new(Arc::clone(&remote), mirror));
        let replayer = MutationReplayer::new(
            remote,
            Arc::clone(&queue),
            config.retry.clone(),
            stats.clone(),
        );
        let limiter = RateLimiter::from_config(&config.rate_limit);

        Self {
            monitor: NetworkMonitor::new(),
            queue,
            replayer,
            session,
            limiter,
            stats,
            stopped: AtomicBool::new(true),
        }
    }

    /// Starts mirroring for a user and enables queue drains.
    pub fn start(&self, user_id: &str) -> SyncResult<()> {
        self.session.start(user_id)?;
        self.stopped.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Stops the session and disables further drains.
    ///
    /// A drain already running finishes its swapped-out batch; no new
    /// drain starts afterwards.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.session.stop();
    }

    /// Tears down and re-establishes every listener for the user.
    pub fn force_sync(&self, user_id: &str) -> SyncResult<()> {
        self.session.force_sync(user_id)?;
        self.stopped.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Submits a local mutation.
    ///
    /// Online, the mutation is throttled by the rate limiter and
    /// applied to the remote store immediately; a failed apply is
    /// absorbed into the queue for replay. Offline, the mutation is
    /// queued. The queue is volatile: it does not survive the process.
    pub fn submit(&self, mutation: Mutation) -> SyncResult<()> {
        if !self.monitor.state().is_online() {
            debug!(kind = mutation.kind_name(), "offline, queueing mutation");
            self.queue.enqueue(PendingMutation::new(mutation));
            return Ok(());
        }

        self.limiter.check_rate_limit()?;
        let user_id = self
            .session
            .current_user()
            .ok_or(SyncError::SessionNotStarted)?;

        if let Err(err) = self.replayer.apply_now(&user_id, &mutation) {
            warn!(kind = mutation.kind_name(), %err, "direct apply failed, queueing for replay");
            self.stats.record_error(err.to_string());
            self.queue.enqueue(PendingMutation::new(mutation));
        }
        Ok(())
    }

    /// Feeds one platform path update through the monitor.
    ///
    /// An offline-to-online edge triggers a queue drain; every other
    /// update only refreshes the connectivity state. This is the only
    /// path that starts a replay automatically.
    pub fn handle_path_update(&self, update: PathUpdate) {
        let came_online = self.monitor.process_update(update);
        if came_online {
            self.drain_queued();
        }
    }

    /// Drains the queue now, if the engine is started.
    pub fn drain_queued(&self) -> Option<DrainReport> {
        if self.stopped.load(Ordering::SeqCst) {
            debug!("engine stopped, skipping drain");
            return None;
        }
        let user_id = self.session.current_user()?;
        Some(self.replayer.drain_and_replay(&user_id))
    }

    /// Wires a platform path source into this engine.
    pub fn attach_path_source(self: &Arc<Self>, source: &dyn PathSource) {
        let engine = Arc::clone(self);
        source.register(Box::new(move |update| engine.handle_path_update(update)));
    }

    /// Marks the platform reachability API as unavailable; the engine
    /// behaves as permanently offline.
    pub fn mark_path_source_unavailable(&self) {
        self.monitor.mark_source_unavailable();
    }

    /// Current connectivity state.
    pub fn connectivity(&self) -> ConnectivityState {
        self.monitor.state()
    }

    /// The connectivity monitor, for raw update subscriptions.
    pub fn monitor(&self) -> &NetworkMonitor {
        &self.monitor
    }

    /// Number of mutations waiting for replay.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Mutations dropped after exhausting their attempt budget.
    pub fn dead_letters(&self) -> Vec<PendingMutation> {
        self.replayer.dead_letters()
    }

    /// Outbound calls still available in the current rate window.
    pub fn remaining_calls(&self) -> u32 {
        self.limiter.remaining_calls()
    }

    /// A copy of the engine's counters.
    pub fn stats(&self) -> SyncStats {
        self.stats.snapshot()
    }

    /// The session owning this engine's listener registrations.
    pub fn session(&self) -> &Arc<SyncSession<R, S>> {
        &self.session
    }
}
