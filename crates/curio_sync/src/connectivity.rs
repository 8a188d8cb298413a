//! Network reachability monitoring.
//!
//! The platform pushes raw path updates; the monitor classifies them
//! into a [`ConnectivityState`] and detects offline-to-online edges.
//! The edge is the single signal that triggers a queue drain, so the
//! monitor itself performs no side effects: [`NetworkMonitor::process_update`]
//! reports the edge and the engine acts on it.
//!
//! The monitor never fails. Without a platform source it simply stays
//! [`ConnectivityState::Offline`].

use parking_lot::{Mutex, RwLock};
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, info};

/// Classification of the active network interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionClass {
    /// WiFi interface.
    Wifi,
    /// Cellular interface.
    Cellular,
    /// Wired ethernet interface.
    Wired,
    /// Reachable with no recognized interface type.
    NoInterface,
}

/// Overall connectivity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    /// No path update has been observed yet.
    Unknown,
    /// Network is reachable over the given interface class.
    Online(ConnectionClass),
    /// Network is unreachable.
    Offline,
}

impl ConnectivityState {
    /// Returns true for any `Online` state.
    pub fn is_online(&self) -> bool {
        matches!(self, ConnectivityState::Online(_))
    }
}

/// The set of interface types active in one path update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterfaceSet {
    /// A WiFi interface is up.
    pub wifi: bool,
    /// A cellular interface is up.
    pub cellular: bool,
    /// A wired interface is up.
    pub wired: bool,
}

impl InterfaceSet {
    /// Classifies the set with the fixed priority
    /// WiFi > Cellular > Wired > none.
    pub fn classify(&self) -> ConnectionClass {
        if self.wifi {
            ConnectionClass::Wifi
        } else if self.cellular {
            ConnectionClass::Cellular
        } else if self.wired {
            ConnectionClass::Wired
        } else {
            ConnectionClass::NoInterface
        }
    }
}

/// One raw update from the platform reachability API.
///
/// Updates are not de-duplicated; the platform may deliver the same
/// semantic state repeatedly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathUpdate {
    /// Whether the network is reachable.
    pub reachable: bool,
    /// Active interface types.
    pub interfaces: InterfaceSet,
}

impl PathUpdate {
    /// A reachable update over WiFi.
    pub fn online_wifi() -> Self {
        Self {
            reachable: true,
            interfaces: InterfaceSet {
                wifi: true,
                ..InterfaceSet::default()
            },
        }
    }

    /// A reachable update over cellular.
    pub fn online_cellular() -> Self {
        Self {
            reachable: true,
            interfaces: InterfaceSet {
                cellular: true,
                ..InterfaceSet::default()
            },
        }
    }

    /// An unreachable update.
    pub fn offline() -> Self {
        Self {
            reachable: false,
            interfaces: InterfaceSet::default(),
        }
    }

    /// Derives the connectivity state for this update.
    pub fn state(&self) -> ConnectivityState {
        if self.reachable {
            ConnectivityState::Online(self.interfaces.classify())
        } else {
            ConnectivityState::Offline
        }
    }
}

/// A push-based source of platform path updates.
///
/// The production implementation wraps the OS reachability API; tests
/// drive [`NetworkMonitor::process_update`] directly instead.
pub trait PathSource: Send + Sync {
    /// Registers the callback invoked on every platform path update.
    fn register(&self, callback: Box<dyn Fn(PathUpdate) + Send + Sync>);
}

struct MonitorState {
    previous_reachable: Option<bool>,
    current: ConnectivityState,
}

/// Observes path updates and detects offline-to-online edges.
pub struct NetworkMonitor {
    state: Mutex<MonitorState>,
    subscribers: RwLock<Vec<Sender<PathUpdate>>>,
}

impl NetworkMonitor {
    /// Creates a monitor in the `Unknown` state.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MonitorState {
                previous_reachable: None,
                current: ConnectivityState::Unknown,
            }),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Current connectivity state.
    pub fn state(&self) -> ConnectivityState {
        self.state.lock().current
    }

    /// Subscribes to every raw path update, without de-duplication.
    pub fn subscribe(&self) -> Receiver<PathUpdate> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Processes one path update.
    ///
    /// Returns true exactly when this update is an offline-to-online
    /// edge: the new reachable flag is true and the previous one was
    /// false. The very first update never reports an edge.
    pub fn process_update(&self, update: PathUpdate) -> bool {
        let came_online = {
            let mut state = self.state.lock();
            let edge = update.reachable && state.previous_reachable == Some(false);
            state.previous_reachable = Some(update.reachable);
            state.current = update.state();
            edge
        };

        debug!(
            reachable = update.reachable,
            state = ?update.state(),
            "path update"
        );
        if came_online {
            info!("connectivity restored");
        }

        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(update).is_ok());

        came_online
    }

    /// Marks the platform reachability API as unavailable.
    ///
    /// The monitor degrades to a permanent `Offline` state; with no
    /// source, no update will ever move it back online.
    pub fn mark_source_unavailable(&self) {
        let mut state = self.state.lock();
        state.previous_reachable = Some(false);
        state.current = ConnectivityState::Offline;
        info!("reachability source unavailable, assuming offline");
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}
