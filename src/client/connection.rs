//! UI connection state and reconnect tracking.
//!
//! # Responsibilities
//! - Hold the active UI target (socket path + local-socket flag)
//! - Forward disconnect requests to the transport
//! - Track reconnect sessions after a disconnect
//!
//! # Design Decisions
//! - The target lives behind its own mutex, separate from the config store
//! - The mutex is only held to copy the target in or out; it is never held
//!   while calling the transport or while acquiring the store lock
//! - Reconnecting is the transport's job: after `disconnect` it re-reads the
//!   target and dials the new address

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

use crate::client::address::SocketTarget;

/// Transport collaborator driven by the applier.
pub trait Transport: Send + Sync {
    /// Drop the current connection. The transport reconnects on its own,
    /// using whatever target is committed afterwards.
    fn disconnect(&self);
}

/// Connection to the operator UI as seen by the configuration subsystem.
pub struct ClientConnection {
    target: Mutex<SocketTarget>,
    transport: Arc<dyn Transport>,
}

impl ClientConnection {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            target: Mutex::new(SocketTarget::default()),
            transport,
        }
    }

    /// Copy of the active target.
    pub fn target(&self) -> SocketTarget {
        self.target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Active bare address.
    pub fn socket_path(&self) -> String {
        self.target().path
    }

    pub fn is_unix_socket(&self) -> bool {
        self.target().is_unix_socket
    }

    /// Commit a new target; path and flag change together.
    pub fn set_target(&self, target: SocketTarget) {
        *self.target.lock().unwrap_or_else(PoisonError::into_inner) = target;
    }

    /// Ask the transport to drop the connection.
    pub fn disconnect(&self) {
        self.transport.disconnect();
    }
}

impl std::fmt::Debug for ClientConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConnection")
            .field("target", &self.target())
            .finish_non_exhaustive()
    }
}

/// Link state of the [`ReconnectPoller`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connected = 0,
    Disconnected = 1,
}

impl From<u8> for LinkState {
    fn from(val: u8) -> Self {
        match val {
            0 => LinkState::Connected,
            _ => LinkState::Disconnected,
        }
    }
}

/// Transport that re-establishes the UI link whenever it is dropped.
///
/// Each reconnect starts a new session, numbered from 1. Redialing waits
/// `delay` after a disconnect so the new target is committed first.
#[derive(Debug)]
pub struct ReconnectPoller {
    wakeup: Notify,
    state: AtomicU8,
    session: AtomicU64,
    delay: Duration,
}

impl ReconnectPoller {
    pub fn new() -> Self {
        Self::with_delay(Duration::from_secs(1))
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            wakeup: Notify::new(),
            state: AtomicU8::new(LinkState::Disconnected as u8),
            session: AtomicU64::new(0),
            delay,
        }
    }

    pub fn state(&self) -> LinkState {
        LinkState::from(self.state.load(Ordering::SeqCst))
    }

    /// Number of sessions established so far.
    pub fn session(&self) -> u64 {
        self.session.load(Ordering::SeqCst)
    }

    /// Reconnect loop. Dials once at startup, then again after every
    /// disconnect, until shutdown fires.
    pub async fn run(
        self: Arc<Self>,
        connection: Arc<ClientConnection>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        self.connect(&connection);
        loop {
            tokio::select! {
                _ = self.wakeup.notified() => {
                    tokio::time::sleep(self.delay).await;
                    self.connect(&connection);
                }
                _ = shutdown.recv() => {
                    tracing::info!("Reconnect poller received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    fn connect(&self, connection: &ClientConnection) {
        let target = connection.target();
        if target.path.is_empty() {
            tracing::debug!("No UI address configured yet");
            return;
        }
        let session = self.session.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.store(LinkState::Connected as u8, Ordering::SeqCst);
        tracing::info!(
            address = %target.path,
            unix_socket = target.is_unix_socket,
            session,
            "Connected to UI"
        );
    }
}

impl Default for ReconnectPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ReconnectPoller {
    fn disconnect(&self) {
        self.state.store(LinkState::Disconnected as u8, Ordering::SeqCst);
        metrics::counter!("client_disconnects_total").increment(1);
        tracing::info!("UI connection dropped");
        self.wakeup.notify_one();
    }
}
