//! Configuration file watcher for hot reload.
//!
//! # Responsibilities
//! - Register the configuration file with the filesystem notifier
//! - Run the worker that turns change notifications into reloads
//!
//! # Design Decisions
//! - Armed at most once per loader; later arming attempts are no-ops even
//!   if the first registration failed
//! - Reloads run on the blocking pool, one at a time, in notification order
//! - The worker exits on daemon shutdown or when the notifier goes away

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};

use crate::config::error::Result;
use crate::config::loader::ConfigLoader;
use crate::lifecycle::Shutdown;

/// Kind of change observed on the watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    /// Map a notifier event kind; `None` for events that cannot alter the contents.
    pub fn from_event(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(ChangeKind::Created),
            EventKind::Modify(_) => Some(ChangeKind::Modified),
            EventKind::Remove(_) => Some(ChangeKind::Removed),
            _ => None,
        }
    }
}

/// Filesystem change-notification service.
pub trait WatchBackend: Send + Sync {
    /// Start delivering notifications for `path`.
    fn register(&self, path: &Path) -> Result<()>;
}

/// [`WatchBackend`] on top of the platform notifier.
pub struct NotifyBackend {
    watcher: Mutex<RecommendedWatcher>,
}

impl NotifyBackend {
    /// Create the notifier and the channel its events are delivered on.
    pub fn new() -> Result<(Self, mpsc::UnboundedReceiver<ChangeKind>)> {
        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if let Some(kind) = ChangeKind::from_event(&event.kind) {
                        let _ = tx.send(kind);
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        Ok((
            Self {
                watcher: Mutex::new(watcher),
            },
            rx,
        ))
    }
}

impl WatchBackend for NotifyBackend {
    fn register(&self, path: &Path) -> Result<()> {
        self.watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .watch(path, RecursiveMode::NonRecursive)?;
        Ok(())
    }
}

/// Owns the notification stream and starts the reload worker.
pub struct ConfigWatcher {
    backend: Arc<dyn WatchBackend>,
    events: Mutex<Option<mpsc::UnboundedReceiver<ChangeKind>>>,
    armed: AtomicBool,
    running: Arc<AtomicBool>,
    runtime: Handle,
    shutdown: Shutdown,
}

impl ConfigWatcher {
    pub fn new(
        backend: Arc<dyn WatchBackend>,
        events: mpsc::UnboundedReceiver<ChangeKind>,
        runtime: Handle,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            backend,
            events: Mutex::new(Some(events)),
            armed: AtomicBool::new(false),
            running: Arc::new(AtomicBool::new(false)),
            runtime,
            shutdown,
        }
    }

    /// Watcher backed by the platform notifier.
    pub fn with_notify(runtime: Handle, shutdown: Shutdown) -> Result<Self> {
        let (backend, events) = NotifyBackend::new()?;
        Ok(Self::new(Arc::new(backend), events, runtime, shutdown))
    }

    /// Whether the reload worker is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Register `path` and spawn the worker, once.
    pub(crate) fn arm(&self, path: &Path, loader: &Arc<ConfigLoader>) {
        if self.armed.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Err(e) = self.backend.register(path) {
            tracing::error!(path = %path.display(), error = %e, "Could not watch path");
            return;
        }

        let events = match self.events.lock().unwrap_or_else(PoisonError::into_inner).take() {
            Some(events) => events,
            None => return,
        };

        self.running.store(true, Ordering::SeqCst);
        let worker = run_worker(
            Arc::clone(loader),
            events,
            self.shutdown.subscribe(),
            Arc::clone(&self.running),
        );
        self.runtime.spawn(worker);
        tracing::info!(path = %path.display(), "Config watcher started");
    }
}

async fn run_worker(
    loader: Arc<ConfigLoader>,
    mut events: mpsc::UnboundedReceiver<ChangeKind>,
    mut shutdown: broadcast::Receiver<()>,
    running: Arc<AtomicBool>,
) {
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(kind) = event else {
                    tracing::warn!("Config notifier closed, stopping watcher");
                    break;
                };
                tracing::debug!(?kind, "Config file change detected, reloading...");
                let loader = Arc::clone(&loader);
                let reload = tokio::task::spawn_blocking(move || loader.load_from_storage(true));
                if let Err(e) = reload.await {
                    tracing::error!(error = %e, "Config reload task failed");
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Config watcher received shutdown signal, exiting loop");
                break;
            }
        }
    }
    running.store(false, Ordering::SeqCst);
}
