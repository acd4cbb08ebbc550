//! Startup orchestration.
//!
//! # Responsibilities
//! - Construct the config store and every collaborator in dependency order
//! - Wire the loader, applier, watcher and persister together
//! - Start background tasks and perform the initial load
//!
//! # Design Decisions
//! - Everything is built here and passed down by `Arc`; nothing is global
//! - A missing or broken config file is not fatal: the daemon runs on
//!   defaults until a valid file appears

use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;

use crate::client::{ClientConnection, ReconnectPoller};
use crate::config::{
    Collaborators, ConfigApplier, ConfigError, ConfigLoader, ConfigPersister, ConfigStore,
    ConfigWatcher, LoadOutcome,
};
use crate::lifecycle::Shutdown;
use crate::observability::{AlertQueue, LogControl};
use crate::procmon::MethodSwitch;
use crate::rules::RuleTemplates;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sentineld/default-config.json";

/// The composed daemon.
pub struct Daemon {
    pub store: Arc<ConfigStore>,
    pub loader: Arc<ConfigLoader>,
    pub persister: ConfigPersister,
    pub connection: Arc<ClientConnection>,
    pub poller: Arc<ReconnectPoller>,
    pub rules: Arc<RuleTemplates>,
    pub monitor: Arc<MethodSwitch>,
    pub alerts: Arc<AlertQueue>,
    pub shutdown: Shutdown,
}

impl Daemon {
    /// Build every subsystem around the configuration file at `config_path`.
    pub fn build(
        config_path: &Path,
        log: Arc<dyn LogControl>,
        runtime: Handle,
    ) -> Result<Self, ConfigError> {
        let shutdown = Shutdown::new();
        let store = Arc::new(ConfigStore::new());

        let poller = Arc::new(ReconnectPoller::new());
        let connection = Arc::new(ClientConnection::new(poller.clone()));
        let rules = Arc::new(RuleTemplates::new());
        let monitor = Arc::new(MethodSwitch::default());
        let alerts = Arc::new(AlertQueue::default());

        let applier = ConfigApplier::new(
            Arc::clone(&store),
            config_path,
            Collaborators {
                log,
                connection: connection.clone(),
                rules: rules.clone(),
                monitor: monitor.clone(),
                alerts: alerts.clone(),
            },
        );
        let watcher = ConfigWatcher::with_notify(runtime, shutdown.clone())?;
        let loader = ConfigLoader::new(config_path, applier, watcher);

        Ok(Self {
            store,
            loader,
            persister: ConfigPersister::new(config_path),
            connection,
            poller,
            rules,
            monitor,
            alerts,
            shutdown,
        })
    }

    /// Start the UI poller and perform the initial load.
    pub async fn start(&self) -> LoadOutcome {
        tokio::spawn(
            self.poller
                .clone()
                .run(self.connection.clone(), self.shutdown.subscribe()),
        );
        self.load(false).await
    }

    /// Run a load on the blocking pool.
    pub async fn load(&self, is_reload: bool) -> LoadOutcome {
        let loader = Arc::clone(&self.loader);
        match tokio::task::spawn_blocking(move || loader.load_from_storage(is_reload)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Config load task failed");
                LoadOutcome::Skipped
            }
        }
    }
}
