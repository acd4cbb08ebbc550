//! Applying a configuration document to the running daemon.
//!
//! # Responsibilities
//! - Decode a raw document and merge it into the store
//! - Fan out side effects to logging, the UI connection, the sentinel rules
//!   and the process monitor, in a fixed order
//!
//! # Design Decisions
//! - The store write lock is held from decode to the last side effect, so
//!   readers never see a half-applied document and reloads are serialized
//! - Collaborators called under the lock must not take the store lock
//! - Only a decode failure fails the apply; side-effect failures are logged
//!   and alerted

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::client::{resolve_address, ClientConnection};
use crate::config::schema::{ConfigPatch, Configuration};
use crate::config::store::ConfigStore;
use crate::observability::{AlertSink, LogControl};
use crate::procmon::ProcMonitor;
use crate::rules::RuleTemplates;

/// Subsystems affected by a configuration change.
#[derive(Clone)]
pub struct Collaborators {
    pub log: Arc<dyn LogControl>,
    pub connection: Arc<ClientConnection>,
    pub rules: Arc<RuleTemplates>,
    pub monitor: Arc<dyn ProcMonitor>,
    pub alerts: Arc<dyn AlertSink>,
}

/// Sole writer of the [`ConfigStore`].
pub struct ConfigApplier {
    store: Arc<ConfigStore>,
    source: PathBuf,
    deps: Collaborators,
}

impl ConfigApplier {
    /// `source` names the document in log and alert messages.
    pub fn new(store: Arc<ConfigStore>, source: impl Into<PathBuf>, deps: Collaborators) -> Self {
        Self {
            store,
            source: source.into(),
            deps,
        }
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Decode `raw`, merge it and run every side effect.
    ///
    /// Returns `false` only when the document cannot be decoded, in which
    /// case the store is left untouched.
    pub fn apply(&self, raw: &[u8]) -> bool {
        let mut config = self.store.write();

        let patch = match ConfigPatch::from_slice(raw) {
            Ok(patch) => patch,
            Err(e) => {
                let msg = format!("Error parsing configuration {}: {}", self.source.display(), e);
                tracing::error!("{}", msg);
                self.deps.alerts.send_warning(&msg);
                return false;
            }
        };
        config.merge(patch);

        self.apply_logging(&config);
        self.apply_server_address(&config);
        self.apply_default_rules(&config);
        self.apply_monitor_method(&config);

        true
    }

    fn apply_logging(&self, config: &Configuration) {
        // Level goes first so the remaining steps log at the requested verbosity.
        if let Some(level) = config.log_level {
            self.deps.log.set_level(level);
        }
        self.deps.log.set_utc(config.log_utc);
        self.deps.log.set_micro(config.log_micro);

        if !config.server.log_file.is_empty() {
            self.deps.log.close();
            let path = Path::new(&config.server.log_file);
            if let Err(e) = self.deps.log.open_file(path) {
                let msg = format!("Unable to open log file {}: {}", path.display(), e);
                tracing::warn!("{}", msg);
                self.deps.alerts.send_warning(&msg);
            }
        }
    }

    fn apply_server_address(&self, config: &Configuration) {
        if config.server.address.is_empty() {
            return;
        }

        let target = resolve_address(&config.server.address);
        let current = self.deps.connection.socket_path();
        if target.path != current {
            tracing::info!(
                from = %current,
                to = %target.path,
                unix_socket = target.is_unix_socket,
                "UI address changed, disconnecting"
            );
            self.deps.connection.disconnect();
        }
        self.deps.connection.set_target(target);
    }

    fn apply_default_rules(&self, config: &Configuration) {
        if !config.default_action.is_empty() {
            self.deps.rules.set_default_action(&config.default_action);
        }
        if !config.default_duration.is_empty() {
            self.deps.rules.set_default_duration(&config.default_duration);
        }
    }

    fn apply_monitor_method(&self, config: &Configuration) {
        let method = &config.proc_monitor_method;
        if method.is_empty() || *method == self.deps.monitor.method() {
            return;
        }

        if let Err(e) = self.deps.monitor.reconfigure(method) {
            let msg = format!(
                "Unable to set new process monitor ({}) method from disk: {}",
                method, e
            );
            tracing::warn!("{}", msg);
            self.deps.alerts.send_warning(&msg);
        }
    }
}
