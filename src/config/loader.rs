//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::applier::ConfigApplier;
use crate::config::error::{ConfigError, Result};
use crate::config::schema::ConfigPatch;
use crate::config::watcher::ConfigWatcher;
use crate::observability::metrics;

/// Result of a single load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing usable on disk (unreadable or empty); store untouched.
    Skipped,
    /// Document failed to decode; store untouched.
    Rejected,
    /// Document merged and side effects run.
    Applied,
}

/// Reads the configuration file and hands it to the applier.
pub struct ConfigLoader {
    path: PathBuf,
    applier: ConfigApplier,
    watcher: ConfigWatcher,
}

impl ConfigLoader {
    pub fn new(
        path: impl Into<PathBuf>,
        applier: ConfigApplier,
        watcher: ConfigWatcher,
    ) -> Arc<Self> {
        Arc::new(Self {
            path: path.into(),
            applier,
            watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn applier(&self) -> &ConfigApplier {
        &self.applier
    }

    pub fn watcher(&self) -> &ConfigWatcher {
        &self.watcher
    }

    /// Load the file and apply it.
    ///
    /// The first successful non-reload arms the watcher; reloads never do.
    pub fn load_from_storage(self: &Arc<Self>, is_reload: bool) -> LoadOutcome {
        let raw = match fs::read(&self.path) {
            Ok(raw) if !raw.is_empty() => raw,
            // A change notification can fire while the file is still being
            // written; an empty read is not an update.
            Ok(_) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Configuration file is empty, keeping current configuration"
                );
                metrics::record_load("skipped");
                return LoadOutcome::Skipped;
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Error loading configuration from disk"
                );
                metrics::record_load("skipped");
                return LoadOutcome::Skipped;
            }
        };

        if !self.applier.apply(&raw) {
            metrics::record_load("rejected");
            return LoadOutcome::Rejected;
        }
        metrics::record_load("applied");
        tracing::info!(path = %self.path.display(), reload = is_reload, "Configuration applied");

        if !is_reload {
            self.watcher.arm(&self.path, self);
        }
        LoadOutcome::Applied
    }
}

/// Decode a candidate document without applying it.
pub fn parse_only(raw: &str) -> Result<ConfigPatch> {
    ConfigPatch::from_slice(raw.as_bytes()).map_err(|source| ConfigError::Parse {
        text: raw.to_string(),
        source,
    })
}
