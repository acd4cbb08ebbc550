//! Persisting operator changes to disk.
//!
//! The persister validates and writes; it never touches the store. The
//! written file reaches the store through the watcher like any other edit.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::error::{ConfigError, Result};
use crate::config::loader::parse_only;
use crate::observability::metrics;

/// Mode applied to an existing configuration file before writing.
pub const RESTRICTED_MODE: u32 = 0o600;

/// Mode used when the write creates the file.
// NOTE: differs from RESTRICTED_MODE. Both are applied in the same save and
// the mismatch is kept as found.
pub const CREATE_MODE: u32 = 0o644;

/// Writes validated documents to the configuration file.
#[derive(Debug, Clone)]
pub struct ConfigPersister {
    path: PathBuf,
}

impl ConfigPersister {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate `raw` and write it to the configuration file.
    pub fn save(&self, raw: &str) -> Result<()> {
        if let Err(e) = parse_only(raw) {
            metrics::record_save("invalid");
            return Err(e);
        }

        if let Err(e) = restrict_permissions(&self.path) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "unable to set permissions to default config"
            );
        }

        if let Err(e) = write_config(&self.path, raw.as_bytes()) {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "writing configuration to disk"
            );
            metrics::record_save("failed");
            return Err(ConfigError::io(&self.path, e));
        }

        metrics::record_save("written");
        tracing::info!(path = %self.path.display(), bytes = raw.len(), "Configuration saved");
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(RESTRICTED_MODE))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn write_config(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(CREATE_MODE);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.flush()
}
