//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the configuration subsystem.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing configuration {text}: {source}")]
    Parse {
        text: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not watch path: {0}")]
    Watch(#[from] notify::Error),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
