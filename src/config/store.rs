//! Shared configuration store.
//!
//! # Responsibilities
//! - Own the process-wide [`Configuration`]
//! - Hand out read guards to any subsystem
//! - Hand out the write guard to the applier only
//!
//! # Design Decisions
//! - One `RwLock`, held by the applier for parse, merge and side effects
//! - Lock order: the store lock may be held while taking the connection
//!   lock, never the other way round
//! - Poisoning is recovered: the guarded value is only ever replaced whole

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::schema::Configuration;

/// Lock-guarded configuration shared across the daemon.
#[derive(Debug, Default)]
pub struct ConfigStore {
    inner: RwLock<Configuration>,
}

impl ConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the read lock.
    pub fn read(&self) -> RwLockReadGuard<'_, Configuration> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire the write lock. Only the applier writes.
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Configuration> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clone the current configuration.
    pub fn snapshot(&self) -> Configuration {
        self.read().clone()
    }
}
