//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON)
//!     → loader.rs (read bytes; empty or unreadable = no update)
//!     → applier.rs (decode, merge into store, fan out side effects)
//!     → store.rs (shared, RwLock-guarded Configuration)
//!
//! On first successful load:
//!     watcher.rs registers the file and starts the reload worker
//!
//! On change notification:
//!     watcher.rs → loader.rs (reload) → applier.rs
//!
//! On operator save:
//!     persister.rs validates and writes the file
//!     → picked up by watcher.rs like any external edit
//! ```
//!
//! # Design Decisions
//! - Every field's zero value means "no change"; absent keys never clear state
//! - A document that fails to decode leaves the store untouched
//! - The applier is the only writer; everything else reads

pub mod applier;
pub mod error;
pub mod loader;
pub mod persister;
pub mod schema;
pub mod store;
pub mod watcher;

pub use applier::{Collaborators, ConfigApplier};
pub use error::ConfigError;
pub use loader::{parse_only, ConfigLoader, LoadOutcome};
pub use persister::ConfigPersister;
pub use schema::{ConfigPatch, Configuration, ServerConfig, StatsConfig};
pub use store::ConfigStore;
pub use watcher::{ChangeKind, ConfigWatcher, NotifyBackend, WatchBackend};
