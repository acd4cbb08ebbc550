//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Build store + collaborators → Start UI poller → Initial config load
//!     → (on success) config watcher armed
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → watcher and poller loops exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Trigger config reload
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{Daemon, DEFAULT_CONFIG_PATH};
