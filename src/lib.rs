//! sentineld: live configuration management for the firewall daemon.

pub mod client;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod procmon;
pub mod rules;

pub use config::{ConfigStore, Configuration};
pub use lifecycle::{Daemon, Shutdown};
