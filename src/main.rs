//! sentineld
//!
//! Firewall daemon configuration core.
//!
//! # Architecture Overview
//!
//! ```text
//!   config file ──▶ loader ──▶ applier ──▶ store (RwLock<Configuration>)
//!        ▲                        │
//!        │                        ├──▶ logging (level, timestamps, log file)
//!   persister                     ├──▶ UI connection (address, disconnect)
//!   (operator save)               ├──▶ sentinel rule templates
//!        │                        └──▶ process monitor method
//!        │
//!        └──── watcher (notify) ──▶ loader (reload)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::runtime::Handle;

use sentineld::config::LoadOutcome;
use sentineld::lifecycle::signals::{SignalEvent, Signals};
use sentineld::lifecycle::{Daemon, DEFAULT_CONFIG_PATH};
use sentineld::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "sentineld")]
#[command(about = "Application firewall daemon", long_about = None)]
struct Cli {
    /// Path of the JSON configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level used until the configuration sets one (0 debug .. 4 error).
    #[arg(long)]
    log_level: Option<u32>,

    /// Expose Prometheus metrics on this address.
    #[arg(long)]
    metrics_address: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log = Arc::new(logging::init(cli.log_level)?);
    tracing::info!("sentineld v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(addr) = cli.metrics_address {
        metrics::init_metrics(addr);
    }

    let daemon = Daemon::build(&cli.config, log, Handle::current())?;
    let mut signals = Signals::new()?;

    if daemon.start().await != LoadOutcome::Applied {
        tracing::warn!(
            path = %cli.config.display(),
            "Initial configuration not applied, running with defaults"
        );
    }

    loop {
        match signals.next().await {
            SignalEvent::Reload => {
                tracing::info!("SIGHUP received, reloading configuration");
                daemon.load(true).await;
            }
            SignalEvent::Shutdown => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    daemon.shutdown.trigger();
    tracing::info!("Shutdown complete");
    Ok(())
}
