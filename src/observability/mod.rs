//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Config applier produces:
//!     → logging.rs (level, timestamp format, log file)
//!     → alerts.rs (operator-facing warnings)
//!     → metrics.rs (load/save/disconnect counters)
//! ```

pub mod alerts;
pub mod logging;
pub mod metrics;

pub use alerts::{AlertQueue, AlertSink};
pub use logging::{LogControl, TracingLog};
