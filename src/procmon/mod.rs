//! Process monitor strategy selection.
//!
//! # Responsibilities
//! - Track which process-monitoring method is active
//! - Switch methods on request, rejecting unknown ones
//!
//! # Design Decisions
//! - Switching is synchronous and non-blocking; the monitors themselves run
//!   elsewhere and pick up the active method
//! - A failed switch keeps the previous method active

use std::str::FromStr;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Process monitor collaborator driven by the applier.
pub trait ProcMonitor: Send + Sync {
    /// Name of the active method.
    fn method(&self) -> String;

    /// Switch to `method`.
    fn reconfigure(&self, method: &str) -> Result<(), MonitorError>;
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("unknown process monitor method: {0}")]
    UnknownMethod(String),

    #[error("process monitor method {method} unavailable: {reason}")]
    Unavailable { method: String, reason: String },
}

/// Supported strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorMethod {
    /// Scan /proc for socket owners.
    Proc,
    /// Kernel probes via eBPF.
    Ebpf,
    /// Linux audit subsystem.
    Audit,
}

impl MonitorMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorMethod::Proc => "proc",
            MonitorMethod::Ebpf => "ebpf",
            MonitorMethod::Audit => "audit",
        }
    }
}

impl FromStr for MonitorMethod {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proc" => Ok(MonitorMethod::Proc),
            "ebpf" => Ok(MonitorMethod::Ebpf),
            "audit" => Ok(MonitorMethod::Audit),
            other => Err(MonitorError::UnknownMethod(other.to_string())),
        }
    }
}

impl std::fmt::Display for MonitorMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-process strategy switch.
#[derive(Debug)]
pub struct MethodSwitch {
    active: Mutex<MonitorMethod>,
    available: Vec<MonitorMethod>,
}

impl MethodSwitch {
    /// Start on `initial`, allowing every method.
    pub fn new(initial: MonitorMethod) -> Self {
        Self::with_available(
            initial,
            vec![MonitorMethod::Proc, MonitorMethod::Ebpf, MonitorMethod::Audit],
        )
    }

    /// Start on `initial`, allowing only `available`.
    pub fn with_available(initial: MonitorMethod, available: Vec<MonitorMethod>) -> Self {
        Self {
            active: Mutex::new(initial),
            available,
        }
    }

    pub fn active(&self) -> MonitorMethod {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MethodSwitch {
    fn default() -> Self {
        Self::new(MonitorMethod::Proc)
    }
}

impl ProcMonitor for MethodSwitch {
    fn method(&self) -> String {
        self.active().as_str().to_string()
    }

    fn reconfigure(&self, method: &str) -> Result<(), MonitorError> {
        let next: MonitorMethod = method.parse()?;
        if !self.available.contains(&next) {
            return Err(MonitorError::Unavailable {
                method: next.to_string(),
                reason: "not supported on this host".to_string(),
            });
        }

        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = *active;
        *active = next;
        tracing::info!(from = %previous, to = %next, "Process monitor method switched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switches_between_known_methods() {
        let monitor = MethodSwitch::default();
        monitor.reconfigure("ebpf").unwrap();
        assert_eq!(monitor.method(), "ebpf");
    }

    #[test]
    fn unknown_method_keeps_previous() {
        let monitor = MethodSwitch::new(MonitorMethod::Audit);
        let err = monitor.reconfigure("kprobe").unwrap_err();
        assert!(matches!(err, MonitorError::UnknownMethod(ref m) if m == "kprobe"));
        assert_eq!(monitor.active(), MonitorMethod::Audit);
    }

    #[test]
    fn unavailable_method_is_rejected() {
        let monitor = MethodSwitch::with_available(MonitorMethod::Proc, vec![MonitorMethod::Proc]);
        assert!(matches!(
            monitor.reconfigure("ebpf"),
            Err(MonitorError::Unavailable { .. })
        ));
        assert_eq!(monitor.method(), "proc");
    }
}
