//! Operator alerts.
//!
//! Recoverable failures are reported to the operator UI as alerts. Alerts are
//! queued until the UI link drains them; the queue is bounded and drops the
//! oldest entry when full.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

/// Alert channel driven by the applier.
pub trait AlertSink: Send + Sync {
    fn send_warning(&self, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Alert {
    pub id: u64,
    pub kind: AlertKind,
    pub text: String,
    pub created: SystemTime,
}

/// Bounded in-memory alert queue.
#[derive(Debug)]
pub struct AlertQueue {
    pending: Mutex<VecDeque<Alert>>,
    capacity: usize,
    next_id: AtomicU64,
}

impl AlertQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn push(&self, kind: AlertKind, text: &str) {
        let alert = Alert {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            kind,
            text: text.to_string(),
            created: SystemTime::now(),
        };
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.len() == self.capacity {
            pending.pop_front();
        }
        pending.push_back(alert);
        metrics::counter!("alerts_total").increment(1);
    }

    /// Take every queued alert, oldest first.
    pub fn drain(&self) -> Vec<Alert> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AlertQueue {
    fn default() -> Self {
        Self::new(32)
    }
}

impl AlertSink for AlertQueue {
    fn send_warning(&self, text: &str) {
        self.push(AlertKind::Warning, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_order() {
        let queue = AlertQueue::default();
        queue.send_warning("first");
        queue.push(AlertKind::Error, "second");

        let alerts = queue.drain();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].text, "first");
        assert_eq!(alerts[0].kind, AlertKind::Warning);
        assert!(alerts[0].id < alerts[1].id);
        assert!(queue.is_empty());
    }

    #[test]
    fn drops_oldest_when_full() {
        let queue = AlertQueue::new(2);
        for text in ["a", "b", "c"] {
            queue.send_warning(text);
        }
        let texts: Vec<_> = queue.drain().into_iter().map(|a| a.text).collect();
        assert_eq!(texts, vec!["b", "c"]);
    }
}
