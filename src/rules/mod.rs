//! Sentinel rule templates.
//!
//! Two rules are applied automatically by the daemon: one while the UI
//! connection is down and one when the UI connection fails with an internal
//! error. Their action and duration are operator-configurable defaults.
//!
//! # Design Decisions
//! - Each template sits in an `ArcSwap` so the verdict path reads it without
//!   locking; updates publish a fresh `Rule`
//! - Values are stored as given; the rule engine interprets them

use arc_swap::ArcSwap;
use std::sync::Arc;

/// Name of the template used while the UI is disconnected.
pub const DISCONNECTED_RULE: &str = "ui.client.disconnected";

/// Name of the template used on an internal UI connection error.
pub const INTERNAL_ERROR_RULE: &str = "ui.client.error";

/// A rule template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub action: String,
    pub duration: String,
}

impl Rule {
    fn template(name: &str) -> Self {
        Self {
            name: name.to_string(),
            action: "allow".to_string(),
            duration: "once".to_string(),
        }
    }
}

/// The two sentinel templates.
#[derive(Debug)]
pub struct RuleTemplates {
    disconnected: ArcSwap<Rule>,
    internal_error: ArcSwap<Rule>,
}

impl RuleTemplates {
    pub fn new() -> Self {
        Self {
            disconnected: ArcSwap::from_pointee(Rule::template(DISCONNECTED_RULE)),
            internal_error: ArcSwap::from_pointee(Rule::template(INTERNAL_ERROR_RULE)),
        }
    }

    /// Template applied while the UI is disconnected.
    pub fn disconnected(&self) -> Arc<Rule> {
        self.disconnected.load_full()
    }

    /// Template applied on an internal UI error.
    pub fn internal_error(&self) -> Arc<Rule> {
        self.internal_error.load_full()
    }

    /// Overwrite the action of both templates.
    pub fn set_default_action(&self, action: &str) {
        self.update(|rule| rule.action = action.to_string());
    }

    /// Overwrite the duration of both templates.
    pub fn set_default_duration(&self, duration: &str) {
        self.update(|rule| rule.duration = duration.to_string());
    }

    fn update(&self, f: impl Fn(&mut Rule)) {
        for slot in [&self.disconnected, &self.internal_error] {
            slot.rcu(|current| {
                let mut rule = Rule::clone(current);
                f(&mut rule);
                rule
            });
        }
    }
}

impl Default for RuleTemplates {
    fn default() -> Self {
        Self::new()
    }
}
