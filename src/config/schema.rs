//! Configuration schema definitions.
//!
//! This module defines the on-disk configuration document of the daemon and
//! the patch type it is decoded into. Keys follow the persisted format
//! (PascalCase, nested `Server` and `Stats` objects).
//!
//! Every field uses its zero value to mean "no change requested". Decoding
//! goes through [`ConfigPatch`], so a document only overwrites the keys it
//! actually contains and the rest of the stored configuration survives.
//!
//! Key matching is case-insensitive (`logLevel` and `LOGLEVEL` both set
//! `LogLevel`). When a document carries several spellings of one key, the
//! exact spelling wins.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root configuration held by the [`ConfigStore`](crate::config::ConfigStore).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Configuration {
    /// Connection to the operator UI and the daemon's own log file.
    pub server: ServerConfig,

    /// Action applied by the sentinel rules (e.g. "allow", "deny").
    pub default_action: String,

    /// Duration applied by the sentinel rules (e.g. "once", "always").
    pub default_duration: String,

    /// Intercept connections whose owning process cannot be resolved.
    pub intercept_unknown: bool,

    /// Process monitoring strategy ("proc", "ebpf", "audit").
    pub proc_monitor_method: String,

    /// Numeric log level. `None` leaves the current level untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<u32>,

    /// Timestamps in UTC instead of local time.
    #[serde(rename = "LogUTC")]
    pub log_utc: bool,

    /// Timestamps with microsecond precision.
    pub log_micro: bool,

    /// Firewall backend name.
    pub firewall: String,

    /// Statistics buffer sizing.
    pub stats: StatsConfig,
}

/// `Server` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ServerConfig {
    /// UI address, either `host:port` or `unix:///path/to.sock`.
    pub address: String,

    /// Path of the daemon log file.
    pub log_file: String,
}

/// `Stats` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct StatsConfig {
    pub max_events: u32,
    pub max_stats: u32,
    pub workers: u32,
}

/// A decoded document where every key is optional.
///
/// `null` and missing keys both decode to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ConfigPatch {
    pub server: Option<ServerPatch>,
    pub default_action: Option<String>,
    pub default_duration: Option<String>,
    pub intercept_unknown: Option<bool>,
    pub proc_monitor_method: Option<String>,
    pub log_level: Option<u32>,
    #[serde(rename = "LogUTC")]
    pub log_utc: Option<bool>,
    pub log_micro: Option<bool>,
    pub firewall: Option<String>,
    pub stats: Option<StatsPatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ServerPatch {
    pub address: Option<String>,
    pub log_file: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct StatsPatch {
    pub max_events: Option<u32>,
    pub max_stats: Option<u32>,
    pub workers: Option<u32>,
}

const ROOT_KEYS: &[&str] = &[
    "Server",
    "DefaultAction",
    "DefaultDuration",
    "InterceptUnknown",
    "ProcMonitorMethod",
    "LogLevel",
    "LogUTC",
    "LogMicro",
    "Firewall",
    "Stats",
];
const SERVER_KEYS: &[&str] = &["Address", "LogFile"];
const STATS_KEYS: &[&str] = &["MaxEvents", "MaxStats", "Workers"];

/// Rename keys that match a known key ignoring ASCII case.
fn fold_keys(object: &mut Map<String, Value>, known: &[&str]) {
    let folded: Vec<String> = object
        .keys()
        .filter(|key| !known.contains(&key.as_str()))
        .cloned()
        .collect();

    for key in folded {
        let Some(canonical) = known.iter().find(|k| k.eq_ignore_ascii_case(&key)) else {
            continue;
        };
        if let Some(value) = object.remove(&key) {
            object.entry(*canonical).or_insert(value);
        }
    }
}

impl ConfigPatch {
    /// Decode a raw document.
    pub fn from_slice(raw: &[u8]) -> Result<Self, serde_json::Error> {
        let mut doc: Value = serde_json::from_slice(raw)?;
        if let Value::Object(root) = &mut doc {
            fold_keys(root, ROOT_KEYS);
            for (section, keys) in [("Server", SERVER_KEYS), ("Stats", STATS_KEYS)] {
                if let Some(Value::Object(inner)) = root.get_mut(section) {
                    fold_keys(inner, keys);
                }
            }
        }
        serde_json::from_value(doc)
    }
}

/// Overwrite `slot` only when the patch carries a value.
fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

impl Configuration {
    /// Merge a decoded document into this configuration.
    ///
    /// Keys present in the document replace the stored values, nested
    /// sections merge field by field, and absent keys are left alone.
    pub fn merge(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            set(&mut self.server.address, server.address);
            set(&mut self.server.log_file, server.log_file);
        }
        set(&mut self.default_action, patch.default_action);
        set(&mut self.default_duration, patch.default_duration);
        set(&mut self.intercept_unknown, patch.intercept_unknown);
        set(&mut self.proc_monitor_method, patch.proc_monitor_method);
        if patch.log_level.is_some() {
            self.log_level = patch.log_level;
        }
        set(&mut self.log_utc, patch.log_utc);
        set(&mut self.log_micro, patch.log_micro);
        set(&mut self.firewall, patch.firewall);
        if let Some(stats) = patch.stats {
            set(&mut self.stats.max_events, stats.max_events);
            set(&mut self.stats.max_stats, stats.max_stats);
            set(&mut self.stats.workers, stats.workers);
        }
    }
}
