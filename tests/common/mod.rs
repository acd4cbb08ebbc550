//! Shared fakes and harness for integration tests.

#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sentineld::client::{ClientConnection, Transport};
use sentineld::config::{
    ChangeKind, Collaborators, ConfigApplier, ConfigError, ConfigLoader, ConfigStore, ConfigWatcher,
    WatchBackend,
};
use sentineld::lifecycle::Shutdown;
use sentineld::observability::{AlertSink, LogControl};
use sentineld::procmon::{MonitorError, ProcMonitor};
use sentineld::rules::RuleTemplates;
use tempfile::TempDir;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogCall {
    Level(u32),
    Utc(bool),
    Micro(bool),
    Close,
    Open(PathBuf),
}

#[derive(Default)]
pub struct RecordingLog {
    calls: Mutex<Vec<LogCall>>,
}

impl RecordingLog {
    pub fn calls(&self) -> Vec<LogCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: LogCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl LogControl for RecordingLog {
    fn set_level(&self, level: u32) {
        self.record(LogCall::Level(level));
    }

    fn set_utc(&self, utc: bool) {
        self.record(LogCall::Utc(utc));
    }

    fn set_micro(&self, micro: bool) {
        self.record(LogCall::Micro(micro));
    }

    fn close(&self) {
        self.record(LogCall::Close);
    }

    fn open_file(&self, path: &Path) -> io::Result<()> {
        self.record(LogCall::Open(path.to_path_buf()));
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingTransport {
    disconnects: AtomicUsize,
}

impl CountingTransport {
    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl Transport for CountingTransport {
    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeMonitor {
    method: Mutex<String>,
    requests: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl FakeMonitor {
    pub fn new(method: &str) -> Self {
        Self {
            method: Mutex::new(method.to_string()),
            requests: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl ProcMonitor for FakeMonitor {
    fn method(&self) -> String {
        self.method.lock().unwrap().clone()
    }

    fn reconfigure(&self, method: &str) -> Result<(), MonitorError> {
        self.requests.lock().unwrap().push(method.to_string());
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(MonitorError::Unavailable {
                method: method.to_string(),
                reason: "ebpf module not loaded".to_string(),
            });
        }
        *self.method.lock().unwrap() = method.to_string();
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAlerts {
    warnings: Mutex<Vec<String>>,
}

impl RecordingAlerts {
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }
}

impl AlertSink for RecordingAlerts {
    fn send_warning(&self, text: &str) {
        self.warnings.lock().unwrap().push(text.to_string());
    }
}

#[derive(Default)]
pub struct CountingBackend {
    registrations: AtomicUsize,
    fail: AtomicBool,
}

impl CountingBackend {
    pub fn failing() -> Self {
        Self {
            registrations: AtomicUsize::new(0),
            fail: AtomicBool::new(true),
        }
    }

    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }
}

impl WatchBackend for CountingBackend {
    fn register(&self, _path: &Path) -> Result<(), ConfigError> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ConfigError::Watch(notify::Error::generic("inotify limit reached")));
        }
        Ok(())
    }
}

/// A loader wired to fakes, storing its file in a temp directory.
pub struct Harness {
    pub dir: TempDir,
    pub path: PathBuf,
    pub store: Arc<ConfigStore>,
    pub loader: Arc<ConfigLoader>,
    pub log: Arc<RecordingLog>,
    pub transport: Arc<CountingTransport>,
    pub connection: Arc<ClientConnection>,
    pub rules: Arc<RuleTemplates>,
    pub monitor: Arc<FakeMonitor>,
    pub alerts: Arc<RecordingAlerts>,
    pub backend: Arc<CountingBackend>,
    pub events: mpsc::UnboundedSender<ChangeKind>,
    pub shutdown: Shutdown,
}

impl Harness {
    /// Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        Self::with_backend(CountingBackend::default())
    }

    pub fn with_backend(backend: CountingBackend) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default-config.json");

        let store = Arc::new(ConfigStore::new());
        let log = Arc::new(RecordingLog::default());
        let transport = Arc::new(CountingTransport::default());
        let connection = Arc::new(ClientConnection::new(transport.clone()));
        let rules = Arc::new(RuleTemplates::new());
        let monitor = Arc::new(FakeMonitor::new("proc"));
        let alerts = Arc::new(RecordingAlerts::default());
        let backend = Arc::new(backend);
        let shutdown = Shutdown::new();

        let applier = ConfigApplier::new(
            store.clone(),
            &path,
            Collaborators {
                log: log.clone(),
                connection: connection.clone(),
                rules: rules.clone(),
                monitor: monitor.clone(),
                alerts: alerts.clone(),
            },
        );
        let (events, rx) = mpsc::unbounded_channel();
        let watcher = ConfigWatcher::new(backend.clone(), rx, Handle::current(), shutdown.clone());
        let loader = ConfigLoader::new(&path, applier, watcher);

        Self {
            dir,
            path,
            store,
            loader,
            log,
            transport,
            connection,
            rules,
            monitor,
            alerts,
            backend,
            events,
            shutdown,
        }
    }

    pub fn write(&self, contents: &str) {
        std::fs::write(&self.path, contents).unwrap();
    }

    pub fn apply(&self, contents: &str) -> bool {
        self.loader.applier().apply(contents.as_bytes())
    }
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn wait_for(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
