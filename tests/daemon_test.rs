//! End-to-end: the composed daemon with the platform file notifier.

use std::sync::Arc;
use std::time::Duration;

use sentineld::client::connection::LinkState;
use sentineld::config::LoadOutcome;
use sentineld::lifecycle::Daemon;
use sentineld::procmon::MonitorMethod;
use tokio::runtime::Handle;

mod common;

use common::RecordingLog;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn external_edits_are_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("default-config.json");
    std::fs::write(
        &path,
        r#"{
            "Server": { "Address": "unix:///tmp/osui.sock" },
            "DefaultAction": "allow",
            "ProcMonitorMethod": "proc"
        }"#,
    )
    .unwrap();

    let log = Arc::new(RecordingLog::default());
    let daemon = Daemon::build(&path, log, Handle::current()).unwrap();
    assert_eq!(daemon.start().await, LoadOutcome::Applied);
    assert_eq!(daemon.connection.socket_path(), "/tmp/osui.sock");
    assert!(daemon.loader.watcher().is_running());

    daemon
        .persister
        .save(r#"{ "DefaultAction": "deny", "ProcMonitorMethod": "ebpf" }"#)
        .unwrap();

    let store = daemon.store.clone();
    let applied = || store.read().default_action == "deny";
    assert!(common::wait_for(Duration::from_secs(10), applied).await);
    assert_eq!(daemon.rules.disconnected().action, "deny");
    assert_eq!(daemon.monitor.active(), MonitorMethod::Ebpf);
    assert_eq!(daemon.store.read().server.address, "unix:///tmp/osui.sock");

    std::fs::write(&path, r#"{ "DefaultAction": "#).unwrap();
    let alerts = daemon.alerts.clone();
    assert!(common::wait_for(Duration::from_secs(10), || !alerts.is_empty()).await);
    assert_eq!(daemon.store.read().default_action, "deny");

    daemon.shutdown.trigger();
    let loader = daemon.loader.clone();
    assert!(common::wait_for(Duration::from_secs(5), || !loader.watcher().is_running()).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_file_runs_on_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");

    let log = Arc::new(RecordingLog::default());
    let daemon = Daemon::build(&path, log, Handle::current()).unwrap();
    assert_eq!(daemon.start().await, LoadOutcome::Skipped);
    assert!(!daemon.loader.watcher().is_running());
    assert_eq!(daemon.poller.state(), LinkState::Disconnected);
    assert_eq!(daemon.rules.disconnected().action, "allow");

    daemon.shutdown.trigger();
}
