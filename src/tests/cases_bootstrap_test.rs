// Integration tests for the daemon bootstrap path.

use std::time::Duration;

use crate::app;
use crate::metrics;
use crate::tests::support::{test_settings, Daemon};

/// Test that a freshly booted daemon serves all three endpoints.
#[tokio::test]
async fn test_bootstrap_reaches_serving() {
    let daemon = Daemon::start().await;

    // Readiness polling already proved both HTTP listeners answer. The
    // askpass socket has to be bound as well.
    assert!(daemon.socket_path.exists());
    assert!(!daemon.is_finished());
}

#[tokio::test]
async fn test_health_endpoint_answers() {
    let daemon = Daemon::start().await;

    let resp = reqwest::get(format!("{}/healthz", daemon.rpc_base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("serving"));
}

#[tokio::test]
async fn test_version_endpoint_reports_identity() {
    let daemon = Daemon::start().await;

    let resp = reqwest::get(format!("{}/api/version", daemon.rpc_base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let version: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(version["name"], "commitd");
    assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
}

/// Test that port zero asks the OS for an ephemeral port instead of dying.
#[tokio::test]
async fn test_port_zero_binds_ephemeral() {
    let workdir = tempfile::tempdir().unwrap();
    let socket_path = workdir.path().join("askpass.sock");

    let handle = tokio::spawn(app::bootstrap(
        test_settings(0, 0, &socket_path),
        metrics::init_exporter(),
    ));

    // The bound ports are unknowable from out here, so give the daemon a
    // moment and check it is still up with the socket in place.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!handle.is_finished());
    assert!(socket_path.exists());
}
