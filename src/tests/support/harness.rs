// Daemon bootstrap harness for integration tests.
//
// Each test boots the full orchestrator on its own ephemeral ports and a
// private askpass socket directory, then polls readiness over HTTP. Cases
// run in parallel without sharing listeners or socket paths.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app;
use crate::config::{ListenSpec, LogFormat, LogLevel, LogSettings, Settings};
use crate::metrics;

/// Picks a free TCP port by binding to zero and letting the OS choose.
pub fn free_port() -> u16 {
    let probe =
        std::net::TcpListener::bind("127.0.0.1:0").expect("failed to probe for a free port");
    probe
        .local_addr()
        .expect("failed to read probe address")
        .port()
}

/// Builds loopback settings for one test daemon.
pub fn test_settings(rpc_port: u16, metrics_port: u16, socket_path: &Path) -> Settings {
    Settings {
        rpc: ListenSpec {
            host: "127.0.0.1".to_string(),
            port: rpc_port,
        },
        metrics: ListenSpec {
            host: "127.0.0.1".to_string(),
            port: metrics_port,
        },
        log: LogSettings {
            format: LogFormat::Text,
            level: LogLevel::Info,
        },
        askpass_socket: socket_path.to_path_buf(),
    }
}

/// One daemon instance bootstrapped for a single test.
pub struct Daemon {
    pub rpc_base: String,
    pub metrics_base: String,
    pub socket_path: PathBuf,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
    _workdir: tempfile::TempDir,
}

impl Daemon {
    /// Boots the full daemon on ephemeral ports and waits until both HTTP
    /// listeners answer.
    pub async fn start() -> Self {
        let workdir = tempfile::tempdir().expect("failed to create daemon workdir");
        let socket_path = workdir.path().join("askpass.sock");

        let rpc_port = free_port();
        let metrics_port = free_port();
        let settings = test_settings(rpc_port, metrics_port, &socket_path);

        let handle = tokio::spawn(app::bootstrap(settings, metrics::init_exporter()));

        let daemon = Self {
            rpc_base: format!("http://127.0.0.1:{}", rpc_port),
            metrics_base: format!("http://127.0.0.1:{}", metrics_port),
            socket_path,
            handle,
            _workdir: workdir,
        };
        daemon.wait_ready().await;
        daemon
    }

    // Wait for the daemon to become alive by checking both endpoints
    async fn wait_ready(&self) {
        let health_url = format!("{}/healthz", self.rpc_base);
        let metrics_url = format!("{}/metrics", self.metrics_base);
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);

        while tokio::time::Instant::now() < deadline {
            let health_ok = matches!(reqwest::get(&health_url).await, Ok(resp) if resp.status().is_success());
            let metrics_ok = matches!(reqwest::get(&metrics_url).await, Ok(resp) if resp.status().is_success());
            if health_ok && metrics_ok {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("timed out waiting for daemon to become ready");
    }

    /// True when the supervising task has finished, i.e. the daemon died.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
