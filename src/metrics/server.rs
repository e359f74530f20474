//! Metrics endpoint server.

use anyhow::{Context, Result};
use axum::{http::StatusCode, routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ListenSpec;
use crate::metrics::meter;

pub const PROMETHEUS_METRICS_PATH: &str = "/metrics";

/// Global Prometheus handle for rendering metrics.
/// We build first to get the handle, then install the recorder separately.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initializes the Prometheus metrics exporter.
/// Must be called BEFORE the tokio runtime starts to avoid runtime conflicts.
///
/// Safe to call more than once: the first call installs the global recorder,
/// every call returns the same render handle.
pub fn init_exporter() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();

            if metrics::set_global_recorder(recorder).is_err() {
                eprintln!("Warning: global metrics recorder already installed");
                eprintln!("Recorded values may not appear on the metrics endpoint");
            }

            // Register process metrics (CPU, RSS) and describe our own series
            metrics_process::Collector::default().describe();
            metrics::describe_counter!(
                meter::COMMIT_REQUESTS_TOTAL,
                "Finished commit requests by terminal status"
            );
            metrics::describe_histogram!(
                meter::COMMIT_REQUEST_DURATION_SECONDS,
                metrics::Unit::Seconds,
                "Wall time spent serving one commit request"
            );
            metrics::describe_counter!(meter::COMMIT_FAILURES_TOTAL, "Failed commit requests");
            metrics::describe_counter!(
                meter::ASKPASS_REQUESTS_TOTAL,
                "Credential lookups served over the askpass socket"
            );

            handle
        })
        .clone()
}

/// Serves the Prometheus scrape endpoint on its own listener.
pub struct Server {
    handle: PrometheusHandle,
}

impl Server {
    /// Creates a new metrics server around an exporter render handle.
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Builds the router for the scrape endpoint.
    pub fn handler(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            PROMETHEUS_METRICS_PATH,
            get(move || {
                let handle = handle.clone();
                async move {
                    // Refresh process gauges on every scrape
                    metrics_process::Collector::default().collect();
                    (
                        StatusCode::OK,
                        [("content-type", "text/plain; charset=utf-8")],
                        handle.render(),
                    )
                }
            }),
        )
    }

    // Recording facade handed to the rpc service. The underlying series
    // live in the global recorder.

    pub fn add_commit_request(&self, status: &'static str) {
        meter::add_commit_request(status);
    }

    pub fn observe_commit_duration(&self, seconds: f64) {
        meter::observe_commit_duration(seconds);
    }

    pub fn add_commit_failure(&self) {
        meter::add_commit_failure();
    }

    /// Binds the metrics listener and serves scrapes until the process dies.
    /// Any bind or serve error is returned to the caller, where it is fatal.
    pub async fn serve(&self, spec: &ListenSpec) -> Result<()> {
        let addr = spec.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind metrics listener on {}", addr))?;

        let local_addr = listener
            .local_addr()
            .context("failed to read metrics listener address")?;
        info!(
            component = "metrics",
            event = "started",
            addr = %local_addr,
            "metrics server listening"
        );

        axum::serve(listener, self.handler())
            .await
            .context("metrics server failed")?;
        Ok(())
    }
}
