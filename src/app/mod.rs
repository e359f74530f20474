//! Process orchestrator.
//!
//! Brings up the three endpoints (rpc, metrics, askpass) and supervises
//! them. There is no restart policy: the first endpoint to fail, or to
//! return at all, takes the whole process down with it.

use anyhow::{anyhow, Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::error;

use crate::askpass;
use crate::config::Settings;
use crate::metrics;
use crate::rpc;
use crate::rpc::version::VersionInfo;

/// Runs the daemon until the first endpoint dies.
///
/// The prometheus exporter must already be installed; the render handle
/// comes in from the pre-runtime initialization.
pub async fn bootstrap(settings: Settings, metrics_handle: PrometheusHandle) -> Result<()> {
    if let Err(err) = run_endpoints(settings, metrics_handle).await {
        error!(
            component = "app",
            event = "fatal",
            error = %err,
            "endpoint terminated, shutting down"
        );
        return Err(err);
    }
    Ok(())
}

async fn run_endpoints(settings: Settings, metrics_handle: PrometheusHandle) -> Result<()> {
    VersionInfo::current().log_startup_info(settings.rpc.port);

    let metrics_server = Arc::new(metrics::Server::new(metrics_handle));
    let askpass_server = Arc::new(askpass::Server::new(settings.askpass_socket.clone()));
    let rpc_server = rpc::Server::new(askpass_server.clone(), metrics_server.clone());

    // Every serving loop lands in one JoinSet, so the first terminal
    // outcome wins no matter which endpoint produced it.
    let mut endpoints: JoinSet<(&'static str, Result<()>)> = JoinSet::new();

    let metrics_spec = settings.metrics.clone();
    endpoints.spawn(async move { ("metrics", metrics_server.serve(&metrics_spec).await) });

    endpoints.spawn(async move { ("askpass", askpass_server.run().await) });

    // The rpc bind stays on the main path: an occupied port must surface
    // before the daemon reports itself as serving.
    let rpc_addr = settings.rpc.addr();
    let listener = TcpListener::bind(&rpc_addr)
        .await
        .with_context(|| format!("failed to bind rpc listener on {}", rpc_addr))?;

    endpoints.spawn(async move { ("rpc", rpc_server.serve(listener).await) });

    // None of the serving loops returns during normal operation, so any
    // finished task means the daemon is done for.
    let outcome = endpoints
        .join_next()
        .await
        .ok_or_else(|| anyhow!("endpoint supervisor has nothing to watch"))?;

    Err(match outcome {
        Ok((endpoint, Err(e))) => e.context(format!("{} endpoint failed", endpoint)),
        Ok((endpoint, Ok(()))) => anyhow!("{} endpoint exited unexpectedly", endpoint),
        Err(join_error) => anyhow!("endpoint task panicked: {}", join_error),
    })
}
