//! RPC server composition and foreground serving.

use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::askpass;
use crate::metrics;
use crate::rpc::commit::CommitController;
use crate::rpc::health::HealthController;
use crate::rpc::version::{VersionController, VersionInfo};

/// Trait for adding routes to the rpc router. Every endpoint of the rpc
/// surface is one controller registering itself here.
pub trait Controller: Send + Sync {
    /// Adds routes to the router.
    fn add_route(&self, router: Router) -> Router;
}

/// RPC server for the commit service.
pub struct Server {
    askpass: Arc<askpass::Server>,
    metrics: Arc<metrics::Server>,
}

impl Server {
    /// Wires the collaborator handles into the rpc service.
    pub fn new(askpass: Arc<askpass::Server>, metrics: Arc<metrics::Server>) -> Self {
        Self { askpass, metrics }
    }

    /// Builds the rpc router with all controllers.
    pub fn handler(&self) -> Router {
        let controllers: Vec<Box<dyn Controller>> = vec![
            // Readiness endpoint
            Box::new(HealthController::new()),
            // Build identity endpoint
            Box::new(VersionController::new(VersionInfo::current())),
            // Main commit handler
            Box::new(CommitController::new(
                self.askpass.clone(),
                self.metrics.clone(),
            )),
        ];

        let mut router = Router::new();
        for controller in controllers {
            router = controller.add_route(router);
        }

        router
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(30)))
    }

    /// Serves rpc requests on an already-bound listener until the process
    /// dies. Binding the listener is the caller's job.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener
            .local_addr()
            .context("failed to read rpc listener address")?;
        info!(
            component = "rpc",
            event = "started",
            addr = %local_addr,
            "rpc server listening"
        );

        axum::serve(listener, self.handler())
            .await
            .context("rpc server failed")?;
        Ok(())
    }
}
