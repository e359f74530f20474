// Version endpoint and startup identification.

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::rpc::Controller;

pub const VERSION_PATH: &str = "/api/version";

/// Build identity of the running daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
}

impl VersionInfo {
    /// Identity baked in at compile time.
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Logs the startup banner with the port the rpc server will take.
    pub fn log_startup_info(&self, port: u16) {
        info!(
            component = "app",
            event = "starting",
            name = %self.name,
            version = %self.version,
            port = port,
            "commit daemon starting"
        );
    }
}

/// VersionController reports the daemon build identity.
#[derive(Clone)]
pub struct VersionController {
    info: VersionInfo,
}

impl VersionController {
    /// Creates a new version controller.
    pub fn new(info: VersionInfo) -> Self {
        Self { info }
    }

    /// Handles the version request.
    async fn version(&self) -> Json<VersionInfo> {
        Json(self.info.clone())
    }
}

impl Controller for VersionController {
    fn add_route(&self, router: Router) -> Router {
        let version_controller = self.clone();
        router.route(
            VERSION_PATH,
            get(move || {
                let controller = version_controller.clone();
                async move { controller.version().await }
            }),
        )
    }
}
