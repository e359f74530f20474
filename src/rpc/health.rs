// Health endpoint for the rpc server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::rpc::Controller;

pub const HEALTH_PATH: &str = "/healthz";

const HEALTHY_RESPONSE: &str = r#"{
  "status": 200,
  "message": "serving"
}"#;

/// HealthController answers readiness checks on the rpc listener.
///
/// The daemon has no degraded mode: once the listeners are up the process
/// either serves or has already exited, so the answer is always healthy.
#[derive(Clone)]
pub struct HealthController;

impl HealthController {
    /// Creates a new health controller.
    pub fn new() -> Self {
        Self
    }

    /// Handles the health request.
    async fn health(&self) -> Response {
        (
            StatusCode::OK,
            [("content-type", "application/json")],
            HEALTHY_RESPONSE,
        )
            .into_response()
    }
}

impl Default for HealthController {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for HealthController {
    fn add_route(&self, router: Router) -> Router {
        let health_controller = self.clone();
        router.route(
            HEALTH_PATH,
            get(move || {
                let controller = health_controller.clone();
                async move { controller.health().await }
            }),
        )
    }
}
