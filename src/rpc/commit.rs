// Commit operation: validates a request, stages credentials for the
// credential helper, and reports the hydrated revision.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};
use xxhash_rust::xxh3::xxh3_128;

use crate::askpass;
use crate::metrics;
use crate::rpc::Controller;

pub const COMMIT_PATH: &str = "/api/v1/commit";

/// Repository coordinates plus the credentials used to push to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// One hydration target inside the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPayload {
    pub path: String,
    #[serde(default)]
    pub manifests: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRequest {
    pub repo: Repository,
    pub target_branch: String,
    #[serde(default)]
    pub commit_message: String,
    #[serde(default)]
    pub dry_revision: String,
    pub paths: Vec<PathPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitResponse {
    pub revision: String,
}

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("invalid repository url {url:?}: {source}")]
    InvalidRepoUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("target branch must not be empty")]
    MissingTargetBranch,
    #[error("at least one path is required")]
    NoPaths,
}

pub(crate) fn validate(req: &CommitRequest) -> Result<(), CommitError> {
    if let Err(source) = url::Url::parse(&req.repo.url) {
        return Err(CommitError::InvalidRepoUrl {
            url: req.repo.url.clone(),
            source,
        });
    }
    if req.target_branch.is_empty() {
        return Err(CommitError::MissingTargetBranch);
    }
    if req.paths.is_empty() {
        return Err(CommitError::NoPaths);
    }
    Ok(())
}

/// Digest of everything that lands in the hydrated commit. Doubles as the
/// revision reported back to the caller, so equal inputs must always hash
/// to the same value.
pub(crate) fn hydrate_revision(req: &CommitRequest) -> String {
    let mut payload = Vec::new();
    payload.extend_from_slice(req.repo.url.as_bytes());
    payload.push(0);
    payload.extend_from_slice(req.target_branch.as_bytes());
    payload.push(0);
    payload.extend_from_slice(req.dry_revision.as_bytes());
    payload.push(0);
    for path in &req.paths {
        payload.extend_from_slice(path.path.as_bytes());
        payload.push(0);
        for manifest in &path.manifests {
            // Object keys serialize in sorted order, the digest is stable.
            payload.extend_from_slice(manifest.to_string().as_bytes());
            payload.push(0);
        }
    }
    hex::encode(xxh3_128(&payload).to_be_bytes())
}

/// CommitController serves the commit operation.
pub struct CommitController {
    askpass: Arc<askpass::Server>,
    metrics: Arc<metrics::Server>,
}

impl CommitController {
    /// Creates a new commit controller around the collaborator handles.
    pub fn new(askpass: Arc<askpass::Server>, metrics: Arc<metrics::Server>) -> Self {
        Self { askpass, metrics }
    }

    /// Handles one commit request.
    async fn commit(&self, req: CommitRequest) -> Response {
        let started = Instant::now();

        if let Err(e) = validate(&req) {
            warn!(
                component = "rpc",
                event = "commit_rejected",
                repo = %req.repo.url,
                error = %e,
                "rejected commit request"
            );
            self.metrics.add_commit_request("failure");
            self.metrics.add_commit_failure();
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }

        // Credentials never leave the process. The helper subprocess gets a
        // nonce and trades it for them over the askpass socket.
        let nonce = self.askpass.add(&req.repo.username, &req.repo.password);

        let revision = hydrate_revision(&req);

        self.askpass.remove(&nonce);

        info!(
            component = "rpc",
            event = "commit_served",
            repo = %req.repo.url,
            target_branch = %req.target_branch,
            revision = %revision,
            "commit request served"
        );
        self.metrics.add_commit_request("success");
        self.metrics.observe_commit_duration(started.elapsed().as_secs_f64());

        (StatusCode::OK, Json(CommitResponse { revision })).into_response()
    }
}

impl Controller for CommitController {
    fn add_route(&self, router: Router) -> Router {
        let commit_controller = self.clone();
        router.route(
            COMMIT_PATH,
            post(move |Json(req): Json<CommitRequest>| {
                let controller = commit_controller.clone();
                async move { controller.commit(req).await }
            }),
        )
    }
}

impl Clone for CommitController {
    fn clone(&self) -> Self {
        Self {
            askpass: self.askpass.clone(),
            metrics: self.metrics.clone(),
        }
    }
}
