//! Credential helper server over a unix domain socket.
//!
//! The wire protocol is one JSON object per line in each direction. The
//! helper sends `{"nonce":"..."}` and receives either the credentials or
//! an error message. Nothing here ever touches disk or the environment.

use anyhow::{Context, Result};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{info, warn};

use crate::metrics::meter;

/// Credentials registered for one in-flight commit request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CredentialRequest {
    nonce: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Error)]
pub enum AskpassError {
    #[error("failed to bind askpass socket {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to accept askpass connection: {0}")]
    Accept(#[source] std::io::Error),
}

/// In-memory credential store plus the unix socket server that exposes it.
pub struct Server {
    socket_path: PathBuf,
    creds: DashMap<String, Credentials>,
}

impl Server {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            creds: DashMap::new(),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Registers credentials and returns the nonce the helper must present.
    pub fn add(&self, username: &str, password: &str) -> String {
        let nonce = hex::encode(rand::random::<[u8; 16]>());
        self.creds.insert(
            nonce.clone(),
            Credentials {
                username: username.to_string(),
                password: password.to_string(),
            },
        );
        nonce
    }

    /// Looks up credentials by nonce.
    pub fn get(&self, nonce: &str) -> Option<Credentials> {
        self.creds.get(nonce).map(|entry| entry.value().clone())
    }

    /// Forgets the credentials registered under a nonce.
    pub fn remove(&self, nonce: &str) {
        self.creds.remove(nonce);
    }

    /// Binds the socket and serves credential lookups until the process dies.
    ///
    /// A leftover socket file from a previous run makes the bind fail and the
    /// failure is returned to the caller, where it is fatal. The daemon never
    /// unlinks the path: another instance may still be serving it.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let listener = UnixListener::bind(&self.socket_path).map_err(|source| AskpassError::Bind {
            path: self.socket_path.clone(),
            source,
        })?;

        // Only the owning user may talk to the credential helper.
        std::fs::set_permissions(&self.socket_path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| {
                format!(
                    "failed to restrict permissions on {}",
                    self.socket_path.display()
                )
            })?;

        info!(
            component = "askpass",
            event = "started",
            path = %self.socket_path.display(),
            "askpass server listening"
        );

        loop {
            let (stream, _) = listener.accept().await.map_err(AskpassError::Accept)?;
            let server = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = server.handle_connection(stream).await {
                    warn!(
                        component = "askpass",
                        event = "request_failed",
                        error = %e,
                        "failed to serve credential request"
                    );
                }
            });
        }
    }

    async fn handle_connection(&self, stream: UnixStream) -> Result<()> {
        let mut stream = BufReader::new(stream);
        let mut line = String::new();
        stream
            .read_line(&mut line)
            .await
            .context("failed to read credential request")?;

        meter::add_askpass_request();

        let reply = match serde_json::from_str::<CredentialRequest>(&line) {
            Ok(request) => match self.get(&request.nonce) {
                Some(creds) => CredentialReply {
                    username: Some(creds.username),
                    password: Some(creds.password),
                    error: None,
                },
                // The nonce is never echoed back, it is as secret as the password.
                None => CredentialReply {
                    error: Some("unknown nonce".to_string()),
                    ..Default::default()
                },
            },
            Err(e) => CredentialReply {
                error: Some(format!("malformed credential request: {}", e)),
                ..Default::default()
            },
        };

        let mut payload = serde_json::to_vec(&reply).context("failed to encode credential reply")?;
        payload.push(b'\n');
        stream
            .get_mut()
            .write_all(&payload)
            .await
            .context("failed to write credential reply")?;
        Ok(())
    }
}

/// Fetches credentials for a nonce over the askpass socket.
/// This is the client half, used by the credential helper subprocess.
pub async fn fetch(socket_path: impl AsRef<Path>, nonce: &str) -> Result<Credentials> {
    let socket_path = socket_path.as_ref();
    let stream = UnixStream::connect(socket_path)
        .await
        .with_context(|| format!("failed to connect to askpass socket {}", socket_path.display()))?;
    let mut stream = BufReader::new(stream);

    let mut payload = serde_json::to_vec(&CredentialRequest {
        nonce: nonce.to_string(),
    })
    .context("failed to encode credential request")?;
    payload.push(b'\n');
    stream
        .get_mut()
        .write_all(&payload)
        .await
        .context("failed to send credential request")?;

    let mut line = String::new();
    stream
        .read_line(&mut line)
        .await
        .context("failed to read credential reply")?;

    let reply: CredentialReply =
        serde_json::from_str(&line).context("failed to decode credential reply")?;
    if let Some(error) = reply.error {
        anyhow::bail!("askpass request rejected: {}", error);
    }
    match (reply.username, reply.password) {
        (Some(username), Some(password)) => Ok(Credentials { username, password }),
        _ => anyhow::bail!("askpass reply is missing credentials"),
    }
}
