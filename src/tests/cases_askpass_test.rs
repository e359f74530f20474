// Integration tests for the credential helper endpoint of a live daemon.

use crate::askpass;
use crate::tests::support::Daemon;

/// Test that the socket of a running daemon speaks the helper protocol
/// end-to-end and rejects nonces it never staged.
#[tokio::test]
async fn test_askpass_socket_answers_on_live_daemon() {
    let daemon = Daemon::start().await;

    let err = askpass::fetch(&daemon.socket_path, "deadbeef")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unknown nonce"));
}

/// Test that a finished commit leaves no retrievable credentials behind.
#[tokio::test]
async fn test_commit_leaves_no_credentials_behind() {
    let daemon = Daemon::start().await;
    let client = reqwest::Client::new();

    let body = serde_json::json!({
        "repo": {
            "url": "https://git.example.com/org/deployments.git",
            "username": "git",
            "password": "hunter2",
        },
        "target_branch": "env/production",
        "paths": [ { "path": "apps/guestbook" } ],
    });
    let resp = client
        .post(format!("{}/api/v1/commit", daemon.rpc_base))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // The nonce died with the request, so any guess must come back rejected.
    let err = askpass::fetch(&daemon.socket_path, "0000000000000000")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unknown nonce"));
}
