//! Git credential helper service.
//!
//! Subordinate git processes authenticate through a unix domain socket
//! instead of receiving credentials on their command line or environment.
//! The rpc server registers credentials under a one-time nonce before it
//! shells out, the helper presents that nonce to look them up, and the
//! entry is removed as soon as the commit request finishes.

pub mod server;


pub use server::{fetch, AskpassError, Credentials, Server};

/// Well-known socket path the credential helper connects to.
pub const SOCKET_PATH: &str = "/tmp/commitd-askpass.sock";
