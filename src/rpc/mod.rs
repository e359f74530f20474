//! Commit rpc service.
//!
//! The rpc listener is the primary surface of the daemon: the commit
//! operation plus health and version endpoints, served over HTTP on the
//! main listener. The orchestrator owns the TCP bind so that a bind
//! failure surfaces before anything is reported as started.

pub mod commit;
pub mod health;
pub mod server;
pub mod version;


// Re-export main types
pub use server::{Controller, Server};
