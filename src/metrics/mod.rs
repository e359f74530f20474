//! Prometheus metrics functionality.
//!
//! Metrics organization:
//! - Commit request metrics: meter (commitd_commit_requests_total, etc.)
//! - Process metrics: metrics-process (process_resident_memory_bytes, process_cpu_*, etc.)
//!
//! The scrape endpoint runs on its own listener, separate from the rpc
//! server.

pub mod meter;
pub mod server;

#[cfg(test)]
mod server_test;

// Re-export commonly used items
pub use meter::*;
pub use server::{init_exporter, Server, PROMETHEUS_METRICS_PATH};
