//! Integration tests for the commit daemon.
//!
//! End-to-end cases that boot the full orchestrator on ephemeral ports and
//! drive it over HTTP and the askpass socket.

mod cases_askpass_test;
mod cases_bootstrap_test;

pub mod support;
