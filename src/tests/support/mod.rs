// Shared test support code for integration tests.
// This module provides common utilities that all test files can use.

pub mod harness;

pub use harness::{free_port, test_settings, Daemon};
