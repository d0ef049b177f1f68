//! Integration tests for mystery
//!
//! These tests run real programs and require `python3` on the host PATH.
//! Run with: cargo test -p mystery --features integration-tests

#![cfg(feature = "integration-tests")]

use std::fs;

use mystery::Config;

mod config_loading;
mod endpoint;
mod execution;

const FIXTURES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

/// Helper to get fixture file content
pub(crate) fn fixture_source(name: &str) -> String {
    let path = format!("{FIXTURES_PATH}/sources/{name}");
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read fixture {path}: {e}"))
}

/// Path of a config fixture
pub(crate) fn fixture_config(name: &str) -> String {
    format!("{FIXTURES_PATH}/configs/{name}")
}

/// The built-in configuration, which runs the host's python3
pub(crate) fn test_config() -> Config {
    Config::default()
}
