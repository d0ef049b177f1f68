use std::time::Duration;

use mystery::{Config, Language};

use super::fixture_config;

#[test]
fn test_load_valid_config() {
    let config = Config::from_file(fixture_config("valid_full.toml")).expect("Failed to load config");

    assert_eq!(config.server.bind, "0.0.0.0:8080".parse().unwrap());
    assert!(!config.server.cors);
    assert_eq!(config.execution.timeout(), Duration::from_secs(2));
    assert_eq!(config.execution.max_output, 65536);

    let python = config.runtime(Language::Python).unwrap();
    assert_eq!(python.command, vec!["python3", "-I", "-u", "-c"]);
    assert_eq!(python.env.len(), 1);
    assert!(python.env.values().any(|value| value == "utf-8"));
}

#[test]
fn test_load_minimal_config() {
    let config =
        Config::from_file(fixture_config("valid_minimal.toml")).expect("Failed to load config");

    assert_eq!(config.execution.timeout_ms, 3000);
    assert!(config.runtime(Language::Python).is_ok());
}

#[test]
fn test_load_invalid_unknown_language() {
    assert!(Config::from_file(fixture_config("invalid_unknown_language.toml")).is_err());
}

#[test]
fn test_load_invalid_empty_command() {
    assert!(Config::from_file(fixture_config("invalid_empty_command.toml")).is_err());
}

#[test]
fn test_load_invalid_zero_timeout() {
    assert!(Config::from_file(fixture_config("invalid_zero_timeout.toml")).is_err());
}

#[test]
fn test_load_missing_file() {
    assert!(Config::from_file(fixture_config("does_not_exist.toml")).is_err());
}
