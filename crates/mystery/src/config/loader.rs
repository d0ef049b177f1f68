//! Configuration loading for Mystery
//!
//! Handles loading and parsing configuration files using the config crate.

use std::path::Path;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};

use crate::config::{Config, ConfigError, EXAMPLE_CONFIG};
use crate::types::Language;

/// Prefix for environment overrides (`MYSTERY__EXECUTION__TIMEOUT_MS=...`)
pub const ENV_PREFIX: &str = "MYSTERY";

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

impl Config {
    /// Load configuration from a file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = ConfigBuilder::builder()
            .add_source(File::from(path))
            .add_source(environment())
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load the embedded defaults, then apply environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(EXAMPLE_CONFIG, FileFormat::Toml))
            .add_source(environment())
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.execution.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "execution.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.execution.max_output == 0 {
            return Err(ConfigError::Invalid(
                "execution.max_output must be greater than zero".to_string(),
            ));
        }

        for (id, runtime) in &self.languages {
            if id.parse::<Language>().is_err() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' is not in the allow-list"
                )));
            }
            if runtime.name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty name"
                )));
            }
            if runtime.program().is_none_or(str::is_empty) {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty command"
                )));
            }
        }

        Ok(())
    }
}
