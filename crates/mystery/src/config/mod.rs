use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub use crate::config::runtime::{DEFAULT_RUNTIME_PATH, RuntimeConfig};
use crate::process::ProcessLimits;
use crate::types::Language;

mod loader;
pub mod runtime;

/// Example configuration embedded at compile time.
///
/// It doubles as the default configuration and as the file written by
/// `mystery init`.
pub const EXAMPLE_CONFIG: &str = include_str!("../../mystery.example.toml");

/// Default wall-clock budget for one run
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default per-stream capture limit in bytes
pub const DEFAULT_MAX_OUTPUT: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("no runtime configured for language '{0}'")]
    RuntimeNotConfigured(Language),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config for Mystery
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Limits applied to every run
    #[serde(default)]
    pub execution: ExecutionSettings,

    /// Interpreter settings keyed by language ID
    #[serde(default = "default_languages")]
    pub languages: HashMap<String, RuntimeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Address to listen on
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Send permissive CORS headers
    #[serde(default = "default_true")]
    pub cors: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionSettings {
    /// Wall-clock budget per run in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum captured bytes per stream
    #[serde(default = "default_max_output")]
    pub max_output: usize,
}

impl ExecutionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Limits applied to every interpreter process
    pub fn limits(&self) -> ProcessLimits {
        ProcessLimits {
            timeout: self.timeout(),
            max_output: self.max_output,
        }
    }
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_output: DEFAULT_MAX_OUTPUT,
        }
    }
}

impl Config {
    /// Create a new config with the embedded defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the runtime for a language
    pub fn runtime(&self, language: Language) -> Result<&RuntimeConfig, ConfigError> {
        self.languages
            .get(language.id())
            .ok_or(ConfigError::RuntimeNotConfigured(language))
    }

    /// Replace the runtime for a language
    pub fn with_runtime(mut self, language: Language, runtime: RuntimeConfig) -> Self {
        self.languages.insert(language.id().to_string(), runtime);
        self
    }

    /// Set the per-run budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.execution.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the per-stream capture limit
    pub fn with_max_output(mut self, bytes: usize) -> Self {
        self.execution.max_output = bytes;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3001))
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_max_output() -> usize {
    DEFAULT_MAX_OUTPUT
}

fn default_languages() -> HashMap<String, RuntimeConfig> {
    let python = RuntimeConfig::new("Python 3", ["python3", "-u", "-c"])
        .with_env("PYTHONIOENCODING", "utf-8")
        .with_env("PYTHONDONTWRITEBYTECODE", "1");
    HashMap::from([(Language::Python.id().to_string(), python)])
}
