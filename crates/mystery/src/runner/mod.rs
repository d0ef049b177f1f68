//! Code runner for Mystery
//!
//! Ties the denylist and the interpreter process together behind one call,
//! shared by the HTTP handler and the CLI.

use std::time::Duration;

use thiserror::Error;

pub use crate::runner::execute::execute;

mod execute;

use crate::config::Config;
use crate::process::ProcessError;
use crate::types::{ExecutionRequest, ExecutionResult, Language};

/// Errors that occur while executing submitted code
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The source matched the denylist; nothing was spawned
    ///
    /// The matched pattern is kept for logging and is left out of the message.
    #[error("Code contains potentially dangerous operations")]
    UnsafeCode { pattern: &'static str },

    /// The source cannot be passed to an interpreter at all
    #[error("Code must not contain NUL bytes")]
    InvalidSource,

    #[error("Code execution timed out ({} seconds limit)", format_seconds(.0))]
    Timeout(Duration),

    /// The interpreter could not be started on this host
    #[error("Failed to start {language}: {reason}")]
    RuntimeUnavailable { language: Language, reason: String },

    /// The program ran and exited unsuccessfully
    #[error("{0}")]
    Failed(String),

    #[error("Output exceeded the {limit} byte limit on {stream}")]
    OutputLimit { stream: &'static str, limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecuteError {
    /// Lift a process error into the execution taxonomy
    pub fn from_process(language: Language, err: ProcessError) -> Self {
        match err {
            ProcessError::EmptyCommand
            | ProcessError::ProgramNotFound(_)
            | ProcessError::SpawnFailed { .. } => ExecuteError::RuntimeUnavailable {
                language,
                reason: err.to_string(),
            },
            ProcessError::NulInSource => ExecuteError::InvalidSource,
            ProcessError::OutputLimit { stream, limit } => {
                ExecuteError::OutputLimit { stream, limit }
            }
            ProcessError::TimedOut(budget) => ExecuteError::Timeout(budget),
            ProcessError::Io(e) => ExecuteError::Io(e),
        }
    }
}

/// "5" for whole seconds, "0.25" otherwise
fn format_seconds(duration: &Duration) -> String {
    if duration.subsec_millis() == 0 {
        duration.as_secs().to_string()
    } else {
        duration.as_secs_f64().to_string()
    }
}

/// High-level runner for submitted code
#[derive(Debug, Clone)]
pub struct Executor {
    config: Config,
}

impl Executor {
    /// Create a new executor with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Create a new executor with default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Screen and run `source` with the interpreter for `language`
    pub async fn execute(
        &self,
        language: Language,
        source: &str,
    ) -> Result<ExecutionResult, ExecuteError> {
        execute::execute(&self.config, language, source).await
    }

    /// Run a request that already passed shape validation
    pub async fn run(&self, request: &ExecutionRequest) -> Result<ExecutionResult, ExecuteError> {
        self.execute(request.language, &request.source).await
    }
}
