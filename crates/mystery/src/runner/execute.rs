//! Execution step for submitted code
//!
//! Screens the source, runs it in a fresh interpreter and normalizes the
//! outcome into an [`ExecutionResult`] or an [`ExecuteError`].

use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::process::{ProcessOutput, run_to_completion};
use crate::runner::ExecuteError;
use crate::types::{ExecutionResult, Language};
use crate::validator::{self, Verdict};

/// Screen `source` and run it once under the configured budget
#[instrument(skip(config, source), fields(source_len = source.len()))]
pub async fn execute(
    config: &Config,
    language: Language,
    source: &str,
) -> Result<ExecutionResult, ExecuteError> {
    if let Verdict::Unsafe { pattern } = validator::check(language, source) {
        warn!(pattern, "rejected source matching denylist");
        return Err(ExecuteError::UnsafeCode { pattern });
    }

    let runtime = config
        .runtime(language)
        .map_err(|e| ExecuteError::RuntimeUnavailable {
            language,
            reason: e.to_string(),
        })?;

    let output = run_to_completion(runtime, source, config.execution.limits())
        .await
        .map_err(|e| ExecuteError::from_process(language, e))?;

    debug!(exit_code = ?output.exit_code(), "execution complete");

    if output.is_success() {
        Ok(ExecutionResult::from_streams(&output.stdout, &output.stderr))
    } else {
        Err(ExecuteError::Failed(failure_message(&output)))
    }
}

/// Captured stderr, or a description of how the process ended
fn failure_message(output: &ProcessOutput) -> String {
    if !output.stderr.is_empty() {
        return String::from_utf8_lossy(&output.stderr).into_owned();
    }

    match output.exit_code() {
        Some(code) => format!("Process exited with code {code}"),
        None => terminated_message(output),
    }
}

#[cfg(unix)]
fn terminated_message(output: &ProcessOutput) -> String {
    use std::os::unix::process::ExitStatusExt;

    match output.status.signal() {
        Some(signal) => format!("Process terminated by signal {signal}"),
        None => "Process terminated abnormally".to_string(),
    }
}

#[cfg(not(unix))]
fn terminated_message(_output: &ProcessOutput) -> String {
    "Process terminated abnormally".to_string()
}
