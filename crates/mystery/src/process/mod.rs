//! Interpreter process management
//!
//! Spawns one interpreter per run, feeds it the source as an inline program
//! argument, and collects its output under a wall-clock deadline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub use crate::process::running::{ProcessOutput, RunningProcess, run_to_completion};

mod running;

/// Errors that occur while running an interpreter process
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("runtime command is empty")]
    EmptyCommand,

    #[error("program '{0}' not found in PATH")]
    ProgramNotFound(String),

    #[error("failed to start {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("source contains a NUL byte")]
    NulInSource,

    #[error("{stream} exceeded the {limit} byte limit")]
    OutputLimit { stream: &'static str, limit: usize },

    #[error("process exceeded the {0:?} budget")]
    TimedOut(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bounds applied to one process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessLimits {
    /// Wall-clock deadline, started at spawn
    pub timeout: Duration,

    /// Maximum bytes collected per stream
    pub max_output: usize,
}

/// Resolve a program name to an absolute path using `search_path`.
///
/// The child environment is cleared before spawning, so bare names (like
/// `python3`) are resolved here against the runtime's own PATH rather than the
/// server's. Only executable files match. Names containing a `/` are returned
/// unchanged.
pub fn resolve_program(program: &str, search_path: &str) -> Result<PathBuf, ProcessError> {
    if program.contains('/') {
        return Ok(PathBuf::from(program));
    }

    search_path
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(|dir| Path::new(dir).join(program))
        .find(|candidate| is_executable(candidate))
        .ok_or_else(|| ProcessError::ProgramNotFound(program.to_string()))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
