use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, instrument};

use crate::config::RuntimeConfig;
use crate::process::{ProcessError, ProcessLimits, resolve_program};

const READ_CHUNK: usize = 8 * 1024;

/// Everything a finished process left behind
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// Exit code, or None if the process was killed by a signal
    pub fn exit_code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Exit code 0 is the only success
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code() == Some(0)
    }
}

/// One interpreter process and its pending output
///
/// The child is killed when this handle is dropped, so no process can outlive
/// the call that owns it.
#[derive(Debug)]
pub struct RunningProcess {
    child: Child,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    limits: ProcessLimits,
}

impl RunningProcess {
    /// Spawn the runtime's interpreter with `source` as its last argument
    ///
    /// The child gets a cleared environment (only PATH and the runtime's
    /// configured variables), a closed stdin, and piped stdout/stderr.
    #[instrument(skip(runtime, source), fields(runtime = %runtime.name, source_len = source.len()))]
    pub fn spawn(
        runtime: &RuntimeConfig,
        source: &str,
        limits: ProcessLimits,
    ) -> Result<Self, ProcessError> {
        let program = runtime.program().ok_or(ProcessError::EmptyCommand)?;

        // Arguments are C strings; an embedded NUL would fail the spawn anyway.
        if source.contains('\0') {
            return Err(ProcessError::NulInSource);
        }

        let resolved = resolve_program(program, &runtime.path)?;

        let mut child = Command::new(&resolved)
            .args(runtime.args_with_source(source))
            .env_clear()
            .env("PATH", &runtime.path)
            .envs(&runtime.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::SpawnFailed {
                program: resolved.display().to_string(),
                source,
            })?;

        debug!(pid = ?child.id(), program = %resolved.display(), "spawned interpreter");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        Ok(Self {
            child,
            stdout,
            stderr,
            limits,
        })
    }

    /// OS process id, while the process is still running
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Collect both streams and the exit status, bounded by the deadline
    ///
    /// Whichever settles first wins: the process finishing, a stream going
    /// over its limit, or the deadline. On the latter two the process is
    /// killed and reaped before returning.
    #[instrument(skip(self), fields(pid = ?self.child.id()))]
    pub async fn wait_with_output(mut self) -> Result<ProcessOutput, ProcessError> {
        let ProcessLimits {
            timeout,
            max_output,
        } = self.limits;
        let stdout = self.stdout.take();
        let stderr = self.stderr.take();
        let child = &mut self.child;

        let collect = async {
            let (stdout, stderr) = tokio::try_join!(
                read_capped(stdout, max_output, "stdout"),
                read_capped(stderr, max_output, "stderr"),
            )?;
            let status = child.wait().await?;
            Ok::<_, ProcessError>(ProcessOutput {
                status,
                stdout,
                stderr,
            })
        };

        let outcome = tokio::time::timeout(timeout, collect).await;
        match outcome {
            Ok(Ok(output)) => {
                debug!(
                    exit_code = ?output.exit_code(),
                    stdout_len = output.stdout.len(),
                    stderr_len = output.stderr.len(),
                    "process exited"
                );
                Ok(output)
            }
            Ok(Err(e)) => {
                self.terminate().await;
                Err(e)
            }
            Err(_) => {
                debug!(?timeout, "deadline elapsed");
                self.terminate().await;
                Err(ProcessError::TimedOut(timeout))
            }
        }
    }

    /// Kill and reap the process
    async fn terminate(&mut self) {
        if let Err(e) = self.child.kill().await {
            debug!(error = %e, "kill failed, process likely already exited");
        }
    }
}

/// Read a stream to its end, failing once more than `limit` bytes arrive
async fn read_capped<R>(
    reader: Option<R>,
    limit: usize,
    stream: &'static str,
) -> Result<Vec<u8>, ProcessError>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(Vec::new());
    };

    let mut buf = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(buf);
        }
        if buf.len() + n > limit {
            return Err(ProcessError::OutputLimit { stream, limit });
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// Convenience wrapper: spawn and wait in one call
pub async fn run_to_completion(
    runtime: &RuntimeConfig,
    source: &str,
    limits: ProcessLimits,
) -> Result<ProcessOutput, ProcessError> {
    RunningProcess::spawn(runtime, source, limits)?
        .wait_with_output()
        .await
}
