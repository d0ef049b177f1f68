//! In-process fallback runtime
//!
//! Used when the HTTP backend answers 503. An [`Invoker`] loads an embedded
//! interpreter once, on first use, and runs each submission with its print
//! output redirected into a fresh buffer. Runs follow the same rules as the
//! process backend: the denylist is applied first and every run gets the
//! same wall-clock budget.
//!
//! No interpreter ships with this crate. Hosts plug one in by implementing
//! [`RuntimeLoader`] and [`EmbeddedRuntime`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, instrument, warn};

pub use crate::invoker::sink::{CaptureBuffer, PrintTarget, SinkGuard};

mod sink;

use crate::config::DEFAULT_TIMEOUT_MS;
use crate::types::{Language, NO_OUTPUT_PLACEHOLDER};
use crate::validator::{self, Verdict};

/// An interpreter living inside this process
pub trait EmbeddedRuntime: Send + Sync + 'static {
    /// Where the interpreter's print calls are written
    fn print_target(&self) -> &PrintTarget;

    /// Run `source` to completion on the calling thread
    ///
    /// The error string is the interpreter's own description of the failure.
    fn run(&self, source: &str) -> Result<(), String>;

    /// Ask a run in progress to stop
    ///
    /// Called once a run has exceeded its budget. Runtimes that cannot be
    /// interrupted keep the default, and the run finishes in the background.
    fn interrupt(&self) {}
}

/// Produces the embedded runtime on first use
#[async_trait]
pub trait RuntimeLoader: Send + Sync {
    type Runtime: EmbeddedRuntime;

    async fn load(&self) -> Result<Self::Runtime, String>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvokeError {
    /// The source matched the denylist; the runtime was not touched
    #[error("Code contains potentially dangerous operations")]
    UnsafeCode { pattern: &'static str },

    /// The runtime could not be loaded; a later call tries again
    #[error("Error loading interpreter: {0}")]
    Load(String),

    #[error("Execution timeout ({} seconds)", .0.as_secs_f64())]
    TimedOut(Duration),

    /// The program raised an error after printing `partial_output`
    #[error("{}", render_run_failure(.partial_output, .message))]
    Run {
        message: String,
        partial_output: String,
    },
}

fn render_run_failure(partial_output: &str, message: &str) -> String {
    if partial_output.is_empty() {
        format!("Error: {message}")
    } else {
        format!("{partial_output}\n\nError: {message}")
    }
}

/// Runs submissions on a lazily loaded embedded runtime
pub struct Invoker<L: RuntimeLoader> {
    language: Language,
    loader: L,
    runtime: OnceCell<Arc<L::Runtime>>,
    // Held for the whole blocking run, including one that outlived its budget.
    run_lock: Arc<Mutex<()>>,
    timeout: Duration,
}

impl<L: RuntimeLoader> Invoker<L> {
    pub fn new(language: Language, loader: L) -> Self {
        Self {
            language,
            loader,
            runtime: OnceCell::new(),
            run_lock: Arc::new(Mutex::new(())),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Set the per-run budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether the runtime has been loaded
    pub fn is_loaded(&self) -> bool {
        self.runtime.initialized()
    }

    /// The runtime, loading it if this is the first call
    ///
    /// Concurrent first callers share a single load.
    pub async fn runtime(&self) -> Result<Arc<L::Runtime>, InvokeError> {
        let runtime = self
            .runtime
            .get_or_try_init(|| async {
                info!(language = %self.language, "loading embedded runtime");
                let runtime = self.loader.load().await.map_err(|message| {
                    warn!(%message, "embedded runtime failed to load");
                    InvokeError::Load(message)
                })?;
                Ok::<_, InvokeError>(Arc::new(runtime))
            })
            .await?;
        Ok(Arc::clone(runtime))
    }

    /// Screen and run `source`, returning everything it printed
    #[instrument(skip_all, fields(language = %self.language, source_len = source.len()))]
    pub async fn run(&self, source: &str) -> Result<String, InvokeError> {
        if let Verdict::Unsafe { pattern } = validator::check(self.language, source) {
            warn!(pattern, "rejected source matching denylist");
            return Err(InvokeError::UnsafeCode { pattern });
        }

        let runtime = self.runtime().await?;
        let task_runtime = Arc::clone(&runtime);
        let source = source.to_owned();

        // Queueing behind another run does not count against the budget.
        let permit = Arc::clone(&self.run_lock).lock_owned().await;
        let run = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            capture_run(task_runtime.as_ref(), &source)
        });

        match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => {
                warn!(%join_error, "embedded run did not complete");
                Err(InvokeError::Run {
                    message: "interpreter crashed".to_string(),
                    partial_output: String::new(),
                })
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "embedded run timed out");
                runtime.interrupt();
                Err(InvokeError::TimedOut(self.timeout))
            }
        }
    }
}

/// One run with print output redirected into a fresh buffer
fn capture_run<R: EmbeddedRuntime>(runtime: &R, source: &str) -> Result<String, InvokeError> {
    let buffer = CaptureBuffer::new();
    let result = {
        let _guard = runtime.print_target().redirect(buffer.clone());
        runtime.run(source)
    };

    let output = buffer.contents();
    debug!(output_len = output.len(), ok = result.is_ok(), "embedded run finished");

    match result {
        Ok(()) if output.is_empty() => Ok(NO_OUTPUT_PLACEHOLDER.to_string()),
        Ok(()) => Ok(output),
        Err(message) => Err(InvokeError::Run {
            message,
            partial_output: output,
        }),
    }
}
