//! A library for running untrusted playground code.
//!
//! Mystery backs the "Output Mystery" code playground. It accepts source text
//! from a caller, screens it against a denylist of dangerous constructs, runs it
//! in a short-lived interpreter process under a wall-clock budget, and returns
//! the captured output in a shape the web frontend understands.
//!
//! # Features
//!
//! - **Pattern screening**: Ordered regex denylist applied before anything runs.
//! - **Bounded execution**: One child process per request, killed on timeout.
//! - **HTTP surface**: `POST /api/execute` and `GET /health` built on axum.
//! - **In-process fallback**: A lazily loaded embedded runtime with scoped
//!   output capture, for hosts without an interpreter binary.
//! - **TOML configuration**: Interpreter command, budget and server settings.
//!
//! The denylist is a coarse pre-filter. It is not a security boundary.

pub use config::{Config, ConfigError, EXAMPLE_CONFIG, RuntimeConfig};
pub use invoker::{
    CaptureBuffer, EmbeddedRuntime, InvokeError, Invoker, PrintTarget, RuntimeLoader, SinkGuard,
};
pub use process::{ProcessError, ProcessLimits, ProcessOutput, RunningProcess};
pub use runner::{ExecuteError, Executor};
pub use server::{ApiError, AppState, HealthResponse, build_router, serve, serve_on};
pub use types::{
    ExecutionRequest, ExecutionResult, Language, NO_OUTPUT_PLACEHOLDER, RequestError,
};
pub use validator::{DangerousPattern, Verdict};

pub mod config;
pub mod invoker;
pub mod process;
pub mod runner;
pub mod server;
pub mod types;
pub mod validator;
