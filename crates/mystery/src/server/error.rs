//! Error responses for the HTTP surface.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::runner::ExecuteError;
use crate::types::RequestError;

/// Suggestion attached to 503 responses
pub const FALLBACK_SUGGESTION: &str =
    "Run the code with the in-browser interpreter instead; it follows the same rules.";

/// Errors the execute endpoint can answer with
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or disallowed request shape
    #[error("{0}")]
    Input(String),

    /// Source matched the denylist
    #[error("Code contains potentially dangerous operations")]
    UnsafeCode,

    /// Run exceeded its budget
    #[error("{0}")]
    Timeout(String),

    /// No interpreter on this host
    #[error("Code execution is not available on this host")]
    RuntimeUnavailable,

    /// Program ran and failed, or the backend failed while running it
    #[error("{0}")]
    ExecutionFailed(String),

    /// Anything unanticipated
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Input(_) | ApiError::UnsafeCode => StatusCode::BAD_REQUEST,
            ApiError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            ApiError::RuntimeUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::ExecutionFailed(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn suggestion(&self) -> Option<&'static str> {
        matches!(self, ApiError::RuntimeUnavailable).then_some(FALLBACK_SUGGESTION)
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        ApiError::Input(err.to_string())
    }
}

impl From<ExecuteError> for ApiError {
    fn from(err: ExecuteError) -> Self {
        match err {
            ExecuteError::UnsafeCode { pattern } => {
                warn!(pattern, "refused unsafe submission");
                ApiError::UnsafeCode
            }
            ExecuteError::InvalidSource => ApiError::Input(err.to_string()),
            ExecuteError::Timeout(_) => ApiError::Timeout(err.to_string()),
            ExecuteError::RuntimeUnavailable { .. } => {
                error!(error = %err, "interpreter unavailable");
                ApiError::RuntimeUnavailable
            }
            ExecuteError::Failed(message) => ApiError::ExecutionFailed(message),
            ExecuteError::OutputLimit { .. } | ExecuteError::Io(_) => {
                ApiError::ExecutionFailed(err.to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            suggestion: self.suggestion(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
