use std::any::Any;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

use crate::server::{ApiError, AppState, HealthResponse};
use crate::types::{ExecutionRequest, ExecutionResult};

/// Body of `POST /api/execute`
///
/// Both fields are optional here so that a missing field produces the same
/// 400 as an empty one instead of a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ExecuteBody {
    pub language: Option<String>,
    pub code: Option<String>,
}

/// `POST /api/execute`
#[instrument(skip_all)]
pub async fn execute(
    State(state): State<AppState>,
    body: Result<Json<ExecuteBody>, JsonRejection>,
) -> Result<Json<ExecutionResult>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        debug!(%rejection, "rejected request body");
        ApiError::Input(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let request = ExecutionRequest::from_parts(body.language.as_deref(), body.code.as_deref())?;
    info!(
        language = %request.language,
        source_len = request.source.len(),
        "executing submission"
    );

    let result = state.executor.run(&request).await?;
    Ok(Json(result))
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Turn a handler panic into the generic 500 body
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    error!(detail, "handler panicked");
    ApiError::Internal.into_response()
}
