//! HTTP surface for the code runner
//!
//! Exposes `POST /api/execute` and `GET /health`. Every failure inside the
//! execute handler ends as a JSON error body with a matching status code; a
//! panicking handler is caught and answered with a generic 500.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use crate::server::error::{ApiError, FALLBACK_SUGGESTION};
pub use crate::server::handlers::ExecuteBody;

mod error;
mod handlers;

use crate::runner::Executor;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub executor: Arc<Executor>,
}

impl AppState {
    pub fn new(executor: Executor) -> Self {
        Self {
            executor: Arc::new(executor),
        }
    }
}

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let cors = state.executor.config().server.cors;
    let router = Router::new()
        .route("/api/execute", post(handlers::execute))
        .route("/health", get(handlers::health))
        .with_state(state);

    with_layers(router, cors)
}

fn with_layers(router: Router, cors: bool) -> Router {
    let router = router
        .layer(CatchPanicLayer::custom(handlers::handle_panic))
        .layer(TraceLayer::new_for_http());

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Bind to the configured address and serve until Ctrl-C
pub async fn serve(executor: Executor) -> std::io::Result<()> {
    let addr = executor.config().server.bind;
    let listener = TcpListener::bind(addr).await?;
    serve_on(listener, executor).await
}

/// Serve on an already bound listener until Ctrl-C
pub async fn serve_on(listener: TcpListener, executor: Executor) -> std::io::Result<()> {
    let addr: SocketAddr = listener.local_addr()?;
    let router = build_router(AppState::new(executor));

    info!(%addr, "server listening");
    info!("execute endpoint: http://{addr}/api/execute");
    info!("health check: http://{addr}/health");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
