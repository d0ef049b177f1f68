use std::time::{Duration, Instant};

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use mystery::{AppState, Executor, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;

use super::{fixture_source, test_config};

async fn post_execute(state: AppState, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/execute")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = build_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_execute_squares() {
    let state = AppState::new(Executor::new(test_config()));
    let (status, body) = post_execute(
        state,
        json!({ "language": "python", "code": fixture_source("squares.py") }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "success": true, "output": "Squares: [1, 4, 9]\n", "error": null })
    );
}

#[tokio::test]
async fn test_execute_forbidden_import() {
    let state = AppState::new(Executor::new(test_config()));
    let (status, body) = post_execute(
        state,
        json!({ "language": "python", "code": fixture_source("forbidden_os.py") }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Code contains potentially dangerous operations"
    );
}

#[tokio::test]
async fn test_execute_infinite_loop_within_budget() {
    let state = AppState::new(Executor::new(test_config()));
    let started = Instant::now();
    let (status, body) = post_execute(
        state,
        json!({ "language": "python", "code": fixture_source("infinite_loop.py") }),
    )
    .await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body["error"], "Code execution timed out (5 seconds limit)");
    assert!(started.elapsed() < Duration::from_millis(5500));
}

#[tokio::test]
async fn test_execute_unsupported_language() {
    let state = AppState::new(Executor::new(test_config()));
    let (status, body) =
        post_execute(state, json!({ "language": "ruby", "code": "puts 1" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Language ruby is not supported");
}

#[tokio::test]
async fn test_execute_runtime_error() {
    let state = AppState::new(Executor::new(test_config()));
    let (status, body) = post_execute(
        state,
        json!({ "language": "python", "code": fixture_source("runtime_error.py") }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("ValueError"));
}

#[tokio::test]
async fn test_serve_on_real_listener() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(mystery::serve_on(listener, Executor::new(test_config())));

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    tokio::io::AsyncWriteExt::write_all(&mut stream, request.as_bytes())
        .await
        .unwrap();

    let mut response = String::new();
    tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut response)
        .await
        .unwrap();

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("\"status\":\"ok\""));

    server.abort();
}
