use std::time::{Duration, Instant};

use mystery::{ExecuteError, Executor, Language, NO_OUTPUT_PLACEHOLDER};

use super::{fixture_source, test_config};

#[tokio::test]
async fn test_run_squares() {
    let executor = Executor::new(test_config());
    let result = executor
        .execute(Language::Python, &fixture_source("squares.py"))
        .await
        .expect("Execution failed");

    assert!(result.success);
    assert_eq!(result.output, "Squares: [1, 4, 9]\n");
    assert_eq!(result.error, None);
}

#[tokio::test]
async fn test_run_hello() {
    let executor = Executor::new(test_config());
    let result = executor
        .execute(Language::Python, &fixture_source("hello.py"))
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "X\n");
}

#[tokio::test]
async fn test_run_without_output() {
    let executor = Executor::new(test_config());
    let result = executor
        .execute(Language::Python, &fixture_source("silent.py"))
        .await
        .expect("Execution failed");

    assert_eq!(result.output, NO_OUTPUT_PLACEHOLDER);
}

#[tokio::test]
async fn test_run_warning_reaches_error_field() {
    let executor = Executor::new(test_config());
    let result = executor
        .execute(Language::Python, &fixture_source("warning.py"))
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "done\n");
    assert!(result.error.unwrap().contains("UserWarning: heads up"));
}

#[tokio::test]
async fn test_run_runtime_error_returns_traceback() {
    let executor = Executor::new(test_config());
    let err = executor
        .execute(Language::Python, &fixture_source("runtime_error.py"))
        .await
        .expect_err("Execution should fail");

    match err {
        ExecuteError::Failed(stderr) => {
            assert!(stderr.contains("Traceback"));
            assert!(stderr.contains("ValueError: bad value"));
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_run_forbidden_import_is_rejected() {
    let executor = Executor::new(test_config());
    let err = executor
        .execute(Language::Python, &fixture_source("forbidden_os.py"))
        .await
        .expect_err("Execution should be rejected");

    assert!(matches!(err, ExecuteError::UnsafeCode { pattern: "import-os" }));
}

#[tokio::test]
async fn test_run_infinite_loop_times_out() {
    let executor = Executor::new(test_config().with_timeout(Duration::from_secs(1)));
    let started = Instant::now();
    let err = executor
        .execute(Language::Python, &fixture_source("infinite_loop.py"))
        .await
        .expect_err("Execution should time out");

    assert!(matches!(err, ExecuteError::Timeout(_)));
    assert!(started.elapsed() < Duration::from_millis(2500));
}

#[tokio::test]
async fn test_run_syntax_error() {
    let executor = Executor::new(test_config());
    let err = executor
        .execute(Language::Python, "print(")
        .await
        .expect_err("Execution should fail");

    assert!(err.to_string().contains("SyntaxError"));
}
