//! Integration tests for request outcome classification.
//!
//! These run the real reqwest transport against wiremock servers and check how
//! each response (or lack of one) lands in the target's counters.

use std::net::TcpListener;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rust_urlswarm::errors::ErrorCategory;
use rust_urlswarm::executor::{Outcome, RequestExecutor, TimeoutPolicy};
use rust_urlswarm::target::Target;

fn executor(timeout: Duration) -> RequestExecutor {
    RequestExecutor::with_client(reqwest::Client::new(), TimeoutPolicy::Fixed(timeout))
}

async fn server_returning(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_status_200_is_success() {
    let server = server_returning(200).await;
    let target = Target::new(format!("{}/status", server.uri()));

    let outcome = executor(Duration::from_secs(5)).execute(&target).await;

    assert_eq!(outcome, Outcome::Success { status: 200 });
    let snap = target.snapshot();
    assert_eq!(snap.request_count, 1);
    assert_eq!(snap.error_count, 0);
}

#[tokio::test]
async fn test_status_204_is_success() {
    let server = server_returning(204).await;
    let target = Target::new(format!("{}/status", server.uri()));

    let outcome = executor(Duration::from_secs(5)).execute(&target).await;

    assert!(!outcome.is_error());
    assert_eq!(target.snapshot().error_count, 0);
}

#[tokio::test]
async fn test_status_404_is_error() {
    let server = server_returning(404).await;
    let target = Target::new(format!("{}/status", server.uri()));

    let outcome = executor(Duration::from_secs(5)).execute(&target).await;

    assert_eq!(
        outcome,
        Outcome::Error {
            status: Some(404),
            category: ErrorCategory::ClientError
        }
    );
    let snap = target.snapshot();
    assert_eq!(snap.request_count, 1);
    assert_eq!(snap.error_count, 1);
}

#[tokio::test]
async fn test_status_503_is_error() {
    let server = server_returning(503).await;
    let target = Target::new(format!("{}/status", server.uri()));

    let outcome = executor(Duration::from_secs(5)).execute(&target).await;

    assert_eq!(
        outcome,
        Outcome::Error {
            status: Some(503),
            category: ErrorCategory::ServerError
        }
    );
    assert_eq!(target.snapshot().error_count, 1);
}

#[tokio::test]
async fn test_unmatched_path_is_error() {
    // wiremock answers 404 for anything without a mounted mock
    let server = server_returning(200).await;
    let target = Target::new(format!("{}/missing", server.uri()));

    let outcome = executor(Duration::from_secs(5)).execute(&target).await;

    assert!(outcome.is_error());
}

#[tokio::test]
async fn test_connection_refused_is_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let target = Target::new(format!("http://127.0.0.1:{}/", port));

    let outcome = executor(Duration::from_secs(5)).execute(&target).await;

    assert_eq!(
        outcome,
        Outcome::Error {
            status: None,
            category: ErrorCategory::NetworkError
        }
    );
    let snap = target.snapshot();
    assert_eq!(snap.request_count, 1);
    assert_eq!(snap.error_count, 1);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    let target = Target::new(server.uri());

    let started = std::time::Instant::now();
    let outcome = executor(Duration::from_millis(200)).execute(&target).await;

    assert_eq!(
        outcome,
        Outcome::Error {
            status: None,
            category: ErrorCategory::TimeoutError
        }
    );
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(target.snapshot().error_count, 1);
}

#[tokio::test]
async fn test_malformed_address_is_error_not_panic() {
    let target = Target::new("this is not a url");

    let outcome = executor(Duration::from_secs(1)).execute(&target).await;

    assert!(outcome.is_error());
    assert_eq!(outcome.status(), None);
    assert_eq!(target.snapshot().request_count, 1);
}

#[tokio::test]
async fn test_randomized_policy_still_classifies() {
    let server = server_returning(200).await;
    let target = Target::new(format!("{}/status", server.uri()));
    let executor = RequestExecutor::with_client(
        reqwest::Client::new(),
        TimeoutPolicy::Randomized {
            max: Duration::from_secs(30),
        },
    );

    for _ in 0..5 {
        executor.execute(&target).await;
    }

    let snap = target.snapshot();
    assert_eq!(snap.request_count, 5);
    // Random timeouts start at 1ms, so a few very short ones may expire first.
    assert!(snap.error_count <= snap.request_count);
}
