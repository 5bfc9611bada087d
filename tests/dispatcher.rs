use std::sync::Arc;
use std::time::{Duration, Instant};
use wallet_data_service::dispatch::{DispatchError, Dispatcher, RateLimiter, RequestSpec, RetryPolicy};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::request_count;

fn dispatcher(spacing: Duration, retry: RetryPolicy) -> Dispatcher {
    Dispatcher::new(
        reqwest::Client::new(),
        Arc::new(RateLimiter::new("test", spacing)),
        retry,
    )
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(10),
    }
}

async fn mount_ok(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sequential_calls_are_spaced() {
    let server = MockServer::start().await;
    mount_ok(&server, "/ping").await;

    let dispatcher = dispatcher(Duration::from_millis(500), fast_retry());
    let spec = RequestSpec::get(format!("{}/ping", server.uri()));

    let started = Instant::now();
    for _ in 0..4 {
        assert_eq!(dispatcher.send(&spec).await.unwrap(), "ok");
    }

    assert!(started.elapsed() >= Duration::from_millis(1500));
    assert_eq!(request_count(&server).await, 4);
}

#[tokio::test]
async fn test_concurrent_callers_share_spacing() {
    let server = MockServer::start().await;
    mount_ok(&server, "/ping").await;

    let dispatcher = dispatcher(Duration::from_millis(500), fast_retry());
    let spec = RequestSpec::get(format!("{}/ping", server.uri()));

    let started = Instant::now();
    let (a, b, c) = tokio::join!(dispatcher.send(&spec), dispatcher.send(&spec), dispatcher.send(&spec));

    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert!(started.elapsed() >= Duration::from_millis(1000));
}

#[tokio::test]
async fn test_retries_rate_limit_with_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_ok(&server, "/flaky").await;

    // Production pacing and backoff: 1s then 2s
    let dispatcher = dispatcher(Duration::from_millis(500), RetryPolicy::default());
    let spec = RequestSpec::get(format!("{}/flaky", server.uri()));

    let started = Instant::now();
    let body = dispatcher.send(&spec).await.unwrap();

    assert_eq!(body, "ok");
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_exhausted_retries_surface_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let dispatcher = dispatcher(Duration::ZERO, fast_retry());
    let spec = RequestSpec::get(format!("{}/limited", server.uri()));

    let err = dispatcher.send(&spec).await.unwrap_err();

    assert!(matches!(err, DispatchError::RateLimited { ref body } if body == "slow down"));
    // First attempt plus three retries
    assert_eq!(request_count(&server).await, 4);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let dispatcher = dispatcher(Duration::ZERO, fast_retry());
    let spec = RequestSpec::get(format!("{}/missing", server.uri()));

    let err = dispatcher.send(&spec).await.unwrap_err();

    assert!(matches!(err, DispatchError::Upstream { status: 404, .. }));
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/unstable"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_ok(&server, "/unstable").await;

    let dispatcher = dispatcher(Duration::ZERO, fast_retry());
    let spec = RequestSpec::get(format!("{}/unstable", server.uri()));

    assert_eq!(dispatcher.send(&spec).await.unwrap(), "ok");
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_persistent_server_error_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let dispatcher = dispatcher(Duration::ZERO, fast_retry());
    let spec = RequestSpec::get(format!("{}/down", server.uri()));

    let err = dispatcher.send(&spec).await.unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert_eq!(request_count(&server).await, 4);
}

#[tokio::test]
async fn test_send_json_reports_decode_errors() {
    let server = MockServer::start().await;
    mount_ok(&server, "/text").await;

    let dispatcher = dispatcher(Duration::ZERO, fast_retry());
    let spec = RequestSpec::get(format!("{}/text", server.uri()));

    let err = dispatcher.send_json::<serde_json::Value>(&spec).await.unwrap_err();
    assert!(matches!(err, DispatchError::Decode(_)));
}

#[tokio::test]
async fn test_transport_errors_omit_url() {
    // Nothing listens on the discard port
    let dispatcher = dispatcher(Duration::ZERO, fast_retry());
    let spec = RequestSpec::get("http://127.0.0.1:9/v2/SECRETKEY").query("apikey", "secret");

    let err = dispatcher.send(&spec).await.unwrap_err();

    assert!(matches!(err, DispatchError::Transport(_)));
    let message = err.to_string();
    assert!(!message.contains("SECRETKEY"));
    assert!(!message.contains("secret"));
}
