use scooby::config::ScanConfig;
use scooby::scanner::{
    build_http_client, FetchErrorKind, FetchOutcome, Fetcher, HttpFetcher, RetryPolicy,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(build_http_client(&ScanConfig::default()).expect("Failed to build client"))
}

/// Bare `host:port` of a mock server, the way sites appear in the site list
fn site_of(server: &MockServer) -> String {
    server.uri().trim_start_matches("http://").to_string()
}

#[tokio::test]
async fn test_fetch_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>hello</html>"))
        .mount(&server)
        .await;

    let outcome = fetcher().fetch(&site_of(&server), Duration::from_secs(5)).await;

    assert_eq!(outcome, FetchOutcome::Body(b"<html>hello</html>".to_vec()));
}

#[tokio::test]
async fn test_non_success_status_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let outcome = fetcher().fetch(&site_of(&server), Duration::from_secs(5)).await;

    match outcome {
        FetchOutcome::Failed(error) => {
            assert_eq!(error.kind, FetchErrorKind::Status);
            assert_eq!(error.message, "HTTP Error 404: Not Found");
        }
        other => panic!("expected a failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    let outcome = fetcher()
        .fetch(&site_of(&server), Duration::from_millis(200))
        .await;

    match outcome {
        FetchOutcome::Failed(error) => assert_eq!(error.kind, FetchErrorKind::Timeout),
        other => panic!("expected a timeout, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_refused_connection_is_a_failure() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let outcome = fetcher()
        .fetch(&format!("127.0.0.1:{}", port), Duration::from_secs(5))
        .await;

    match outcome {
        FetchOutcome::Failed(error) => assert_eq!(error.kind, FetchErrorKind::Connect),
        other => panic!("expected a connection failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_retry_spends_every_attempt_on_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let outcome = RetryPolicy::new(2)
        .fetch_with_retry(
            &fetcher(),
            &site_of(&server),
            Duration::from_secs(5),
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(outcome, FetchOutcome::Failed(_)));
}

#[tokio::test]
async fn test_retry_recovers_after_transient_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = RetryPolicy::new(3)
        .fetch_with_retry(
            &fetcher(),
            &site_of(&server),
            Duration::from_secs(5),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(outcome, FetchOutcome::Body(b"recovered".to_vec()));
}
