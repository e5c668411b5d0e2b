use scooby::config::ScanConfig;
use scooby::rules::{PatternSet, RuleRow};
use scooby::scanner::{
    build_http_client, run_scan, HttpFetcher, RetryPolicy, ScanSettings, SiteResult,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> Arc<HttpFetcher> {
    Arc::new(HttpFetcher::new(
        build_http_client(&ScanConfig::default()).expect("Failed to build client"),
    ))
}

fn foo_rules() -> Arc<PatternSet> {
    let (patterns, skipped) = PatternSet::load(vec![RuleRow {
        id: 1,
        name: "Foo".to_string(),
        category: "tracker".to_string(),
        pattern: "foo".to_string(),
    }]);
    assert_eq!(skipped, 0);
    Arc::new(patterns)
}

fn settings(pool_size: usize, timeout: Duration, max_retries: u32) -> ScanSettings {
    ScanSettings {
        pool_size,
        timeout,
        retry: RetryPolicy::new(max_retries),
    }
}

fn site_of(server: &MockServer) -> String {
    server.uri().trim_start_matches("http://").to_string()
}

async fn serving(body: &str, delay: Duration) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .set_delay(delay),
        )
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_mixed_success_and_timeout() {
    let a = serving("<script>foo()</script>", Duration::ZERO).await;
    let b = serving("foo, but too late", Duration::from_secs(3)).await;
    let sites = vec![site_of(&a), site_of(&b)];

    let mut output = Vec::new();
    let summary = run_scan(
        settings(10, Duration::from_millis(200), 0),
        foo_rules(),
        sites.clone(),
        fetcher(),
        &mut output,
        CancellationToken::new(),
    )
    .await
    .expect("Scan failed");

    let records: Vec<SiteResult> = serde_json::from_slice(&output).expect("Output is not JSON");
    assert_eq!(
        records,
        vec![
            SiteResult::matched(sites[0].clone(), vec![1]),
            SiteResult::failed(sites[1].clone(), "timed out after 200ms"),
        ]
    );
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.successes, 1);
    assert_eq!(summary.failures, 1);
}

#[tokio::test]
async fn test_empty_site_list() {
    let mut output = Vec::new();
    let summary = run_scan(
        settings(10, Duration::from_secs(1), 3),
        foo_rules(),
        Vec::new(),
        fetcher(),
        &mut output,
        CancellationToken::new(),
    )
    .await
    .expect("Scan failed");

    let records: Vec<SiteResult> = serde_json::from_slice(&output).expect("Output is not JSON");
    assert!(records.is_empty());
    assert_eq!(summary.processed, 0);
    assert_eq!(summary.total, 0);
}

#[tokio::test]
async fn test_order_matches_input_when_completion_order_differs() {
    let slow = serving("foo slow", Duration::from_millis(300)).await;
    let medium = serving("medium", Duration::from_millis(150)).await;
    let fast = serving("foo fast", Duration::ZERO).await;
    let sites = vec![
        site_of(&slow),
        site_of(&medium),
        site_of(&fast),
        site_of(&fast),
    ];

    let mut output = Vec::new();
    let summary = run_scan(
        settings(4, Duration::from_secs(5), 0),
        foo_rules(),
        sites.clone(),
        fetcher(),
        &mut output,
        CancellationToken::new(),
    )
    .await
    .expect("Scan failed");

    let records: Vec<SiteResult> = serde_json::from_slice(&output).expect("Output is not JSON");
    let order: Vec<String> = records.iter().map(|r| r.site.clone()).collect();
    assert_eq!(order, sites);
    assert_eq!(records[1].bug_ids(), Some(&[][..]));
    assert_eq!(summary.successes, 4);
}

#[tokio::test]
async fn test_cancellation_truncates_cleanly() {
    let fast = serving("foo", Duration::ZERO).await;
    let slow = serving("foo", Duration::from_secs(5)).await;
    let mut sites = vec![site_of(&fast)];
    sites.extend(std::iter::repeat(site_of(&slow)).take(4));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let mut output = Vec::new();
    let summary = run_scan(
        settings(2, Duration::from_secs(10), 3),
        foo_rules(),
        sites.clone(),
        fetcher(),
        &mut output,
        cancel,
    )
    .await
    .expect("Scan failed");

    assert!(started.elapsed() < Duration::from_secs(4));

    let records: Vec<SiteResult> = serde_json::from_slice(&output).expect("Output is not JSON");
    assert_eq!(records, vec![SiteResult::matched(sites[0].clone(), vec![1])]);
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.total, 5);
    assert_eq!(summary.successes, 1);
    assert_eq!(summary.failures, 0);
}
