use scooby::config::Config;
use scooby::sources::{ensure_cached, load_inputs};
use std::io::{Cursor, Write};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUGS: &str = r#"{"bugs": [
    {"id": "20", "name": "Twenty", "type": "ad", "pattern": "twenty"},
    {"id": "3", "name": "Three", "type": "analytics", "pattern": "three"},
    {"id": "7", "name": "Broken", "type": "widget", "pattern": "(unclosed"}
]}"#;

const SITES: &str = "1,one.example\n2,two.example\n3,three.example\n";

/// Zips `SITES` the way the published site list is packaged
fn sites_archive() -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("top-1m.csv", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(SITES.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

async fn mount_sources(server: &MockServer, expected_downloads: u64) {
    Mock::given(method("GET"))
        .and(path("/bugs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BUGS))
        .expect(expected_downloads)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sites.csv.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(sites_archive()))
        .expect(expected_downloads)
        .mount(server)
        .await;
}

fn config_for(server: &MockServer, dir: &TempDir, max_sites: usize) -> Config {
    let mut config = Config::default();
    config.scan.max_sites = max_sites;
    config.sources.bugs_url = format!("{}/bugs", server.uri());
    config.sources.bugs_cache = dir.path().join("bugs.json");
    config.sources.sites_zip_url = format!("{}/sites.csv.zip", server.uri());
    config.sources.sites_zip_cache = dir.path().join("sites.csv.zip");
    config.sources.sites_cache = dir.path().join("sites.csv");
    config
}

#[tokio::test]
async fn test_load_inputs_downloads_then_uses_cache() {
    let server = MockServer::start().await;
    mount_sources(&server, 1).await;
    let dir = TempDir::new().unwrap();
    let config = config_for(&server, &dir, 2);
    let client = reqwest::Client::new();

    let (patterns, sites) = load_inputs(&config, &client).await.expect("Setup failed");
    let ids: Vec<u64> = patterns.rules().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3, 20]);
    assert_eq!(sites, vec!["one.example", "two.example"]);

    // Second run reads the caches; the mocks expect a single download each
    let (patterns, sites) = load_inputs(&config, &client).await.expect("Setup failed");
    assert_eq!(patterns.len(), 2);
    assert_eq!(sites.len(), 2);
}

#[tokio::test]
async fn test_recache_downloads_again() {
    let server = MockServer::start().await;
    mount_sources(&server, 2).await;
    let dir = TempDir::new().unwrap();
    let mut config = config_for(&server, &dir, 10);
    let client = reqwest::Client::new();

    load_inputs(&config, &client).await.expect("Setup failed");
    config.sources.recache = true;
    let (_, sites) = load_inputs(&config, &client).await.expect("Setup failed");
    assert_eq!(sites.len(), 3);
}

#[tokio::test]
async fn test_extraction_caps_cached_rows() {
    let server = MockServer::start().await;
    mount_sources(&server, 1).await;
    let dir = TempDir::new().unwrap();
    let mut config = config_for(&server, &dir, 10);
    config.sources.max_sites_cache_size = 2;
    let client = reqwest::Client::new();

    let (_, sites) = load_inputs(&config, &client).await.expect("Setup failed");
    assert_eq!(sites, vec!["one.example", "two.example"]);
    assert!(config.sources.sites_zip_cache.exists());
}

#[tokio::test]
async fn test_missing_archive_member_is_fatal() {
    let server = MockServer::start().await;
    mount_sources(&server, 1).await;
    let dir = TempDir::new().unwrap();
    let mut config = config_for(&server, &dir, 10);
    config.sources.sites_csv_file = "missing.csv".to_string();

    let result = load_inputs(&config, &reqwest::Client::new()).await;
    assert!(matches!(result, Err(scooby::ScoobyError::Zip(_))));
}

#[tokio::test]
async fn test_unavailable_source_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let cache = dir.path().join("bugs.json");

    let result = ensure_cached(
        &reqwest::Client::new(),
        &format!("{}/bugs", server.uri()),
        &cache,
        false,
    )
    .await;

    assert!(matches!(result, Err(scooby::ScoobyError::Http { .. })));
    assert!(!cache.exists());
}
