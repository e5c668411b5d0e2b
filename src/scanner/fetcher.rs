//! HTTP fetcher implementation
//!
//! This module handles the single network attempt behind every site:
//! - Building the shared HTTP client
//! - Fetching `http://{site}` under a hard per-attempt deadline
//! - Error classification
//!
//! Deciding whether an error is worth retrying is not the fetcher's job; see
//! [`RetryPolicy`](super::RetryPolicy).

use crate::config::ScanConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::time::Duration;

/// Broad class of a failed fetch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// The attempt exceeded its deadline
    Timeout,
    /// DNS failure, connection refused, TLS failure
    Connect,
    /// The server answered with a non-success status
    Status,
    /// The response body could not be read
    Body,
    /// Anything else the transport reported, including malformed hosts
    Request,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchErrorKind::Timeout => "timeout",
            FetchErrorKind::Connect => "connect",
            FetchErrorKind::Status => "status",
            FetchErrorKind::Body => "body",
            FetchErrorKind::Request => "request",
        };
        f.write_str(name)
    }
}

/// A failed fetch attempt
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::new(FetchErrorKind::Timeout, format!("timed out after {:?}", limit))
    }
}

/// Result of one fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The raw page body
    Body(Vec<u8>),
    /// The attempt failed
    Failed(FetchError),
}

/// A single bounded-time retrieval of a site's content
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, site: &str, timeout: Duration) -> FetchOutcome;
}

/// Builds the HTTP client shared by every fetch
///
/// Redirects follow reqwest's default policy. No client-wide timeout is set;
/// each attempt carries its own deadline.
pub fn build_http_client(config: &ScanConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().gzip(true).brotli(true);

    if let Some(agent) = &config.user_agent {
        builder = builder.user_agent(agent.clone());
    }

    builder.build()
}

/// [`Fetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get_body(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await.map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FetchErrorKind::Status,
                format!(
                    "HTTP Error {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            ));
        }

        let body = response.bytes().await.map_err(classify_error)?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// Fetches `http://{site}`
    ///
    /// The deadline covers connect, headers and the whole body. When it fires
    /// the in-progress request future is dropped, which releases its connection.
    async fn fetch(&self, site: &str, timeout: Duration) -> FetchOutcome {
        let url = format!("http://{}", site);

        match tokio::time::timeout(timeout, self.get_body(&url)).await {
            Ok(Ok(body)) => FetchOutcome::Body(body),
            Ok(Err(error)) => FetchOutcome::Failed(error),
            Err(_) => FetchOutcome::Failed(FetchError::timeout(timeout)),
        }
    }
}

/// Maps a transport error onto a [`FetchErrorKind`]
fn classify_error(e: reqwest::Error) -> FetchError {
    let kind = if e.is_timeout() {
        FetchErrorKind::Timeout
    } else if e.is_connect() {
        FetchErrorKind::Connect
    } else if e.is_status() {
        FetchErrorKind::Status
    } else if e.is_body() || e.is_decode() {
        FetchErrorKind::Body
    } else {
        FetchErrorKind::Request
    };

    FetchError::new(kind, e.to_string())
}
