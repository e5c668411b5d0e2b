use super::fetcher::{FetchOutcome, Fetcher};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Bounded, immediate retry around a [`Fetcher`]
///
/// Every failure is retried the same way, back to back with no delay, until
/// `max_retries` extra attempts have been spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Fetches `site`, retrying failed attempts
    ///
    /// At most `max_retries + 1` attempts are made. A body ends the loop at
    /// once; otherwise the last failure is returned unchanged. Once `cancel`
    /// fires no further attempt is started.
    pub async fn fetch_with_retry(
        &self,
        fetcher: &dyn Fetcher,
        site: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        let mut retries = 0;

        loop {
            let error = match fetcher.fetch(site, timeout).await {
                FetchOutcome::Body(body) => return FetchOutcome::Body(body),
                FetchOutcome::Failed(error) => error,
            };

            if retries >= self.max_retries {
                tracing::warn!("Failure processing site {}: {}", site, error);
                return FetchOutcome::Failed(error);
            }

            if cancel.is_cancelled() {
                tracing::debug!("Not retrying {} after interrupt: {}", site, error);
                return FetchOutcome::Failed(error);
            }

            retries += 1;
            tracing::info!("Failure processing site {}: {}; retrying...", site, error);
        }
    }
}
