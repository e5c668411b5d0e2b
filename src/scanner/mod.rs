//! Scanner module: the fetch → match → emit pipeline
//!
//! This module contains the core scanning logic, including:
//! - HTTP fetching under a hard per-attempt deadline
//! - Immediate, bounded retry of failed attempts
//! - Classification of fetched bodies against the pattern set
//! - Bounded-concurrency scheduling with ordered reassembly
//! - Overall run coordination with the result sink

mod classify;
mod fetcher;
mod reorder;
mod result;
mod retry;
mod scheduler;

pub use classify::classify;
pub use fetcher::{
    build_http_client, FetchError, FetchErrorKind, FetchOutcome, Fetcher, HttpFetcher,
};
pub use reorder::ReorderBuffer;
pub use result::{SiteOutcome, SiteResult};
pub use retry::RetryPolicy;
pub use scheduler::{OrderedResults, ScanSettings, Scheduler};

use crate::output::{ResultSink, RunSummary};
use crate::rules::PatternSet;
use crate::ScoobyError;
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs a complete scan into `writer`
///
/// This function:
/// 1. Opens the result array
/// 2. Streams every site's result in input order
/// 3. Closes the array and reports the tally, whether the run finished,
///    was cancelled, or hit a write error
///
/// Setup (loading rules and sites) must already be done; nothing here fails
/// because a site failed.
///
/// # Example
///
/// ```no_run
/// use scooby::config::Config;
/// use scooby::scanner::{build_http_client, run_scan, HttpFetcher, ScanSettings};
/// use scooby::rules::PatternSet;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let fetcher = Arc::new(HttpFetcher::new(build_http_client(&config.scan)?));
/// let summary = run_scan(
///     ScanSettings::from(&config),
///     Arc::new(PatternSet::default()),
///     vec!["example.com".to_string()],
///     fetcher,
///     std::io::stdout(),
///     CancellationToken::new(),
/// )
/// .await?;
/// println!("{}", summary);
/// # Ok(())
/// # }
/// ```
pub async fn run_scan<W: Write>(
    settings: ScanSettings,
    patterns: Arc<PatternSet>,
    sites: Vec<String>,
    fetcher: Arc<dyn Fetcher>,
    writer: W,
    cancel: CancellationToken,
) -> Result<RunSummary, ScoobyError> {
    tracing::info!(
        "Scanning {} sites for {} bugs ({} connections, {:?} timeout, {} retries)",
        sites.len(),
        patterns.len(),
        settings.pool_size,
        settings.timeout,
        settings.retry.max_retries
    );

    let mut sink = ResultSink::new(writer);
    sink.begin(sites.len())?;

    let scheduler = Scheduler::new(fetcher, patterns, settings, cancel.clone());
    let mut results = scheduler.run(sites);

    let streamed = stream_results(&mut results, &mut sink).await;
    let summary = sink.end();

    if let Err(e) = &streamed {
        tracing::error!("Result stream failed: {}", e);
    } else if cancel.is_cancelled() {
        tracing::info!("Scan stopped early after interrupt");
    }

    streamed?;
    summary
}

async fn stream_results<W: Write>(
    results: &mut OrderedResults,
    sink: &mut ResultSink<W>,
) -> Result<(), ScoobyError> {
    while let Some(result) = results.next().await {
        sink.accept(&result)?;
    }
    Ok(())
}
