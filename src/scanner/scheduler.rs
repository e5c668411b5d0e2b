//! Bounded-concurrency scheduler
//!
//! This module handles:
//! - Admitting at most `pool_size` site tasks at a time
//! - Reassembling their completions in input order
//! - Stopping admission when the run is cancelled
//!
//! Each task owns one site: fetch under the retry policy, classify, then send
//! its result back tagged with the site's sequence number.

use super::classify::classify;
use super::fetcher::Fetcher;
use super::reorder::ReorderBuffer;
use super::result::SiteResult;
use super::retry::RetryPolicy;
use crate::config::Config;
use crate::rules::PatternSet;
use futures::{FutureExt, Stream};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Immutable run parameters consumed by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    /// Maximum number of site tasks in flight
    pub pool_size: usize,

    /// Hard deadline for each fetch attempt
    pub timeout: Duration,

    pub retry: RetryPolicy,
}

impl From<&Config> for ScanSettings {
    fn from(config: &Config) -> Self {
        Self {
            pool_size: config.scan.max_connections,
            timeout: config.timeout(),
            retry: RetryPolicy::new(config.scan.max_retries),
        }
    }
}

/// Dispatches sites across a fixed-size window of tasks
#[derive(Clone)]
pub struct Scheduler {
    fetcher: Arc<dyn Fetcher>,
    patterns: Arc<PatternSet>,
    settings: ScanSettings,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        patterns: Arc<PatternSet>,
        settings: ScanSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            patterns,
            settings,
            cancel,
        }
    }

    /// Starts processing `sites`, returning their results in input order
    ///
    /// Nothing is dispatched until the first call to
    /// [`OrderedResults::next`].
    pub fn run(&self, sites: Vec<String>) -> OrderedResults {
        let (tx, rx) = mpsc::unbounded_channel();

        OrderedResults {
            scheduler: self.clone(),
            pending: sites.into(),
            window: ReorderBuffer::new(self.settings.pool_size),
            tx: Some(tx),
            rx,
            stopped: false,
        }
    }

    fn spawn_site(
        &self,
        index: usize,
        site: String,
        tx: mpsc::UnboundedSender<(usize, SiteResult)>,
    ) {
        let fetcher = Arc::clone(&self.fetcher);
        let patterns = Arc::clone(&self.patterns);
        let settings = self.settings;
        let cancel = self.cancel.clone();

        // The handle is dropped on purpose: after an interrupt the task is left
        // to finish or time out on its own. A panic still fills the slot.
        tokio::spawn(async move {
            let work = process_site(site.clone(), fetcher.as_ref(), &patterns, settings, &cancel);
            let result = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(result) => result,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    tracing::error!("Task for {} panicked: {}", site, message);
                    SiteResult::failed(site, format!("task panicked: {}", message))
                }
            };
            let _ = tx.send((index, result));
        });
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Fetches and classifies one site
async fn process_site(
    site: String,
    fetcher: &dyn Fetcher,
    patterns: &PatternSet,
    settings: ScanSettings,
    cancel: &CancellationToken,
) -> SiteResult {
    tracing::info!("Processing {}...", site);

    let outcome = settings
        .retry
        .fetch_with_retry(fetcher, &site, settings.timeout, cancel)
        .await;

    let result = classify(site, outcome, patterns);
    if result.ok() {
        tracing::info!("Success processing site {}", result.site);
    }
    result
}

/// Lazy, input-ordered sequence of site results
pub struct OrderedResults {
    scheduler: Scheduler,
    pending: VecDeque<String>,
    window: ReorderBuffer<SiteResult>,
    /// Dropped once every site has been admitted (or the run stopped)
    tx: Option<mpsc::UnboundedSender<(usize, SiteResult)>>,
    rx: mpsc::UnboundedReceiver<(usize, SiteResult)>,
    stopped: bool,
}

impl OrderedResults {
    /// Waits for the next result in input order
    ///
    /// Returns `None` once every site has been yielded, or, after
    /// cancellation, once the already-completed prefix has been drained.
    pub async fn next(&mut self) -> Option<SiteResult> {
        loop {
            self.admit();

            if let Some(result) = self.window.pop_ready() {
                self.admit();
                return Some(result);
            }

            if self.scheduler.cancel.is_cancelled() {
                return self.drain_after_cancel();
            }

            if self.window.is_empty() {
                return None;
            }

            let received = tokio::select! {
                biased;
                _ = self.scheduler.cancel.cancelled() => continue,
                received = self.rx.recv() => received,
            };

            match received {
                Some((index, result)) => {
                    self.window.complete(index, result);
                }
                None => {
                    tracing::error!(
                        "{} site task(s) ended without a result; stopping",
                        self.window.len()
                    );
                    self.stop();
                    return None;
                }
            }
        }
    }

    /// Converts the sequence into a [`Stream`]
    pub fn into_stream(self) -> impl Stream<Item = SiteResult> {
        futures::stream::unfold(self, |mut results| async move {
            results.next().await.map(|result| (result, results))
        })
    }

    /// Number of site tasks dispatched but not yet yielded
    pub fn in_flight(&self) -> usize {
        self.window.len()
    }

    /// Number of sites not yet dispatched
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Fills free window slots with new site tasks
    fn admit(&mut self) {
        if self.stopped || self.scheduler.cancel.is_cancelled() {
            return;
        }

        while !self.window.is_full() {
            let Some(tx) = self.tx.as_ref() else {
                break;
            };
            let Some(site) = self.pending.pop_front() else {
                break;
            };
            let Some(index) = self.window.reserve() else {
                break;
            };
            self.scheduler.spawn_site(index, site, tx.clone());
        }

        if self.pending.is_empty() {
            self.tx = None;
        }
    }

    /// Picks up results that already arrived, then yields only the contiguous
    /// completed front of the window
    fn drain_after_cancel(&mut self) -> Option<SiteResult> {
        if !self.stopped {
            while let Ok((index, result)) = self.rx.try_recv() {
                self.window.complete(index, result);
            }
            tracing::info!(
                "Scan interrupted: {} site(s) in flight, {} never started",
                self.window.len(),
                self.pending.len()
            );
            self.stop();
        }

        self.window.pop_ready()
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.tx = None;
        self.pending.clear();
    }
}
