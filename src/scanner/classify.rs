use super::fetcher::FetchOutcome;
use super::result::SiteResult;
use crate::rules::PatternSet;

/// Turns a site's final fetch outcome into its result record
///
/// Bodies are run through the pattern set; failures carry their message and
/// skip matching entirely.
pub fn classify(
    site: impl Into<String>,
    outcome: FetchOutcome,
    patterns: &PatternSet,
) -> SiteResult {
    match outcome {
        FetchOutcome::Body(content) => SiteResult::matched(site, patterns.matches(&content)),
        FetchOutcome::Failed(error) => SiteResult::failed(site, error.message),
    }
}
