use serde::{Deserialize, Serialize};

/// Outcome payload of a processed site
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteOutcome {
    /// The page was fetched; ids of the bugs found in it, in id order
    Matched(Vec<u64>),
    /// Every attempt failed; message of the last failure
    Failed(String),
}

/// Per-site record emitted to the result stream
///
/// Serializes as `{"site", "ok": true, "bug_ids"}` or
/// `{"site", "ok": false, "error"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SiteRecord", try_from = "SiteRecord")]
pub struct SiteResult {
    pub site: String,
    pub outcome: SiteOutcome,
}

impl SiteResult {
    pub fn matched(site: impl Into<String>, bug_ids: Vec<u64>) -> Self {
        Self {
            site: site.into(),
            outcome: SiteOutcome::Matched(bug_ids),
        }
    }

    pub fn failed(site: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            outcome: SiteOutcome::Failed(error.into()),
        }
    }

    pub fn ok(&self) -> bool {
        matches!(self.outcome, SiteOutcome::Matched(_))
    }

    pub fn bug_ids(&self) -> Option<&[u64]> {
        match &self.outcome {
            SiteOutcome::Matched(ids) => Some(ids),
            SiteOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            SiteOutcome::Matched(_) => None,
            SiteOutcome::Failed(error) => Some(error),
        }
    }
}

/// Wire shape of a [`SiteResult`]
#[derive(Serialize, Deserialize)]
struct SiteRecord {
    site: String,
    ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bug_ids: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<SiteResult> for SiteRecord {
    fn from(result: SiteResult) -> Self {
        match result.outcome {
            SiteOutcome::Matched(ids) => SiteRecord {
                site: result.site,
                ok: true,
                bug_ids: Some(ids),
                error: None,
            },
            SiteOutcome::Failed(error) => SiteRecord {
                site: result.site,
                ok: false,
                bug_ids: None,
                error: Some(error),
            },
        }
    }
}

impl TryFrom<SiteRecord> for SiteResult {
    type Error = String;

    fn try_from(record: SiteRecord) -> Result<Self, Self::Error> {
        match (record.ok, record.bug_ids, record.error) {
            (true, Some(ids), None) => Ok(SiteResult::matched(record.site, ids)),
            (false, None, Some(error)) => Ok(SiteResult::failed(record.site, error)),
            (true, _, _) => Err(format!(
                "record for {} has ok=true but no bug_ids (or a stray error)",
                record.site
            )),
            (false, _, _) => Err(format!(
                "record for {} has ok=false but no error (or stray bug_ids)",
                record.site
            )),
        }
    }
}
