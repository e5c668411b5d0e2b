use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Scooby
///
/// Built once at startup and passed by reference to every component.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub sources: SourcesConfig,
}

impl Config {
    /// Per-request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.scan.max_timeout)
    }
}

/// Scan behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScanConfig {
    /// Maximum number of sites fetched concurrently
    pub max_connections: usize,

    /// Maximum number of sites taken from the site list
    pub max_sites: usize,

    /// Hard upper bound on a single request, in seconds
    pub max_timeout: u64,

    /// Retries issued after the first failed attempt of a site
    pub max_retries: u32,

    /// Optional User-Agent header sent with every request
    pub user_agent: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_connections: 100,
            max_sites: 1000,
            max_timeout: 60,
            max_retries: 3,
            user_agent: None,
        }
    }
}

/// Locations of the bugs list and the site list
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SourcesConfig {
    /// Where the bugs list is downloaded from
    pub bugs_url: String,

    /// Local cache of the bugs list
    pub bugs_cache: PathBuf,

    /// Where the zipped `rank,host` site list is downloaded from
    pub sites_zip_url: String,

    /// Local cache of the site list archive
    pub sites_zip_cache: PathBuf,

    /// Name of the CSV member inside the archive
    pub sites_csv_file: String,

    /// Local cache of the extracted site list
    pub sites_cache: PathBuf,

    /// Number of rows extracted from the archive
    pub max_sites_cache_size: usize,

    /// Download both lists again even when caches exist
    pub recache: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            bugs_url: "http://www.ghostery.com/update/bugs?format=json".to_string(),
            bugs_cache: PathBuf::from("/tmp/scooby_bugs.json"),
            sites_zip_url: "http://s3.amazonaws.com/alexa-static/top-1m.csv.zip".to_string(),
            sites_zip_cache: PathBuf::from("/tmp/scooby_all_sites.csv.zip"),
            sites_csv_file: "top-1m.csv".to_string(),
            sites_cache: PathBuf::from("/tmp/scooby_sites.csv"),
            max_sites_cache_size: 100_000,
            recache: false,
        }
    }
}
