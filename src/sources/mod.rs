//! Input sources: the bugs list and the site list
//!
//! Both lists are downloaded once into a local cache and read from there on
//! later runs. The site list arrives as a zip archive; the leading rows of
//! its CSV member are extracted into a second cache. Any failure here aborts
//! the run before the result stream is opened.

use crate::config::Config;
use crate::rules::{PatternSet, RuleRow};
use crate::ScoobyError;
use reqwest::Client;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use zip::ZipArchive;

/// Top-level shape of the bugs list
#[derive(Debug, Deserialize)]
struct BugsDocument {
    bugs: Vec<RuleRow>,
}

/// Downloads `url` into `path` unless a cached copy exists
///
/// # Returns
///
/// * `Ok(true)` - The file was (re)downloaded
/// * `Ok(false)` - The cached copy was kept
pub async fn ensure_cached(
    client: &Client,
    url: &str,
    path: &Path,
    recache: bool,
) -> Result<bool, ScoobyError> {
    if !recache && tokio::fs::try_exists(path).await? {
        tracing::debug!("Using cached {}", path.display());
        return Ok(false);
    }

    tracing::info!("Downloading {}...", url);
    let http_error = |source: reqwest::Error| ScoobyError::Http {
        url: url.to_string(),
        source,
    };
    let body = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(http_error)?
        .bytes()
        .await
        .map_err(http_error)?;

    tokio::fs::write(path, &body).await?;
    Ok(true)
}

/// Reads the raw rows of a cached bugs list
pub fn read_bug_rows(path: &Path) -> Result<Vec<RuleRow>, ScoobyError> {
    let content = std::fs::read_to_string(path)?;
    parse_bug_rows(&content)
}

/// Parses a bugs list document: `{"bugs": [{"id", "name", "type", "pattern"}, ...]}`
pub fn parse_bug_rows(content: &str) -> Result<Vec<RuleRow>, ScoobyError> {
    let document: BugsDocument = serde_json::from_str(content)?;
    Ok(document.bugs)
}

/// Copies the first `max_rows` lines of `csv_file` inside `archive` to `dest`
///
/// Skipped when `dest` already exists, unless `recache` is set.
///
/// # Returns
///
/// * `Ok(true)` - The site list was (re)extracted
/// * `Ok(false)` - The extracted copy was kept
pub fn extract_sites(
    archive: &Path,
    csv_file: &str,
    dest: &Path,
    max_rows: usize,
    recache: bool,
) -> Result<bool, ScoobyError> {
    if !recache && dest.try_exists()? {
        tracing::debug!("Using extracted {}", dest.display());
        return Ok(false);
    }

    tracing::info!("Extracting sites...");
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    let member = zip.by_name(csv_file)?;

    let mut writer = BufWriter::new(File::create(dest)?);
    for line in BufReader::new(member).lines().take(max_rows) {
        writeln!(writer, "{}", line?)?;
    }
    writer.flush()?;

    Ok(true)
}

/// Reads up to `max_sites` hostnames from a cached site list
pub fn read_sites(path: &Path, max_sites: usize) -> Result<Vec<String>, ScoobyError> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_sites(&content, max_sites))
}

/// Parses `rank,host` rows (or bare `host` rows), keeping input order
///
/// Blank rows, malformed rows and rows without a host are skipped; duplicates
/// are kept.
pub fn parse_sites(content: &str, max_sites: usize) -> Vec<String> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes())
        .into_records()
        .filter_map(|record| record.ok())
        .filter_map(|record| {
            let host = record.get(1).or_else(|| record.get(0))?.trim();
            (!host.is_empty()).then(|| host.to_string())
        })
        .take(max_sites)
        .collect()
}

/// Fetches (if needed) and reads both inputs
///
/// # Returns
///
/// The compiled pattern set and the ordered site list
pub async fn load_inputs(
    config: &Config,
    client: &Client,
) -> Result<(PatternSet, Vec<String>), ScoobyError> {
    let sources = &config.sources;

    ensure_cached(client, &sources.bugs_url, &sources.bugs_cache, sources.recache).await?;
    tracing::info!("Reading bugs...");
    let rows = read_bug_rows(&sources.bugs_cache)?;
    let (patterns, skipped) = PatternSet::load(rows);
    if skipped > 0 {
        tracing::warn!("Ignored {} bugs with invalid patterns", skipped);
    }
    tracing::info!("Read {} bugs", patterns.len());

    ensure_cached(
        client,
        &sources.sites_zip_url,
        &sources.sites_zip_cache,
        sources.recache,
    )
    .await?;
    extract_sites(
        &sources.sites_zip_cache,
        &sources.sites_csv_file,
        &sources.sites_cache,
        sources.max_sites_cache_size,
        sources.recache,
    )?;
    tracing::info!("Reading sites...");
    let sites = read_sites(&sources.sites_cache, config.scan.max_sites)?;
    tracing::info!("Read {} sites", sites.len());

    Ok((patterns, sites))
}
