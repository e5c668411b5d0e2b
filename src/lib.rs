//! Scooby: a concurrent tracker-signature scanner
//!
//! This crate fetches the front page of every site in a list, tests each body
//! against a set of compiled "bug" patterns, and streams one JSON record per
//! site in input order while keeping a bounded number of requests in flight.

pub mod config;
pub mod output;
pub mod rules;
pub mod scanner;
pub mod sources;

use thiserror::Error;

/// Main error type for setup-level Scooby operations
///
/// Per-site failures never surface here; they are carried as data inside
/// [`scanner::SiteResult`].
#[derive(Debug, Error)]
pub enum ScoobyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Output error: {0}")]
    Output(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Scooby operations
pub type Result<T> = std::result::Result<T, ScoobyError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use output::{ResultSink, RunSummary};
pub use rules::{PatternSet, Rule, RulePattern, RuleRow};
pub use scanner::{run_scan, FetchError, FetchErrorKind, FetchOutcome, SiteResult};
