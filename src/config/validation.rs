use crate::config::types::{Config, ScanConfig, SourcesConfig};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_scan_config(&config.scan)?;
    validate_sources_config(&config.sources)?;
    Ok(())
}

/// Validates scan configuration
fn validate_scan_config(config: &ScanConfig) -> ConfigResult<()> {
    if config.max_connections < 1 || config.max_connections > 10_000 {
        return Err(ConfigError::Validation(format!(
            "max_connections must be between 1 and 10000, got {}",
            config.max_connections
        )));
    }

    if config.max_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "max_timeout must be >= 1s, got {}s",
            config.max_timeout
        )));
    }

    if let Some(agent) = &config.user_agent {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user_agent cannot be blank".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates source locations
fn validate_sources_config(config: &SourcesConfig) -> ConfigResult<()> {
    validate_source_url("bugs_url", &config.bugs_url)?;
    validate_source_url("sites_zip_url", &config.sites_zip_url)?;

    let caches = [
        ("bugs_cache", &config.bugs_cache),
        ("sites_zip_cache", &config.sites_zip_cache),
        ("sites_cache", &config.sites_cache),
    ];
    for (field, path) in caches {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
        }
    }

    if config.sites_csv_file.trim().is_empty() {
        return Err(ConfigError::Validation(
            "sites_csv_file cannot be blank".to_string(),
        ));
    }

    if config.max_sites_cache_size < 1 {
        return Err(ConfigError::Validation(
            "max_sites_cache_size must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_source_url(field: &str, value: &str) -> ConfigResult<()> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field,
            url.scheme()
        )));
    }

    Ok(())
}
