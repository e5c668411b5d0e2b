//! Scooby main entry point
//!
//! This is the command-line interface for the Scooby tracker scanner.
//! Results are written to stdout; status messages are written to stderr.

use anyhow::Context;
use clap::Parser;
use scooby::config::{load_config, validate, Config};
use scooby::scanner::{build_http_client, run_scan, HttpFetcher, ScanSettings};
use scooby::sources::load_inputs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Scooby: find the tracking scripts used on each site of a site list
///
/// Every site's front page is fetched and checked against the bugs list. One
/// JSON record per site is streamed to stdout, in site-list order; status
/// messages go to stderr.
#[derive(Parser, Debug)]
#[command(name = "scooby")]
#[command(version = "1.0.0")]
#[command(about = "Find the tracking scripts used across a list of websites", long_about = None)]
struct Cli {
    /// Optional TOML configuration file; flags override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Recreate all the caches
    #[arg(short, long)]
    recache: bool,

    /// Do not show any status messages
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of concurrent connections [default: 100]
    #[arg(long)]
    max_connections: Option<usize>,

    /// Number of sites to process [default: 1000]
    #[arg(long)]
    max_sites: Option<usize>,

    /// Number of seconds per request [default: 60]
    #[arg(long)]
    max_timeout: Option<u64>,

    /// Number of retries per request [default: 3]
    #[arg(long)]
    max_retries: Option<u32>,

    /// Location of the bugs list
    #[arg(long)]
    bugs_url: Option<String>,

    /// Path to local bugs list cache
    #[arg(long)]
    bugs_cache: Option<PathBuf>,

    /// Location of the site list archive
    #[arg(long)]
    sites_zip_url: Option<String>,

    /// Path to local site list archive cache
    #[arg(long)]
    sites_zip_cache: Option<PathBuf>,

    /// Name of the site list inside the archive [default: top-1m.csv]
    #[arg(long)]
    sites_csv_file: Option<String>,

    /// Path to local extracted site list cache
    #[arg(long)]
    sites_cache: Option<PathBuf>,

    /// Number of sites to extract [default: 100000]
    #[arg(long)]
    max_sites_cache_size: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = resolve_config(&cli).context("Invalid configuration")?;

    let client = build_http_client(&config.scan).context("Failed to build HTTP client")?;

    // Setup failures stop here, before any output is written
    let (patterns, sites) = load_inputs(&config, &client)
        .await
        .context("Failed to load inputs")?;

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let summary = run_scan(
        ScanSettings::from(&config),
        Arc::new(patterns),
        sites,
        Arc::new(HttpFetcher::new(client)),
        std::io::stdout(),
        cancel,
    )
    .await
    .context("Scan failed")?;

    if !summary.is_complete() {
        tracing::warn!(
            "{} of {} sites were not processed",
            summary.total - summary.processed,
            summary.total
        );
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so they never mix with the result stream.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else {
        match verbose {
            0 => EnvFilter::new("scooby=info,warn"),
            1 => EnvFilter::new("scooby=debug,info"),
            2 => EnvFilter::new("scooby=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Layers command-line flags over the config file (or the defaults)
fn resolve_config(cli: &Cli) -> scooby::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };

    let scan = &mut config.scan;
    if let Some(value) = cli.max_connections {
        scan.max_connections = value;
    }
    if let Some(value) = cli.max_sites {
        scan.max_sites = value;
    }
    if let Some(value) = cli.max_timeout {
        scan.max_timeout = value;
    }
    if let Some(value) = cli.max_retries {
        scan.max_retries = value;
    }

    let sources = &mut config.sources;
    if let Some(value) = &cli.bugs_url {
        sources.bugs_url = value.clone();
    }
    if let Some(value) = &cli.bugs_cache {
        sources.bugs_cache = value.clone();
    }
    if let Some(value) = &cli.sites_zip_url {
        sources.sites_zip_url = value.clone();
    }
    if let Some(value) = &cli.sites_zip_cache {
        sources.sites_zip_cache = value.clone();
    }
    if let Some(value) = &cli.sites_csv_file {
        sources.sites_csv_file = value.clone();
    }
    if let Some(value) = &cli.sites_cache {
        sources.sites_cache = value.clone();
    }
    if let Some(value) = cli.max_sites_cache_size {
        sources.max_sites_cache_size = value;
    }
    sources.recache |= cli.recache;

    validate(&config)?;
    Ok(config)
}

/// Cancels the run on Ctrl+C
///
/// Results already completed are still written and the array is closed.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted; finishing up");
            cancel.cancel();
        }
    });
}
