//! Configuration module for Scooby
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so a scan can run with no file at all; command-line
//! flags are layered on top by the binary.
//!
//! # Example
//!
//! ```no_run
//! use scooby::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scooby.toml")).unwrap();
//! println!("Scanning with {} connections", config.scan.max_connections);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, ScanConfig, SourcesConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
