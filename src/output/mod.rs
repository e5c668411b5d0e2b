//! Output module for the result stream and run tally
//!
//! This module handles:
//! - Streaming result records as one JSON array
//! - Keeping the run counters
//! - Reporting the final summary on the status channel

mod sink;
pub mod stats;

pub use sink::ResultSink;
pub use stats::{RunCounters, RunSummary};
