//! Run counters and the final tally

use std::fmt;

/// Running counters, owned by the sink and updated by it alone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Number of sites the run started with
    pub total: usize,

    /// Records emitted so far
    pub processed: usize,

    /// Emitted records with `ok: true`
    pub successes: usize,
}

impl RunCounters {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, ok: bool) {
        self.processed += 1;
        if ok {
            self.successes += 1;
        }
    }

    pub fn failures(&self) -> usize {
        self.processed - self.successes
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            processed: self.processed,
            total: self.total,
            successes: self.successes,
            failures: self.failures(),
        }
    }
}

/// Final tally of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
}

impl RunSummary {
    /// Whether every site of the run produced a record
    pub fn is_complete(&self) -> bool {
        self.processed == self.total
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} out of {} sites with {} successes and {} failures",
            self.processed, self.total, self.successes, self.failures
        )
    }
}
