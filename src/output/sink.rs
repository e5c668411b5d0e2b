use super::stats::{RunCounters, RunSummary};
use crate::scanner::SiteResult;
use crate::ScoobyError;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Idle,
    Open,
    Closed,
}

/// Streams result records as a single JSON array
///
/// The separator goes in front of every record but the first and the writer
/// is flushed after each record, so any prefix of the output is one `]` away
/// from a complete document. Dropping an open sink closes the array.
pub struct ResultSink<W: Write> {
    writer: W,
    counters: RunCounters,
    state: SinkState,
}

impl<W: Write> ResultSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            counters: RunCounters::default(),
            state: SinkState::Idle,
        }
    }

    /// Opens the array and records the run size
    pub fn begin(&mut self, total: usize) -> Result<(), ScoobyError> {
        if self.state != SinkState::Idle {
            return Err(ScoobyError::Output("result stream already started".to_string()));
        }

        self.counters = RunCounters::new(total);
        self.state = SinkState::Open;
        self.writer.write_all(b"[\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Writes one record and counts it
    pub fn accept(&mut self, result: &SiteResult) -> Result<(), ScoobyError> {
        if self.state != SinkState::Open {
            return Err(ScoobyError::Output(format!(
                "result for {} arrived outside an open stream",
                result.site
            )));
        }

        let separator: &[u8] = if self.counters.processed == 0 { b"  " } else { b", " };
        let mut line = separator.to_vec();
        serde_json::to_writer(&mut line, result)?;
        line.push(b'\n');

        self.writer.write_all(&line)?;
        self.writer.flush()?;

        self.counters.record(result.ok());
        tracing::debug!(
            "Emitted {} ({}/{})",
            result.site,
            self.counters.processed,
            self.counters.total
        );
        Ok(())
    }

    /// Closes the array and reports the tally
    ///
    /// Only the first call writes anything; later calls return the same tally.
    pub fn end(&mut self) -> Result<RunSummary, ScoobyError> {
        if self.state == SinkState::Open {
            self.state = SinkState::Closed;
            self.writer.write_all(b"]\n")?;
            self.writer.flush()?;
            tracing::info!("{}", self.counters.summary());
        }
        self.state = SinkState::Closed;
        Ok(self.counters.summary())
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }
}

impl<W: Write> Drop for ResultSink<W> {
    fn drop(&mut self) {
        if self.state == SinkState::Open {
            if let Err(e) = self.end() {
                tracing::error!("Failed to close result stream: {}", e);
            }
        }
    }
}
