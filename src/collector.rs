use crate::error::TallyError;
use crate::tally::Tally;
use crate::worker::BatchTally;
use crossbeam_channel::Receiver;
use tracing::debug;

/// Sole owner of the global tally while a run is in progress.
///
/// Partial tallies arrive over a channel and are folded in one at a time, so
/// concurrent workers never touch the global counts directly.
#[derive(Debug, Default)]
pub struct MergeCollector {
    global: Tally,
    merged_batches: usize,
    counted: u64,
    skipped: u64,
}

/// The finished global tally plus what the workers reported alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected {
    pub tally: Tally,
    pub batches: usize,
    pub counted: u64,
    pub skipped: u64,
}

impl MergeCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, partial: BatchTally) {
        debug!(
            batch = partial.batch_index,
            domains = partial.tally.len(),
            "merging partial tally"
        );
        self.global.merge(partial.tally);
        self.counted += partial.counted;
        self.skipped += partial.skipped;
        self.merged_batches += 1;
    }

    /// Merges until every sender has been dropped.
    pub fn drain(mut self, results: Receiver<BatchTally>) -> Self {
        for partial in results {
            self.merge(partial);
        }
        self
    }

    /// Releases the global tally once all `expected` batches are in.
    pub fn finish(self, expected: usize) -> Result<Collected, TallyError> {
        if self.merged_batches != expected {
            return Err(TallyError::Internal(format!(
                "merged {} partial tallies but {} batches were dispatched",
                self.merged_batches, expected
            )));
        }
        Ok(Collected {
            tally: self.global,
            batches: self.merged_batches,
            counted: self.counted,
            skipped: self.skipped,
        })
    }
}
