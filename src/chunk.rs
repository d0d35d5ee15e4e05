use crate::diagnostics::DiagnosticsLike;
use crate::error::TallyError;
use crate::record::Record;
use crate::source::{RowError, RowSourceLike};
use tracing::warn;

/// At most `capacity` records, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub index: usize,
    pub records: Vec<Record>,
}

/// Lazily groups rows from a source into batches.
///
/// Undecodable rows are skipped and counted. A stream failure is yielded once
/// and ends the sequence; the partially filled batch is dropped with it.
pub struct ChunkSource<'a, S: RowSourceLike> {
    source: S,
    capacity: usize,
    diagnostics: &'a dyn DiagnosticsLike,
    next_index: usize,
    records_read: u64,
    read_failures: u64,
    done: bool,
}

impl<'a, S: RowSourceLike> ChunkSource<'a, S> {
    pub fn new(
        source: S,
        capacity: usize,
        diagnostics: &'a dyn DiagnosticsLike,
    ) -> Result<Self, TallyError> {
        if capacity == 0 {
            return Err(TallyError::Configuration(
                "chunk capacity must be positive".to_string(),
            ));
        }
        Ok(ChunkSource {
            source,
            capacity,
            diagnostics,
            next_index: 0,
            records_read: 0,
            read_failures: 0,
            done: false,
        })
    }

    /// Rows successfully decoded and placed into batches.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Rows the source could not decode.
    pub fn read_failures(&self) -> u64 {
        self.read_failures
    }

    fn emit(&mut self, records: Vec<Record>) -> Batch {
        let batch = Batch {
            index: self.next_index,
            records,
        };
        self.next_index += 1;
        batch
    }
}

impl<S: RowSourceLike> Iterator for ChunkSource<'_, S> {
    type Item = Result<Batch, TallyError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut records = Vec::with_capacity(self.capacity);
        loop {
            match self.source.next_row() {
                Some(Ok(record)) => {
                    self.records_read += 1;
                    records.push(record);
                    if records.len() == self.capacity {
                        return Some(Ok(self.emit(records)));
                    }
                }
                Some(Err(RowError::Malformed { row, reason })) => {
                    self.read_failures += 1;
                    self.diagnostics.row_skipped(row, &reason);
                }
                Some(Err(RowError::Stream(reason))) => {
                    self.done = true;
                    warn!(
                        rows_read = self.records_read,
                        batches = self.next_index,
                        %reason,
                        "row source failed, no further batches will be dispatched"
                    );
                    return Some(Err(TallyError::Stream {
                        rows_read: self.records_read + self.read_failures,
                        reason,
                    }));
                }
                None => {
                    self.done = true;
                    if records.is_empty() {
                        return None;
                    }
                    return Some(Ok(self.emit(records)));
                }
            }
        }
    }
}
