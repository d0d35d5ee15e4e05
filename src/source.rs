use crate::error::SkipReason;
use crate::record::Record;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug)]
pub enum RowError {
    /// This row is unusable; the stream can continue.
    Malformed { row: u64, reason: SkipReason },
    /// The underlying stream failed; nothing more can be read.
    Stream(String),
}

/// Sequential supply of rows. `None` means the stream is exhausted.
pub trait RowSourceLike {
    fn next_row(&mut self) -> Option<Result<Record, RowError>>;
}

/// Reads rows from CSV, accepting ragged rows.
pub struct CsvRowSource<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    next_row: u64,
    failed: bool,
}

impl<R: Read> CsvRowSource<R> {
    pub fn new(reader: R, has_headers: bool) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(has_headers)
            .flexible(true)
            .from_reader(reader);
        CsvRowSource {
            records: reader.into_records(),
            next_row: if has_headers { 2 } else { 1 },
            failed: false,
        }
    }
}

impl CsvRowSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>, has_headers: bool) -> std::io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), has_headers))
    }
}

impl<R: Read> RowSourceLike for CsvRowSource<R> {
    fn next_row(&mut self) -> Option<Result<Record, RowError>> {
        if self.failed {
            return None;
        }
        let fallback_row = self.next_row;
        self.next_row += 1;
        match self.records.next()? {
            Ok(record) => {
                let row = record.position().map(|p| p.line()).unwrap_or(fallback_row);
                let fields = record.iter().map(str::to_string).collect();
                Some(Ok(Record::new(row, fields)))
            }
            Err(err) if err.is_io_error() => {
                self.failed = true;
                Some(Err(RowError::Stream(err.to_string())))
            }
            Err(err) => {
                let row = err.position().map(|p| p.line()).unwrap_or(fallback_row);
                Some(Err(RowError::Malformed {
                    row,
                    reason: SkipReason::Unreadable(err.to_string()),
                }))
            }
        }
    }
}

/// In-memory source, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryRowSource {
    rows: VecDeque<Result<Record, RowError>>,
}

impl MemoryRowSource {
    /// Rows are numbered from 1 in the order given.
    pub fn from_rows<I, R, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, fields)| {
                Ok(Record::new(
                    i as u64 + 1,
                    fields.into_iter().map(Into::into).collect(),
                ))
            })
            .collect();
        MemoryRowSource { rows }
    }

    /// One single-column row per email, for callers that only care about the key.
    pub fn from_emails<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_rows(emails.into_iter().map(|e| vec![e.into()]))
    }

    pub fn push(&mut self, row: Result<Record, RowError>) {
        self.rows.push_back(row);
    }
}

impl RowSourceLike for MemoryRowSource {
    fn next_row(&mut self) -> Option<Result<Record, RowError>> {
        self.rows.pop_front()
    }
}
