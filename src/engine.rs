use crate::chunk::{Batch, ChunkSource};
use crate::collector::{Collected, MergeCollector};
use crate::config::EngineConfig;
use crate::diagnostics::{DiagnosticsLike, TracingDiagnostics};
use crate::error::{Bound, TallyError};
use crate::rank::{rank, RankedEntry};
use crate::sink::ResultSinkLike;
use crate::source::{CsvRowSource, RowSourceLike};
use crate::tally::Tally;
use crate::worker::WorkerPool;
use crossbeam_channel::{bounded, SendError};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{info, warn};

/// Row accounting for one run. `rows_read == counted + skipped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Rows delivered by the source, including undecodable ones.
    pub rows_read: u64,
    /// Rows whose domain made it into the tally.
    pub counted: u64,
    /// Rows left out for any reason.
    pub skipped: u64,
    /// Subset of `skipped` the source could not decode.
    pub read_failures: u64,
    pub batches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub tally: Tally,
    pub ranked: Vec<RankedEntry>,
    pub stats: RunStats,
}

impl Report {
    /// Hands the ranking to `sink`. Failures here leave the report intact.
    pub fn write_to<S: ResultSinkLike + ?Sized>(&self, sink: &mut S) -> Result<(), TallyError> {
        sink.write(&self.ranked)
    }
}

pub struct Engine {
    config: EngineConfig,
    diagnostics: Arc<dyn DiagnosticsLike>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, TallyError> {
        config.validate()?;
        Ok(Engine {
            config,
            diagnostics: Arc::new(TracingDiagnostics),
        })
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsLike>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Opens `path` as CSV and runs on it.
    pub fn run_path(&self, path: impl AsRef<Path>) -> Result<Report, TallyError> {
        let path = path.as_ref();
        let source = CsvRowSource::open(path, self.config.has_headers).map_err(|e| {
            TallyError::Stream {
                rows_read: 0,
                reason: format!("cannot open {}: {}", path.display(), e),
            }
        })?;
        info!(input = %path.display(), "reading input");
        self.run(source)
    }

    /// Tallies every row of `source` and ranks the result.
    ///
    /// Batches are counted on the worker pool while this thread keeps reading.
    /// A stream failure stops dispatch, lets in-flight batches finish and then
    /// fails the whole run.
    pub fn run<S: RowSourceLike>(&self, source: S) -> Result<Report, TallyError> {
        let started = Instant::now();
        let diagnostics: &dyn DiagnosticsLike = &*self.diagnostics;
        let mut chunks = ChunkSource::new(source, self.config.chunk_capacity, diagnostics)?;
        let pool = WorkerPool::new(self.config.workers, self.config.email_column);

        let (batch_tx, batch_rx) = bounded::<Batch>(self.config.queue_depth);
        let (result_tx, result_rx) = bounded(self.config.queue_depth);

        let (dispatched, stream_error, collector) = thread::scope(|scope| {
            let collector = scope.spawn(move || MergeCollector::new().drain(result_rx));
            let workers = pool.spawn(scope, batch_rx, result_tx, diagnostics);

            let mut dispatched = 0usize;
            let mut stream_error = None;
            for next in chunks.by_ref() {
                match next {
                    Ok(batch) => {
                        if let Err(SendError(_)) = batch_tx.send(batch) {
                            stream_error = Some(TallyError::Internal(
                                "all workers exited before the input was consumed".to_string(),
                            ));
                            break;
                        }
                        dispatched += 1;
                    }
                    Err(err) => {
                        stream_error = Some(err);
                        break;
                    }
                }
            }
            drop(batch_tx);

            let mut panicked = 0;
            for handle in workers {
                if handle.join().is_err() {
                    panicked += 1;
                }
            }
            let collector = collector.join();
            if panicked > 0 {
                return (
                    dispatched,
                    Some(TallyError::Internal(format!("{} worker(s) panicked", panicked))),
                    None,
                );
            }
            (dispatched, stream_error, collector.ok())
        });

        if let Some(err) = stream_error {
            warn!(batches = dispatched, "run aborted, discarding partial tally");
            return Err(err);
        }
        let collector =
            collector.ok_or_else(|| TallyError::Internal("merge collector panicked".to_string()))?;
        let Collected {
            tally,
            batches,
            counted,
            skipped,
        } = collector.finish(dispatched)?;

        let stats = RunStats {
            rows_read: chunks.records_read() + chunks.read_failures(),
            counted,
            skipped: skipped + chunks.read_failures(),
            read_failures: chunks.read_failures(),
            batches,
        };
        info!(
            processed = stats.counted,
            skipped = stats.skipped,
            batches = stats.batches,
            workers = pool.size(),
            domains = tally.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "summary"
        );

        self.check_bounds(stats.counted)?;
        let ranked = rank(&tally);
        Ok(Report {
            tally,
            ranked,
            stats,
        })
    }

    fn check_bounds(&self, count: u64) -> Result<(), TallyError> {
        let bound = if count == 0 {
            Bound::Empty
        } else if count < self.config.min_records {
            Bound::TooFew
        } else if count > self.config.max_records {
            Bound::TooMany
        } else {
            return Ok(());
        };
        Err(TallyError::RecordCountOutOfBounds {
            bound,
            count,
            min: self.config.min_records,
            max: self.config.max_records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::error::SkipReason;
    use crate::record::Record;
    use crate::source::{MemoryRowSource, RowError};

    fn config(chunk_capacity: usize, workers: usize) -> EngineConfig {
        EngineConfig {
            chunk_capacity,
            min_records: 1,
            max_records: 1_000_000,
            workers,
            queue_depth: 2,
            email_column: 0,
            has_headers: false,
        }
    }

    fn sample_emails(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| match i % 7 {
                0 => "broken".to_string(),
                1 | 2 => format!("u{}@alpha.com", i),
                3 => format!("u{}@beta.org", i),
                4 => format!("u{}@gamma.io", i),
                5 => format!("@nobody{}.com", i),
                _ => format!("u{}@alpha.com", i),
            })
            .collect()
    }

    #[test]
    fn test_end_to_end_scenario() {
        let engine = Engine::new(config(2, 2)).unwrap();
        let report = engine
            .run(MemoryRowSource::from_emails(["a@x.com", "b@x.com", "c@y.com", "bad-email"]))
            .unwrap();
        assert_eq!(report.tally.get("x.com"), 2);
        assert_eq!(report.tally.get("y.com"), 1);
        assert_eq!(report.tally.len(), 2);
        assert_eq!(
            report.ranked,
            vec![RankedEntry::new("x.com", 2), RankedEntry::new("y.com", 1)]
        );
        assert_eq!(report.stats.counted, 3);
        assert_eq!(report.stats.skipped, 1);
        assert_eq!(report.stats.rows_read, 4);
    }

    #[test]
    fn test_chunk_capacity_does_not_change_result() {
        let emails = sample_emails(503);
        let baseline = Engine::new(config(1000, 1))
            .unwrap()
            .run(MemoryRowSource::from_emails(emails.clone()))
            .unwrap();
        for capacity in [1, 2, 7, 64, 502, 503, 504] {
            for workers in [1, 3, 8] {
                let report = Engine::new(config(capacity, workers))
                    .unwrap()
                    .run(MemoryRowSource::from_emails(emails.clone()))
                    .unwrap();
                assert_eq!(report.tally, baseline.tally, "capacity {}", capacity);
                assert_eq!(report.ranked, baseline.ranked);
                assert_eq!(report.stats.counted, baseline.stats.counted);
            }
        }
    }

    #[test]
    fn test_skip_accounting() {
        let emails = sample_emails(700);
        let malformed = emails.iter().enumerate().filter(|(i, _)| i % 7 == 0 || i % 7 == 5).count() as u64;
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let engine = Engine::new(config(50, 4))
            .unwrap()
            .with_diagnostics(diagnostics.clone());
        let report = engine.run(MemoryRowSource::from_emails(emails)).unwrap();
        assert_eq!(report.stats.skipped, malformed);
        assert_eq!(report.stats.counted, 700 - malformed);
        assert_eq!(report.tally.total(), 700 - malformed);
        assert_eq!(diagnostics.skips().len() as u64, malformed);
    }

    #[test]
    fn test_read_failures_count_as_skips() {
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let mut source = MemoryRowSource::from_emails(["a@x.com"]);
        source.push(Err(RowError::Malformed {
            row: 2,
            reason: SkipReason::Unreadable("bad quoting".into()),
        }));
        source.push(Ok(Record::new(3, vec!["b@x.com".into()])));
        let report = Engine::new(config(10, 1))
            .unwrap()
            .with_diagnostics(diagnostics.clone())
            .run(source)
            .unwrap();
        assert_eq!(report.stats.rows_read, 3);
        assert_eq!(report.stats.counted, 2);
        assert_eq!(report.stats.skipped, 1);
        assert_eq!(report.stats.read_failures, 1);
        assert_eq!(diagnostics.skips()[0].0, 2);
    }

    #[test]
    fn test_zero_valid_records_rejected() {
        let engine = Engine::new(config(10, 2)).unwrap();
        let err = engine
            .run(MemoryRowSource::from_emails(["nope", "still-nope"]))
            .unwrap_err();
        assert!(matches!(
            err,
            TallyError::RecordCountOutOfBounds { bound: Bound::Empty, count: 0, .. }
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        let engine = Engine::new(config(10, 2)).unwrap();
        let err = engine.run(MemoryRowSource::default()).unwrap_err();
        assert!(matches!(err, TallyError::RecordCountOutOfBounds { count: 0, .. }));
    }

    #[test]
    fn test_exact_minimum_accepted_and_one_less_rejected() {
        let cfg = config(16, 2).with_bounds(100, 200);
        let emails: Vec<String> = (0..100).map(|i| format!("u{}@x.com", i)).collect();
        let report = Engine::new(cfg.clone())
            .unwrap()
            .run(MemoryRowSource::from_emails(emails.clone()))
            .unwrap();
        assert_eq!(report.stats.counted, 100);

        let err = Engine::new(cfg)
            .unwrap()
            .run(MemoryRowSource::from_emails(emails.into_iter().skip(1)))
            .unwrap_err();
        assert!(matches!(
            err,
            TallyError::RecordCountOutOfBounds { bound: Bound::TooFew, count: 99, .. }
        ));
    }

    #[test]
    fn test_too_many_records_rejected() {
        let cfg = config(4, 2).with_bounds(1, 5);
        let emails: Vec<String> = (0..6).map(|i| format!("u{}@x.com", i)).collect();
        let err = Engine::new(cfg)
            .unwrap()
            .run(MemoryRowSource::from_emails(emails))
            .unwrap_err();
        assert!(matches!(
            err,
            TallyError::RecordCountOutOfBounds { bound: Bound::TooMany, count: 6, .. }
        ));
    }

    #[test]
    fn test_stream_failure_fails_the_run() {
        let mut source =
            MemoryRowSource::from_emails((0..40).map(|i| format!("u{}@x.com", i)));
        source.push(Err(RowError::Stream("device error".into())));
        let err = Engine::new(config(8, 3)).unwrap().run(source).unwrap_err();
        assert!(matches!(err, TallyError::Stream { rows_read: 40, .. }));
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        assert!(Engine::new(config(0, 1)).is_err());
    }
}
