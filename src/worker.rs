use crate::chunk::Batch;
use crate::diagnostics::DiagnosticsLike;
use crate::extract::extract_domain;
use crate::tally::Tally;
use crossbeam_channel::{Receiver, Sender};
use std::thread::{Scope, ScopedJoinHandle};
use tracing::debug;

/// What one batch contributed, handed to the collector exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTally {
    pub batch_index: usize,
    pub tally: Tally,
    pub counted: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct Worker {
    pub id: usize,
    pub email_column: usize,
}

impl Worker {
    pub fn new(id: usize, email_column: usize) -> Self {
        Worker { id, email_column }
    }

    /// Counts one batch. Bad rows are reported and skipped, never fatal.
    pub fn process(&self, batch: Batch, diagnostics: &dyn DiagnosticsLike) -> BatchTally {
        let mut tally = Tally::new();
        let mut counted = 0;
        let mut skipped = 0;
        for record in &batch.records {
            match record.field(self.email_column).and_then(extract_domain) {
                Ok(domain) => {
                    tally.increment(domain);
                    counted += 1;
                }
                Err(reason) => {
                    diagnostics.row_skipped(record.row(), &reason);
                    skipped += 1;
                }
            }
        }
        debug!(
            worker = self.id,
            batch = batch.index,
            counted,
            skipped,
            domains = tally.len(),
            "batch done"
        );
        BatchTally {
            batch_index: batch.index,
            tally,
            counted,
            skipped,
        }
    }

    /// Pulls batches until the queue closes. Returns how many it processed.
    pub fn run(
        &self,
        batches: Receiver<Batch>,
        results: Sender<BatchTally>,
        diagnostics: &dyn DiagnosticsLike,
    ) -> usize {
        let mut processed = 0;
        for batch in batches {
            let outcome = self.process(batch, diagnostics);
            processed += 1;
            if results.send(outcome).is_err() {
                // collector is gone; nothing left to hand results to
                break;
            }
        }
        processed
    }
}

/// Fixed set of worker threads fed from one batch queue.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
    email_column: usize,
}

impl WorkerPool {
    pub fn new(workers: usize, email_column: usize) -> Self {
        WorkerPool {
            workers: workers.max(1),
            email_column,
        }
    }

    pub fn size(&self) -> usize {
        self.workers
    }

    /// Starts the workers inside `scope`. Each holds its own clone of the
    /// channels, so `results` closes once every worker has exited.
    pub fn spawn<'scope, 'env>(
        &self,
        scope: &'scope Scope<'scope, 'env>,
        batches: Receiver<Batch>,
        results: Sender<BatchTally>,
        diagnostics: &'env dyn DiagnosticsLike,
    ) -> Vec<ScopedJoinHandle<'scope, usize>> {
        (0..self.workers)
            .map(|id| {
                let worker = Worker::new(id, self.email_column);
                let batches = batches.clone();
                let results = results.clone();
                scope.spawn(move || worker.run(batches, results, diagnostics))
            })
            .collect()
    }
}
