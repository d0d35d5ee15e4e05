use crate::error::SkipReason;
use std::sync::Mutex;
use tracing::debug;

/// Receives one notification per skipped row. Implementations must not block.
pub trait DiagnosticsLike: Send + Sync {
    fn row_skipped(&self, row: u64, reason: &SkipReason);
}

/// Logs each skip at debug level; the engine summarises at info.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticsLike for TracingDiagnostics {
    fn row_skipped(&self, row: u64, reason: &SkipReason) {
        debug!(row, %reason, "skipping row");
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    skips: Mutex<Vec<(u64, SkipReason)>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded skips sorted by row number.
    pub fn skips(&self) -> Vec<(u64, SkipReason)> {
        let mut skips = match self.skips.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        skips.sort_by_key(|(row, _)| *row);
        skips
    }
}

impl DiagnosticsLike for RecordingDiagnostics {
    fn row_skipped(&self, row: u64, reason: &SkipReason) {
        let mut skips = match self.skips.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        skips.push((row, reason.clone()));
    }
}
