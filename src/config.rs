use crate::error::TallyError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub const DEFAULT_CHUNK_CAPACITY: usize = 1000;
pub const DEFAULT_MIN_RECORDS: u64 = 1000;
pub const DEFAULT_MAX_RECORDS: u64 = 1_000_000;
pub const DEFAULT_EMAIL_COLUMN: usize = 2;

/// Tunables for one engine run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum records per batch.
    pub chunk_capacity: usize,
    /// Smallest admissible count of valid records.
    pub min_records: u64,
    /// Largest admissible count of valid records.
    pub max_records: u64,
    /// Number of worker threads.
    pub workers: usize,
    /// Batches that may wait in the queue ahead of the workers.
    pub queue_depth: usize,
    /// Zero-based column holding the email address.
    pub email_column: usize,
    /// Whether the first CSV row is a header.
    pub has_headers: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
            min_records: DEFAULT_MIN_RECORDS,
            max_records: DEFAULT_MAX_RECORDS,
            workers,
            queue_depth: workers * 2,
            email_column: DEFAULT_EMAIL_COLUMN,
            has_headers: true,
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file; missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TallyError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            TallyError::Configuration(format!("cannot load {}: {}", path.display(), e))
        })?;
        let config: EngineConfig = serde_json::from_str(&data).map_err(|e| {
            TallyError::Configuration(format!("cannot load {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_chunk_capacity(mut self, chunk_capacity: usize) -> Self {
        self.chunk_capacity = chunk_capacity;
        self
    }

    pub fn with_bounds(mut self, min_records: u64, max_records: u64) -> Self {
        self.min_records = min_records;
        self.max_records = max_records;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self.queue_depth = self.queue_depth.max(workers);
        self
    }

    pub fn validate(&self) -> Result<(), TallyError> {
        if self.chunk_capacity == 0 {
            return Err(TallyError::Configuration(
                "chunk capacity must be positive".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(TallyError::Configuration(
                "at least one worker is required".to_string(),
            ));
        }
        if self.queue_depth == 0 {
            return Err(TallyError::Configuration(
                "queue depth must be positive".to_string(),
            ));
        }
        if self.min_records > self.max_records {
            return Err(TallyError::Configuration(format!(
                "min records ({}) exceeds max records ({})",
                self.min_records, self.max_records
            )));
        }
        Ok(())
    }

    pub fn log_summary(&self) {
        info!(
            chunk_capacity = self.chunk_capacity,
            workers = self.workers,
            queue_depth = self.queue_depth,
            min_records = self.min_records,
            max_records = self.max_records,
            email_column = self.email_column,
            "engine configuration"
        );
    }
}
