pub mod chunk;
pub mod collector;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod extract;
pub mod rank;
pub mod record;
pub mod sink;
pub mod source;
pub mod tally;
pub mod worker;

pub use config::EngineConfig;
pub use diagnostics::{DiagnosticsLike, RecordingDiagnostics, TracingDiagnostics};
pub use engine::{Engine, Report, RunStats};
pub use error::*;
pub use extract::extract_domain;
pub use rank::{rank, RankedEntry};
pub use record::Record;
pub use sink::{JsonSink, LineSink, ResultSinkLike};
pub use source::{CsvRowSource, MemoryRowSource, RowError, RowSourceLike};
pub use tally::Tally;

use tracing_subscriber::EnvFilter;

/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG` (default `info`).
/// Calling it more than once is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
