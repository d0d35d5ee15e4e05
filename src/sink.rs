use crate::error::TallyError;
use crate::rank::RankedEntry;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Accepts the final ranking. Every failure is a [`TallyError::Sink`].
pub trait ResultSinkLike {
    fn write(&mut self, entries: &[RankedEntry]) -> Result<(), TallyError>;
}

fn sink_error(context: &str, err: impl std::fmt::Display) -> TallyError {
    TallyError::Sink(format!("{}: {}", context, err))
}

/// One `domain: count` line per entry.
pub struct LineSink<W: Write> {
    out: W,
}

impl<W: Write> LineSink<W> {
    pub fn new(out: W) -> Self {
        LineSink { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl LineSink<BufWriter<File>> {
    /// Creates or truncates `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, TallyError> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| sink_error(&format!("cannot create {}", path.display()), e))?;
        Ok(LineSink::new(BufWriter::new(file)))
    }
}

impl LineSink<io::Stdout> {
    pub fn stdout() -> Self {
        LineSink::new(io::stdout())
    }
}

impl<W: Write> ResultSinkLike for LineSink<W> {
    fn write(&mut self, entries: &[RankedEntry]) -> Result<(), TallyError> {
        for entry in entries {
            writeln!(self.out, "{}", entry).map_err(|e| sink_error("write failed", e))?;
        }
        self.out.flush().map_err(|e| sink_error("flush failed", e))
    }
}

/// A JSON array of `{"domain": .., "count": ..}` objects.
pub struct JsonSink<W: Write> {
    out: W,
    pretty: bool,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W, pretty: bool) -> Self {
        JsonSink { out, pretty }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl JsonSink<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>, pretty: bool) -> Result<Self, TallyError> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| sink_error(&format!("cannot create {}", path.display()), e))?;
        Ok(JsonSink::new(BufWriter::new(file), pretty))
    }
}

impl<W: Write> ResultSinkLike for JsonSink<W> {
    fn write(&mut self, entries: &[RankedEntry]) -> Result<(), TallyError> {
        let written = if self.pretty {
            serde_json::to_writer_pretty(&mut self.out, entries)
        } else {
            serde_json::to_writer(&mut self.out, entries)
        };
        written.map_err(|e| sink_error("json encoding failed", e))?;
        writeln!(self.out).map_err(|e| sink_error("write failed", e))?;
        self.out.flush().map_err(|e| sink_error("flush failed", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<RankedEntry> {
        vec![RankedEntry::new("x.com", 2), RankedEntry::new("y.com", 1)]
    }

    #[test]
    fn test_line_sink_format() {
        let mut sink = LineSink::new(Vec::new());
        sink.write(&entries()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "x.com: 2\ny.com: 1\n");
    }

    #[test]
    fn test_json_sink_round_trips() {
        let mut sink = JsonSink::new(Vec::new(), false);
        sink.write(&entries()).unwrap();
        let bytes = sink.into_inner();
        let parsed: Vec<RankedEntry> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, entries());
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_sink_failure() {
        let mut sink = LineSink::new(BrokenWriter);
        let err = sink.write(&entries()).unwrap_err();
        assert!(err.is_sink_failure());
    }

    #[test]
    fn test_create_in_missing_directory_is_sink_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        assert!(matches!(LineSink::create(&path), Err(TallyError::Sink(_))));
    }

    #[test]
    fn test_create_overwrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "stale contents that are longer\n").unwrap();
        let mut sink = LineSink::create(&path).unwrap();
        sink.write(&entries()).unwrap();
        drop(sink);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x.com: 2\ny.com: 1\n");
    }
}
