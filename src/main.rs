use clap::{Parser, ValueEnum};
use domaintally::sink::{JsonSink, LineSink, ResultSinkLike};
use domaintally::{Engine, EngineConfig, TallyError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// `domain: count` per line
    Lines,
    /// JSON array of {domain, count}
    Json,
}

#[derive(Parser)]
#[command(name = "domaintally")]
#[command(about = "Count customers per email domain in a CSV file", long_about = None)]
struct Cli {
    /// CSV file with the email address in the third column
    input: PathBuf,
    /// Output file, or `console` for stdout
    #[arg(short, long, default_value = "console")]
    output: String,
    #[arg(short, long, value_enum, default_value_t = Format::Lines)]
    format: Format,
    /// JSON engine config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    chunk_capacity: Option<usize>,
    #[arg(long)]
    min_records: Option<u64>,
    #[arg(long)]
    max_records: Option<u64>,
    #[arg(long)]
    workers: Option<usize>,
    /// Zero-based column holding the email address
    #[arg(long)]
    email_column: Option<usize>,
    /// Treat the first row as data
    #[arg(long)]
    no_headers: bool,
}

impl Cli {
    fn engine_config(&self) -> Result<EngineConfig, TallyError> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_json_file(path)?,
            None => EngineConfig::default(),
        };
        if let Some(n) = self.chunk_capacity {
            config.chunk_capacity = n;
        }
        if let Some(n) = self.min_records {
            config.min_records = n;
        }
        if let Some(n) = self.max_records {
            config.max_records = n;
        }
        if let Some(n) = self.workers {
            config = config.with_workers(n);
        }
        if let Some(n) = self.email_column {
            config.email_column = n;
        }
        if self.no_headers {
            config.has_headers = false;
        }
        config.validate()?;
        Ok(config)
    }

    fn sink(&self) -> Result<Box<dyn ResultSinkLike>, TallyError> {
        let console = self.output.eq_ignore_ascii_case("console");
        let sink: Box<dyn ResultSinkLike> = match (self.format, console) {
            (Format::Lines, true) => Box::new(LineSink::stdout()),
            (Format::Lines, false) => Box::new(LineSink::create(&self.output)?),
            (Format::Json, true) => Box::new(JsonSink::new(std::io::stdout(), true)),
            (Format::Json, false) => Box::new(JsonSink::create(&self.output, true)?),
        };
        Ok(sink)
    }
}

fn exit_code(err: &TallyError) -> ExitCode {
    match err {
        TallyError::Sink(_) => ExitCode::from(2),
        TallyError::Configuration(_) => ExitCode::from(3),
        _ => ExitCode::from(1),
    }
}

fn run(cli: &Cli) -> Result<(), TallyError> {
    let config = cli.engine_config()?;
    config.log_summary();
    let engine = Engine::new(config)?;
    let report = engine.run_path(&cli.input)?;

    let mut sink = cli.sink()?;
    report.write_to(sink.as_mut())?;
    if !cli.output.eq_ignore_ascii_case("console") {
        info!(output = %cli.output, "ranking written");
    }
    info!(
        "processed {} records, skipped {} malformed rows, {} domains",
        report.stats.counted,
        report.stats.skipped,
        report.ranked.len()
    );
    Ok(())
}

fn main() -> ExitCode {
    domaintally::init_tracing();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if err.is_sink_failure() {
                error!(output = %cli.output, "{}", err);
            } else {
                error!(input = %cli.input.display(), "{}", err);
            }
            exit_code(&err)
        }
    }
}
