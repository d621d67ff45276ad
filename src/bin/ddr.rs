//! DDR Command-Line Scorer
//!
//! Loads a word-embedding model, then scores JSON-lines documents against
//! the configured word groups and writes CSV.

use anyhow::Context;
use clap::Parser;
use ddr::{
    DocumentReader, HeaderMode, InputError, ResultEmitter, ScoringPool, ScoringPoolConfig, Session,
    SessionConfig,
};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// DDR - score documents against word groups with word embeddings
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON settings file; other flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Word-embedding model file
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Model file text encoding
    #[arg(long)]
    encoding: Option<String>,

    /// Number of words in the model (-1 = unknown)
    #[arg(long, allow_negative_numbers = true)]
    vocab_size: Option<i64>,

    /// Vector dimensionality
    #[arg(short, long)]
    dimension: Option<i64>,

    /// Word group as comma-separated words (repeatable)
    #[arg(short, long = "group")]
    groups: Vec<String>,

    /// Header line handling: auto, present or absent
    #[arg(long)]
    header: Option<HeaderMode>,

    /// JSON-lines documents to score ("-" for stdin)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// CSV output ("-" for stdout)
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Number of scoring worker threads (0 = auto-detect based on CPU cores)
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Pending document queue capacity
    #[arg(long, default_value_t = 1024)]
    queue_capacity: usize,

    /// Pin scoring workers to CPU cores
    #[arg(long)]
    pin_workers: bool,

    /// Write the effective settings to this JSON file and exit
    #[arg(long)]
    export_config: Option<PathBuf>,
}

impl Args {
    /// Settings file values with command-line overrides applied
    fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::from_json_file(path)?,
            None => SessionConfig::default(),
        };

        if let Some(model) = &self.model {
            config = config.with_file_path(model);
        }
        if let Some(encoding) = &self.encoding {
            config = config.with_encoding(encoding);
        }
        if let Some(size) = self.vocab_size {
            config = config.with_vocabulary_size(size);
        }
        if let Some(dimension) = self.dimension {
            config = config.with_vector_dimension(dimension);
        }
        if !self.groups.is_empty() {
            config = config.with_groups(&self.groups);
        }
        if let Some(header) = self.header {
            config = config.with_header(header);
        }

        Ok(config)
    }

    fn pool_config(&self) -> ScoringPoolConfig {
        ScoringPoolConfig::default()
            .with_workers(self.workers)
            .with_queue_capacity(self.queue_capacity)
            .with_pinning(self.pin_workers)
    }
}

fn open_input(path: &str) -> anyhow::Result<Box<dyn BufRead + Send>> {
    if path == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).with_context(|| format!("Failed to open input {}", path))?;
    Ok(Box::new(BufReader::new(file)))
}

fn open_output(path: &str) -> anyhow::Result<Box<dyn Write + Send>> {
    if path == "-" {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    let file = File::create(path).with_context(|| format!("Failed to create output {}", path))?;
    Ok(Box::new(BufWriter::new(file)))
}

/// Load the model off the runtime, cancelling on Ctrl-C
async fn open_session(config: SessionConfig) -> anyhow::Result<Session> {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let mut load = tokio::task::spawn_blocking(move || Session::open_with_cancel(&config, &token));

    let session = tokio::select! {
        result = &mut load => result?,
        Ok(()) = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling model load");
            cancel.cancel();
            load.await?
        }
    };

    Ok(session?)
}

/// Errors surfaced by the scoring loop
#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("Failed to write results: {0}")]
    Output(#[from] csv::Error),
}

fn score_documents(
    session: &Session,
    pool: &ScoringPool,
    input: Box<dyn BufRead + Send>,
    output: Box<dyn Write + Send>,
) -> anyhow::Result<usize> {
    let mut emitter = ResultEmitter::new(output, session.labels())?;
    let documents = DocumentReader::new(input).map(|doc| doc.map_err(RunError::from));

    let scored = pool.try_run(session.scorer(), documents, |row| {
        emitter.emit(&row).map_err(RunError::from)
    })?;

    let mut output = emitter.finish()?;
    output.flush().context("Failed to flush output")?;
    Ok(scored)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean CSV
    fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("ddr=info".parse()?))
        .init();

    let args = Args::parse();
    let config = args.session_config()?;

    if let Some(path) = &args.export_config {
        config.to_json_file(path)?;
        info!("Settings written to {}", path.display());
        return Ok(());
    }

    let session = open_session(config).await?;

    let pool = ScoringPool::new(args.pool_config());
    info!(
        "Scoring {} with {} workers",
        if args.input == "-" { "stdin" } else { args.input.as_str() },
        pool.config().resolved_workers()
    );

    let input = open_input(&args.input)?;
    let output = open_output(&args.output)?;

    let scored = tokio::task::spawn_blocking(move || score_documents(&session, &pool, input, output))
        .await??;

    info!("Scored {} documents", scored);
    Ok(())
}
