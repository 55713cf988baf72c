//! Logsink Binary Entry Point
//!
//! Reads newline-delimited JSON log events from a file or stdin and writes
//! them to the configured table. Core functionality is provided by the
//! `logsink` library crate.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use logsink::{
    AuditSink, BatchingSink, LogEvent,
    config::{SinkConfig, parse_duration},
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Logsink - Relational Log Event Sink
#[derive(Parser, Debug)]
#[command(name = "logsink", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "configs/logsink.yaml",
        env = "LOGSINK_CONFIG"
    )]
    config: PathBuf,

    /// Database URL or connection name (overrides config file)
    #[arg(long, env = "LOGSINK_DB_URL")]
    db_url: Option<String>,

    /// Table name (overrides config file)
    #[arg(long, env = "LOGSINK_TABLE")]
    table: Option<String>,

    /// Retention window, e.g. `7d` (overrides config file)
    #[arg(long, value_parser = parse_duration)]
    retention: Option<Duration>,

    /// Newline-delimited JSON events; stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Write each event immediately and stop on the first failure
    #[arg(long)]
    audit: bool,
}

/// Where events go.
enum Target {
    Batching(BatchingSink),
    Audit(AuditSink),
}

impl Target {
    async fn emit(&self, event: LogEvent) -> Result<(), logsink::SinkError> {
        match self {
            Self::Batching(sink) => sink.emit(event),
            Self::Audit(sink) => sink.emit(&event).await,
        }
    }

    async fn shutdown(self) -> Result<(), logsink::SinkError> {
        match self {
            Self::Batching(sink) => {
                let dropped = sink.dropped_events();
                if dropped > 0 {
                    tracing::warn!(dropped, "Events dropped because the queue was full");
                }
                sink.shutdown().await
            }
            Self::Audit(sink) => {
                sink.close().await;
                Ok(())
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,logsink=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration from file
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = SinkConfig::load(&cli.config)?;

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(url) = cli.db_url {
        config.connection = url;
    }
    if let Some(table) = cli.table {
        config.table_name = table;
    }
    if let Some(retention) = cli.retention {
        config.retention = Some(retention);
    }
    config.validate()?;

    tracing::info!(
        table = %config.table_name,
        mode = %config.insert_mode,
        audit = cli.audit,
        "Starting sink"
    );

    let options = config.into_options()?;
    let target = if cli.audit {
        Target::Audit(AuditSink::new(options)?)
    } else {
        Target::Batching(BatchingSink::spawn(options)?)
    };

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &cli.input {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let result = tokio::select! {
        result = pump(reader, &target) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C signal");
            Ok(0)
        }
    };

    tracing::info!("Shutting down sink...");
    target.shutdown().await?;

    let read = result?;
    tracing::info!(events = read, "Shutdown complete");
    Ok(())
}

/// Feed every parseable line to the sink. Returns the number of events read.
async fn pump(
    reader: Box<dyn AsyncBufRead + Unpin + Send>,
    target: &Target,
) -> Result<u64, Box<dyn std::error::Error>> {
    let mut lines = reader.lines();
    let mut line_no = 0u64;
    let mut read = 0u64;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let event: LogEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "Skipping malformed event");
                continue;
            }
        };
        read += 1;

        match target.emit(event).await {
            Ok(()) => {}
            Err(e) if matches!(target, Target::Audit(_)) => return Err(e.into()),
            // Full queue; already counted by the sink.
            Err(_) => {}
        }
    }
    Ok(read)
}
