//! burst-replay: feed a JSON-lines event log through the accounting core and
//! report the resulting balances.

mod report;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{bail, Context};
use burst_ledger::{Ledger, LedgerConfig, LedgerEvent, LedgerProcessor, LedgerSnapshot};
use burst_types::Timestamp;
use burst_utils::{init_logging, LogFormat};
use clap::Parser;
use tracing::{error, info, warn};

use crate::report::{Report, ReplayStats};

#[derive(Parser)]
#[command(name = "burst-replay", about = "Replay a BURST event log through the accounting core")]
struct Cli {
    /// JSON-lines file of ledger events, one per line. Blank lines and lines
    /// starting with `#` are skipped.
    #[arg(env = "BURST_EVENTS")]
    events: PathBuf,

    /// TOML ledger configuration. Built-in defaults apply when omitted.
    #[arg(long, env = "BURST_CONFIG")]
    config: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[arg(long, env = "BURST_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level, e.g. "info" or "debug,burst_trst=trace".
    #[arg(long, env = "BURST_LOG_LEVEL")]
    log_level: Option<String>,

    /// Revocation checkpoint file.
    #[arg(long, env = "BURST_JOURNAL")]
    journal: Option<PathBuf>,

    /// Start from a snapshot written by an earlier run.
    #[arg(long)]
    from_snapshot: Option<PathBuf>,

    /// Write a snapshot of the final state here.
    #[arg(long)]
    snapshot_out: Option<PathBuf>,

    /// Evaluate balances at this instant (seconds) instead of the last event.
    #[arg(long)]
    at: Option<u64>,

    /// Stop at the first event that is not applied.
    #[arg(long)]
    strict: bool,

    /// Prune dead batches with the configured policy before reporting.
    #[arg(long)]
    prune: bool,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => LedgerConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => LedgerConfig::default(),
    };
    if let Some(format) = cli.log_format.clone() {
        config.log_format = format;
    }
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }
    if let Some(journal) = cli.journal.clone() {
        config.journal_path = Some(journal);
    }
    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level)?;

    let ledger = match &cli.from_snapshot {
        Some(path) => {
            let bytes =
                std::fs::read(path).with_context(|| format!("reading snapshot {}", path.display()))?;
            let snapshot = LedgerSnapshot::from_bytes(&bytes)?;
            info!(path = %path.display(), transactions = snapshot.transaction_count, "resuming from snapshot");
            Ledger::restore(&snapshot, config)?
        }
        None => Ledger::new(config),
    };
    let processor = LedgerProcessor::new(ledger);

    let file = File::open(&cli.events)
        .with_context(|| format!("opening event log {}", cli.events.display()))?;
    let mut stats = ReplayStats::default();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("reading line {line_no}"))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: LedgerEvent = serde_json::from_str(line)
            .with_context(|| format!("line {line_no}: malformed event"))?;
        let at = event.timestamp();
        stats.observe(at);
        match processor.apply(event, at).await {
            Ok(outcome) => stats.record(&outcome),
            Err(err) if err.is_rejection() => {
                stats.rejected += 1;
                if cli.strict {
                    bail!("line {line_no}: {err}");
                }
            }
            Err(err) => {
                error!(line = line_no, error = %err, "event not applied");
                stats.failed += 1;
                if cli.strict {
                    return Err(err).with_context(|| format!("line {line_no}"));
                }
            }
        }
    }
    processor.drain_revocations().await?;

    let handle = processor.ledger();
    let mut ledger = handle.lock().await;
    let at = cli
        .at
        .map(Timestamp::new)
        .or(stats.last)
        .unwrap_or_else(|| ledger.config().genesis());

    let pruned = if cli.prune {
        let result = ledger.prune(at);
        if !ledger.config().pruning.enabled {
            warn!("--prune given but pruning is disabled in the config");
        }
        result.total_pruned
    } else {
        0
    };

    if let Some(path) = &cli.snapshot_out {
        let bytes = ledger.snapshot(at)?.to_bytes()?;
        std::fs::write(path, &bytes)
            .with_context(|| format!("writing snapshot {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "snapshot written");
    }

    let report = Report::build(stats, &ledger, at, pruned);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}
