use anyhow::{Context, Result};
use clap::Parser;
use libdripfeed::config::Config;
use libdripfeed::history::{open_store, HistoryBackend, HistoryEntry};
use libdripfeed::logging::LoggingConfig;
use libdripfeed::pool::load_pool;
use libdripfeed::selector::eligible;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "drip-history")]
#[command(version, about = "Query the posted history")]
#[command(long_about = r#"Query the posted history and what is left in the candidate pool.

EXAMPLES:
    # Show the last 20 posted lines (default)
    drip-history

    # Show more
    drip-history --limit 50

    # Every entry
    drip-history --limit 0

    # How many candidates have not been posted yet
    drip-history --remaining

    # JSON output for scripting
    drip-history --format json | jq -r '.[].text'

    # JSONL output (one JSON object per line)
    drip-history --format jsonl

OUTPUT FORMATS:
    text  - Human-readable, newest first (default)
    json  - JSON array
    jsonl - JSON lines, one object per line (streaming-friendly)

EXIT CODES:
    0 - Success (including empty results)
    1 - Error (history not found, unreadable, etc.)
"#)]
struct Args {
    /// Config file (defaults to <config_dir>/dripfeed/config.toml)
    #[arg(short, long, env = "DRIPFEED_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Posted history
    #[arg(long, env = "DRIPFEED_HISTORY", value_name = "FILE")]
    history: Option<String>,

    /// Candidate pool, used by --remaining
    #[arg(long, env = "DRIPFEED_POOL", value_name = "FILE")]
    pool: Option<String>,

    /// History backend (file or sqlite)
    #[arg(long, env = "DRIPFEED_HISTORY_BACKEND", value_name = "BACKEND")]
    backend: Option<HistoryBackend>,

    /// Maximum number of entries to show, 0 for all
    #[arg(short, long, default_value = "20", value_name = "N")]
    limit: usize,

    /// Count the candidates that have not been posted yet
    #[arg(short, long)]
    remaining: bool,

    /// Output format
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    #[arg(help = "Output format: text (human-readable), json (array) or jsonl (streaming)")]
    #[arg(value_parser = ["text", "json", "jsonl"])]
    format: String,
}

/// Pool progress reported by --remaining
#[derive(Debug, Serialize)]
struct Remaining {
    candidates: usize,
    posted: usize,
    remaining: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    LoggingConfig::from_env(false).init();

    let args = Args::parse();

    tracing::debug!("drip-history started with args: {:?}", args);

    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    if let Some(history) = &args.history {
        config.paths.history = history.clone();
    }
    if let Some(pool) = &args.pool {
        config.paths.pool = pool.clone();
    }
    if let Some(backend) = args.backend {
        config.history.backend = backend;
    }

    if args.remaining {
        let remaining = count_remaining(&config).await?;
        print_remaining(&remaining, &args.format)?;
        return Ok(());
    }

    let history_path = config.history_path();
    if !history_path.exists() {
        eprintln!("Error: History not found at {}", history_path.display());
        eprintln!("Have you posted anything yet? Try: drip-post --dry-run");
        std::process::exit(1);
    }

    let store = open_store(config.history.backend, &history_path)
        .await
        .context("Failed to open history")?;
    let mut entries = store.entries().await.context("Failed to read history")?;

    entries.reverse();
    if args.limit > 0 {
        entries.truncate(args.limit);
    }

    print_entries(&entries, &args.format)
}

async fn count_remaining(config: &Config) -> Result<Remaining> {
    let pool = load_pool(&config.pool_path())
        .await
        .context("Failed to load candidate pool")?;

    let history_path = config.history_path();
    let posted: HashSet<String> = if history_path.exists() {
        open_store(config.history.backend, &history_path)
            .await
            .context("Failed to open history")?
            .load()
            .await
            .context("Failed to read history")?
    } else {
        HashSet::new()
    };

    Ok(Remaining {
        candidates: pool.len(),
        posted: posted.len(),
        remaining: eligible(&pool, &posted).len(),
    })
}

fn print_remaining(remaining: &Remaining, format: &str) -> Result<()> {
    match format {
        "json" | "jsonl" => println!("{}", serde_json::to_string(remaining)?),
        _ => println!(
            "{} of {} candidates remaining ({} posted)",
            remaining.remaining, remaining.candidates, remaining.posted
        ),
    }
    Ok(())
}

fn print_entries(entries: &[HistoryEntry], format: &str) -> Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(entries)?);
        }
        "jsonl" => {
            for entry in entries {
                println!("{}", serde_json::to_string(entry)?);
            }
        }
        _ => {
            if entries.is_empty() {
                println!("No posts recorded yet.");
            }
            for entry in entries {
                let timestamp = entry
                    .posted_at
                    .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{} | {}", timestamp, entry.text);
            }
        }
    }
    Ok(())
}
