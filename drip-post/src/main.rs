//! drip-post - Publish one unused line from the candidate pool

use clap::Parser;
use libdripfeed::config::Config;
use libdripfeed::history::{open_store, HistoryBackend, HistoryStore, MemoryHistoryStore};
use libdripfeed::logging::LoggingConfig;
use libdripfeed::platforms::create_sink;
use libdripfeed::pool::load_pool;
use libdripfeed::runner::{preview, run_once, RunOutcome};
use libdripfeed::{Credentials, DripfeedError, Publisher, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "drip-post")]
#[command(version, about = "Publish one unused line from the candidate pool")]
#[command(long_about = r#"Pick one line from the candidate pool that has never been posted,
publish it through the configured command, and record it in the posted
history. Intended to run from cron or a CI schedule, once per run.

The publish command receives the text on stdin and API_KEY, API_SECRET,
ACCESS_TOKEN and ACCESS_SECRET in its environment. Exit 0 means posted
(stdout is the post ID), 75 means try again, anything else is fatal.

EXAMPLES:
    # Post one line
    drip-post --pool posts.txt --history posted.log --publish-command ./tweet.sh

    # See what would be posted, without posting or recording anything
    drip-post --dry-run

    # Reproducible selection
    drip-post --dry-run --seed 42

    # Machine-readable result
    drip-post --format json | jq -r .post_id

EXIT CODES:
    0 - Posted, or nothing left to post
    1 - Publishing failed (retries exhausted or fatal platform error)
    2 - Configuration error (missing credentials, missing pool, bad config)
    3 - Invalid input
    4 - Posted but could not be recorded in the history
"#)]
struct Cli {
    /// Config file (defaults to <config_dir>/dripfeed/config.toml)
    #[arg(short, long, env = "DRIPFEED_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Candidate pool, one line per post
    #[arg(long, env = "DRIPFEED_POOL", value_name = "FILE")]
    pool: Option<String>,

    /// Posted history
    #[arg(long, env = "DRIPFEED_HISTORY", value_name = "FILE")]
    history: Option<String>,

    /// History backend (file or sqlite)
    #[arg(long, env = "DRIPFEED_HISTORY_BACKEND", value_name = "BACKEND")]
    backend: Option<HistoryBackend>,

    /// Maximum length in characters before trimming
    #[arg(long, env = "DRIPFEED_MAX_LENGTH", value_name = "N")]
    max_length: Option<usize>,

    /// Maximum publish attempts
    #[arg(long, env = "DRIPFEED_MAX_ATTEMPTS", value_name = "N")]
    max_attempts: Option<u32>,

    /// Base delay between attempts, multiplied by the attempt number (e.g. "5s")
    #[arg(long, env = "DRIPFEED_BACKOFF_BASE", value_name = "DURATION")]
    backoff_base: Option<humantime::Duration>,

    /// Program that publishes the text it reads on stdin
    #[arg(long, env = "DRIPFEED_PUBLISH_COMMAND", value_name = "PROGRAM")]
    publish_command: Option<String>,

    /// Select and trim, but publish and record nothing
    #[arg(long)]
    dry_run: bool,

    /// Seed for the random selection
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.format != "text" && cli.format != "json" {
        return Err(DripfeedError::InvalidInput(format!(
            "Invalid format '{}'. Valid formats: text, json",
            cli.format
        )));
    }

    let config = load_config(&cli)?;
    config.validate()?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let outcome = if cli.dry_run {
        let pool = load_pool(&config.pool_path()).await?;
        let history = open_history_readonly(&config).await?;
        preview(&pool, history.as_ref(), config.posting.max_length, &mut rng).await?
    } else {
        // Everything that can fail on configuration is checked before the
        // history is created.
        let credentials = Credentials::from_env()?;
        let sink = create_sink(&config, credentials)?;
        let pool = load_pool(&config.pool_path()).await?;
        let history = open_store(config.history.backend, &config.history_path()).await?;

        let publisher = Publisher::new(sink, history, config.retry_policy())
            .with_max_length(config.posting.max_length);
        run_once(&pool, &publisher, &mut rng).await?
    };

    print_outcome(&outcome, &cli.format)
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    if let Some(pool) = &cli.pool {
        config.paths.pool = pool.clone();
    }
    if let Some(history) = &cli.history {
        config.paths.history = history.clone();
    }
    if let Some(backend) = cli.backend {
        config.history.backend = backend;
    }
    if let Some(max_length) = cli.max_length {
        config.posting.max_length = max_length;
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.posting.max_attempts = max_attempts;
    }
    if let Some(backoff_base) = cli.backoff_base {
        config.posting.backoff_base = backoff_base.into();
    }
    if let Some(command) = &cli.publish_command {
        config.sink.command = Some(command.clone());
    }

    Ok(config)
}

/// A dry run must not create the history, so a missing one reads as empty
async fn open_history_readonly(config: &Config) -> Result<Box<dyn HistoryStore>> {
    let path = config.history_path();
    if !path.exists() {
        tracing::debug!("No history at {}; treating as empty", path.display());
        return Ok(Box::new(MemoryHistoryStore::new()));
    }
    Ok(open_store(config.history.backend, &path).await?)
}

fn print_outcome(outcome: &RunOutcome, format: &str) -> Result<()> {
    if format == "json" {
        let json = serde_json::to_string(outcome).map_err(|e| {
            DripfeedError::InvalidInput(format!("Failed to serialize output: {}", e))
        })?;
        println!("{}", json);
    } else {
        println!("{}", outcome.summary());
    }
    Ok(())
}
