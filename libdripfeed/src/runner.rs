//! One scheduled run: select an unused candidate and publish it
//!
//! Each invocation is independent. The caller loads the candidate pool and
//! opens the history store; this module decides what to post and hands the
//! choice to the [`Publisher`]. Running two invocations at the same time
//! against one history is not supported.

use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

use crate::error::Result;
use crate::history::HistoryStore;
use crate::publisher::{PublishReceipt, Publisher};
use crate::selector::{eligible, select};
use crate::text::trim;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// A candidate was published and recorded
    Posted(PublishReceipt),
    /// Every candidate has already been posted; nothing was done
    Exhausted { candidates: usize, posted: usize },
    /// What would have been posted, without publishing or recording it
    DryRun { candidate: String, text: String },
}

impl RunOutcome {
    /// Human-readable summary for stdout
    pub fn summary(&self) -> String {
        match self {
            RunOutcome::Posted(receipt) => format!("Posted: {}", receipt.text),
            RunOutcome::Exhausted { .. } => {
                "All lines already posted. Add more lines to the candidate pool.".to_string()
            }
            RunOutcome::DryRun { text, .. } => format!("Would post: {}", text),
        }
    }
}

/// Select one unposted candidate from `pool` and publish it
///
/// # Errors
///
/// Returns a history error if the posted history cannot be loaded, or the
/// publisher's error if publishing fails. Running out of candidates is not
/// an error.
pub async fn run_once<R>(pool: &[String], publisher: &Publisher, rng: &mut R) -> Result<RunOutcome>
where
    R: Rng + ?Sized,
{
    let history = load_history(publisher.history()).await?;

    let Some(candidate) = pick(pool, &history, rng) else {
        return Ok(exhausted(pool, &history));
    };

    let receipt = publisher.publish(&candidate).await?;
    Ok(RunOutcome::Posted(receipt))
}

/// Like [`run_once`] but stops after selection and trimming
pub async fn preview<R>(
    pool: &[String],
    history: &dyn HistoryStore,
    max_length: usize,
    rng: &mut R,
) -> Result<RunOutcome>
where
    R: Rng + ?Sized,
{
    let posted = load_history(history).await?;

    let Some(candidate) = pick(pool, &posted, rng) else {
        return Ok(exhausted(pool, &posted));
    };

    let text = trim(&candidate, max_length);
    Ok(RunOutcome::DryRun { candidate, text })
}

async fn load_history(store: &dyn HistoryStore) -> Result<HashSet<String>> {
    let history = store.load().await?;
    tracing::debug!(
        "Loaded {} posted entries from {}",
        history.len(),
        store.describe()
    );
    Ok(history)
}

fn pick<R>(pool: &[String], history: &HashSet<String>, rng: &mut R) -> Option<String>
where
    R: Rng + ?Sized,
{
    let remaining = eligible(pool, history).len();
    let choice = select(pool, history, rng)?;
    info!(
        "Selected from {} eligible of {} candidates: {}",
        remaining,
        pool.len(),
        choice
    );
    Some(choice)
}

fn exhausted(pool: &[String], history: &HashSet<String>) -> RunOutcome {
    info!(
        "All {} candidates already posted; nothing to do",
        pool.len()
    );
    RunOutcome::Exhausted {
        candidates: pool.len(),
        posted: history.len(),
    }
}
