//! Publishing with bounded retry and linear backoff
//!
//! The publisher is the only component with side effects. It trims the
//! selected candidate to the platform limit, attempts to publish it, and on
//! a confirmed success appends the candidate to the posted history. Nothing
//! is written to the history for a failed publish, so an interrupted run can
//! be re-run without double posting.
//!
//! The one gap: if the publish succeeds and the history append then fails,
//! the post is live but unrecorded. That case surfaces as
//! [`PublishError::HistoryPersistence`] and is never retried as a publish.

use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::error::PublishError;
use crate::history::{check_single_line, HistoryStore};
use crate::platforms::PublishSink;
use crate::text::{char_len, trim, DEFAULT_MAX_LENGTH};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(5);

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Add up to half a `base_delay` of random delay to every wait
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Deterministic wait after failed attempt number `attempt` (1-based):
    /// `base_delay * attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// The wait actually used, including jitter when enabled
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.backoff(attempt);
        if !self.jitter {
            return delay;
        }

        let max_extra = self.base_delay / 2;
        if max_extra.is_zero() {
            return delay;
        }
        let extra = rand::thread_rng().gen_range(Duration::ZERO..=max_extra);
        delay.saturating_add(extra)
    }
}

/// What a successful publish produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReceipt {
    /// The candidate as selected, which is what the history records
    pub candidate: String,
    /// The trimmed text that was sent
    pub text: String,
    /// Platform post ID, possibly empty
    pub post_id: String,
    /// Attempt number that succeeded
    pub attempts: u32,
}

/// Publishes a candidate and records it on success
pub struct Publisher {
    sink: Box<dyn PublishSink>,
    history: Box<dyn HistoryStore>,
    policy: RetryPolicy,
    max_length: usize,
}

impl Publisher {
    pub fn new(
        sink: Box<dyn PublishSink>,
        history: Box<dyn HistoryStore>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            sink,
            history,
            policy,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    /// Override the platform length limit (default 280 characters)
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// The store successful publishes are recorded in
    pub fn history(&self) -> &dyn HistoryStore {
        self.history.as_ref()
    }

    /// Publish `candidate`, retrying transient failures
    ///
    /// The candidate is trimmed to the length limit before sending. On
    /// success the untrimmed candidate is appended to the history, so the
    /// selector will exclude it on every later run.
    ///
    /// # Errors
    ///
    /// - `PublishError::Unrecordable` when the candidate spans several lines;
    ///   nothing is sent
    /// - `PublishError::Fatal` when the sink reports a non-retryable failure
    /// - `PublishError::RetryBudgetExhausted` when every attempt failed
    ///   transiently
    /// - `PublishError::HistoryPersistence` when the post succeeded but the
    ///   history append did not
    pub async fn publish(&self, candidate: &str) -> Result<PublishReceipt, PublishError> {
        // A post the history cannot record would be repeated on every run.
        check_single_line(candidate).map_err(|source| PublishError::Unrecordable { source })?;

        let text = trim(candidate, self.max_length);
        if text != candidate {
            info!(
                "Trimmed candidate from {} to {} characters",
                char_len(candidate),
                char_len(&text)
            );
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let sink_name = self.sink.name().to_string();
        let mut attempt = 1;

        loop {
            match self.sink.publish(&text).await {
                Ok(post_id) => {
                    if attempt > 1 {
                        info!(
                            "Successfully posted to {} on attempt {}",
                            sink_name, attempt
                        );
                    }
                    info!("Posted to {}: {}", sink_name, post_id);

                    if let Err(source) = self.history.append(candidate).await {
                        error!(
                            "Post {} is live but could not be recorded in {}: {}. Unrecorded text: {}",
                            post_id,
                            self.history.describe(),
                            source,
                            candidate
                        );
                        return Err(PublishError::HistoryPersistence {
                            text: candidate.to_string(),
                            post_id,
                            source,
                        });
                    }

                    return Ok(PublishReceipt {
                        candidate: candidate.to_string(),
                        text,
                        post_id,
                        attempts: attempt,
                    });
                }
                Err(e) if !e.is_transient() => {
                    warn!(
                        "Permanent error posting to {} (attempt {}/{}): {}",
                        sink_name, attempt, max_attempts, e
                    );
                    return Err(PublishError::Fatal { attempt, source: e });
                }
                Err(e) if attempt >= max_attempts => {
                    warn!(
                        "Failed to post to {} after {} attempts: {}",
                        sink_name, max_attempts, e
                    );
                    return Err(PublishError::RetryBudgetExhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        "Transient error posting to {} (attempt {}/{}): {}. Retrying in {}...",
                        sink_name,
                        attempt,
                        max_attempts,
                        e,
                        humantime::format_duration(delay)
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
