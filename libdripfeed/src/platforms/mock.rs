//! Scripted publish sink for testing
//!
//! Outcomes are consumed in order, one per attempt. Once the script runs
//! out every further attempt succeeds. Each attempt is recorded with the
//! tokio clock, so tests running with paused time can check backoff gaps.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::{sleep, Instant};

use super::PublishSink;
use crate::error::PlatformError;

/// One recorded call to [`MockSink::publish`]
#[derive(Debug, Clone)]
pub struct MockAttempt {
    pub text: String,
    pub at: Instant,
}

/// Mock sink for testing
///
/// Clones share the script and the attempt log.
#[derive(Debug, Clone)]
pub struct MockSink {
    name: String,
    delay: Duration,
    script: Arc<Mutex<VecDeque<Result<String, PlatformError>>>>,
    attempts: Arc<Mutex<Vec<MockAttempt>>>,
    published: Arc<Mutex<Vec<String>>>,
}

impl MockSink {
    /// A sink that plays back `outcomes`, then succeeds
    pub fn with_outcomes<I>(name: &str, outcomes: I) -> Self
    where
        I: IntoIterator<Item = Result<String, PlatformError>>,
    {
        Self {
            name: name.to_string(),
            delay: Duration::ZERO,
            script: Arc::new(Mutex::new(outcomes.into_iter().collect())),
            attempts: Arc::new(Mutex::new(Vec::new())),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A sink that always succeeds
    pub fn success(name: &str) -> Self {
        Self::with_outcomes(name, std::iter::empty())
    }

    /// A sink that fails the first `failures` attempts with `error`
    pub fn failing_times(name: &str, failures: usize, error: PlatformError) -> Self {
        Self::with_outcomes(name, std::iter::repeat(Err(error)).take(failures))
    }

    /// Simulate network latency on every attempt
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of publish attempts made so far
    pub fn attempt_count(&self) -> usize {
        self.attempts().len()
    }

    /// Every attempt made so far, oldest first
    pub fn attempts(&self) -> Vec<MockAttempt> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Texts of the attempts that succeeded
    pub fn published(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record_published(&self, text: &str) {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
    }
}

#[async_trait]
impl PublishSink for MockSink {
    async fn publish(&self, text: &str) -> Result<String, PlatformError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
            attempts.push(MockAttempt {
                text: text.to_string(),
                at: Instant::now(),
            });
            attempts.len()
        };

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match scripted {
            Some(Err(e)) => Err(e),
            Some(Ok(id)) => {
                self.record_published(text);
                Ok(id)
            }
            None => {
                self.record_published(text);
                Ok(format!("{}:mock-{}", self.name, attempt))
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success() {
        let sink = MockSink::success("test");

        let id = sink.publish("Test content").await.unwrap();
        assert_eq!(id, "test:mock-1");
        assert_eq!(sink.attempt_count(), 1);
        assert_eq!(sink.published(), vec!["Test content"]);
        assert_eq!(sink.name(), "test");
    }

    #[tokio::test]
    async fn test_mock_script_then_success() {
        let sink = MockSink::with_outcomes(
            "test",
            [
                Err(PlatformError::Network("reset".to_string())),
                Ok("custom-id".to_string()),
            ],
        );

        assert!(sink.publish("a").await.is_err());
        assert_eq!(sink.publish("b").await.unwrap(), "custom-id");
        assert_eq!(sink.publish("c").await.unwrap(), "test:mock-3");
        assert_eq!(sink.published(), vec!["b", "c"]);
        assert_eq!(sink.attempt_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_failing_times() {
        let sink = MockSink::failing_times("test", 2, PlatformError::RateLimit("429".to_string()));

        for _ in 0..2 {
            let err = sink.publish("x").await.unwrap_err();
            assert_eq!(err, PlatformError::RateLimit("429".to_string()));
        }
        assert!(sink.publish("x").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_with_delay() {
        let sink = MockSink::success("test").with_delay(Duration::from_millis(50));

        let start = Instant::now();
        sink.publish("Test").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let sink = MockSink::success("test");
        let handle = sink.clone();

        sink.publish("shared").await.unwrap();
        assert_eq!(handle.published(), vec!["shared"]);
    }
}
