//! Publish capability abstraction
//!
//! A [`PublishSink`] makes exactly one publish attempt per call and reports
//! one of three outcomes:
//!
//! - `Ok(post_id)`: the text is live
//! - `Err(e)` with `e.is_transient()`: nothing was posted, a retry may work
//! - `Err(e)` otherwise: the platform refused, retrying will not help
//!
//! Retrying, backoff and history bookkeeping live in
//! [`crate::publisher::Publisher`], never in a sink.
//!
//! # Examples
//!
//! ```no_run
//! use libdripfeed::platforms::{PublishSink, command::CommandSink};
//! use libdripfeed::credentials::Credentials;
//! use std::time::Duration;
//!
//! # async fn example() -> libdripfeed::Result<()> {
//! let credentials = Credentials::from_env()?;
//! let sink = CommandSink::new("post-status", vec![], Duration::from_secs(30), credentials);
//!
//! match sink.publish("Hello, world!").await {
//!     Ok(id) => println!("Posted: {}", id),
//!     Err(e) if e.is_transient() => eprintln!("Try again later: {}", e),
//!     Err(e) => eprintln!("Rejected: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::config::Config;
use crate::credentials::Credentials;
use crate::error::{ConfigError, PlatformError};

pub mod command;

// Available for all builds (not just tests) to support integration tests
pub mod mock;

/// One-shot publishing capability
#[async_trait]
pub trait PublishSink: Send + Sync {
    /// Attempt to publish `text` exactly once
    ///
    /// Returns a platform-specific post ID on success. The ID may be empty
    /// when the platform does not report one.
    ///
    /// # Errors
    ///
    /// Returns a transient `PlatformError` (`Network`, `RateLimit`,
    /// `Timeout`) when nothing was posted and a retry may succeed, or a
    /// fatal one when the platform refused the text.
    async fn publish(&self, text: &str) -> Result<String, PlatformError>;

    /// Lowercase identifier used in logs
    fn name(&self) -> &str;
}

/// Build the configured sink
///
/// # Errors
///
/// Returns `ConfigError::MissingField` when no publish command is configured.
pub fn create_sink(
    config: &Config,
    credentials: Credentials,
) -> Result<Box<dyn PublishSink>, ConfigError> {
    let command = config
        .sink
        .command
        .clone()
        .ok_or_else(|| ConfigError::MissingField("sink.command".to_string()))?;

    Ok(Box::new(command::CommandSink::new(
        command,
        config.sink.args.clone(),
        config.sink.timeout,
        credentials,
    )))
}
