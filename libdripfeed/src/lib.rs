//! Dripfeed - post one unused line at a time
//!
//! This library picks a random line from a candidate pool that has never
//! been posted before, publishes it with bounded retry, and records it in an
//! append-only history so it is never picked again.

pub mod config;
pub mod credentials;
pub mod error;
pub mod history;
pub mod logging;
pub mod platforms;
pub mod pool;
pub mod publisher;
pub mod runner;
pub mod selector;
pub mod text;

// Re-export commonly used types
pub use config::Config;
pub use credentials::Credentials;
pub use error::{DripfeedError, Result};
pub use history::{HistoryBackend, HistoryStore};
pub use platforms::PublishSink;
pub use publisher::{PublishReceipt, Publisher, RetryPolicy};
pub use runner::{run_once, RunOutcome};
