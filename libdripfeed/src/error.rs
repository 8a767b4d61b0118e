//! Error types for Dripfeed

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DripfeedError>;

#[derive(Error, Debug)]
pub enum DripfeedError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DripfeedError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            DripfeedError::Config(_) => 2,
            DripfeedError::InvalidInput(_) => 3,
            DripfeedError::Publish(PublishError::HistoryPersistence { .. }) => 4,
            DripfeedError::Publish(_) => 1,
            DripfeedError::History(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error(
        "Missing API credentials: {}. Ensure API_KEY, API_SECRET, ACCESS_TOKEN, ACCESS_SECRET are set.",
        .0.join(", ")
    )]
    MissingCredentials(Vec<String>),

    #[error("Candidate pool not found: {0}. Create it and add some lines to post.")]
    PoolNotFound(String),

    #[error("Failed to read candidate pool {path}: {source}")]
    PoolUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("History database operation failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("History entries must be a single line: {0:?}")]
    InvalidEntry(String),
}

/// Failure reported by a publish sink for a single attempt
///
/// `Network`, `RateLimit` and `Timeout` are transient and retried.
/// Everything else aborts the publish immediately.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content rejected: {0}")]
    Rejected(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

impl PlatformError {
    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            PlatformError::Network(_) | PlatformError::RateLimit(_) | PlatformError::Timeout(_) => {
                true
            }
            PlatformError::Authentication(_)
            | PlatformError::Rejected(_)
            | PlatformError::Posting(_) => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to post after {attempts} attempts: {last_error}")]
    RetryBudgetExhausted {
        attempts: u32,
        last_error: PlatformError,
    },

    #[error("Attempt {attempt} failed permanently: {source}")]
    Fatal {
        attempt: u32,
        #[source]
        source: PlatformError,
    },

    /// The candidate could never be recorded, so it was not sent
    #[error("Refusing to post a candidate the history cannot record: {source}")]
    Unrecordable {
        #[source]
        source: HistoryError,
    },

    /// The post went out but could not be recorded. The next run may repost
    /// `text` unless the history is repaired by hand.
    #[error("Posted {post_id} but failed to record it in history ({source}); add \"{text}\" to the history before the next run")]
    HistoryPersistence {
        text: String,
        post_id: String,
        #[source]
        source: HistoryError,
    },
}
