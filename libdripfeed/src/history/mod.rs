//! Posted history persistence
//!
//! The history is an append-only record of every text that was published
//! successfully. It is read once at the start of a run and appended to at
//! most once, right after a confirmed publish.
//!
//! Backends:
//!
//! - [`file::FileHistoryStore`]: one entry per line in a flat text file
//! - [`sqlite::SqliteHistoryStore`]: an embedded SQLite table
//! - [`memory::MemoryHistoryStore`]: in-process, for tests and dry runs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::HistoryError;

pub mod file;
pub mod memory;
pub mod sqlite;

pub use file::FileHistoryStore;
pub use memory::MemoryHistoryStore;
pub use sqlite::SqliteHistoryStore;

/// One recorded post, in append order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub text: String,
    /// Unknown for backends that only store the text (flat files)
    pub posted_at: Option<DateTime<Utc>>,
}

/// Storage for the set of already-published texts
///
/// Implementations must never rewrite or drop existing entries.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load every recorded text into a set for O(1) membership checks
    async fn load(&self) -> Result<HashSet<String>, HistoryError> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .map(|entry| entry.text)
            .collect())
    }

    /// Durably record `text` as published
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::InvalidEntry` for multi-line text, or the
    /// backend's I/O error. The record is not guaranteed to exist after an
    /// error.
    async fn append(&self, text: &str) -> Result<(), HistoryError>;

    /// All recorded entries in the order they were appended
    async fn entries(&self) -> Result<Vec<HistoryEntry>, HistoryError>;

    /// Human-readable location, used in log lines
    fn describe(&self) -> String;
}

/// Which backend persists the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    #[default]
    File,
    Sqlite,
}

impl std::str::FromStr for HistoryBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(HistoryBackend::File),
            "sqlite" => Ok(HistoryBackend::Sqlite),
            _ => Err(format!(
                "Invalid history backend: '{}'. Valid options: file, sqlite",
                s
            )),
        }
    }
}

impl std::fmt::Display for HistoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryBackend::File => write!(f, "file"),
            HistoryBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Open the configured backend at `path`, creating it if absent
pub async fn open_store(
    backend: HistoryBackend,
    path: &Path,
) -> Result<Box<dyn HistoryStore>, HistoryError> {
    match backend {
        HistoryBackend::File => Ok(Box::new(FileHistoryStore::open(path).await?)),
        HistoryBackend::Sqlite => Ok(Box::new(SqliteHistoryStore::open(path).await?)),
    }
}

/// Reject text that a line-oriented store could not read back intact
pub(crate) fn check_single_line(text: &str) -> Result<(), HistoryError> {
    if text.contains('\n') || text.contains('\r') {
        return Err(HistoryError::InvalidEntry(text.to_string()));
    }
    Ok(())
}
