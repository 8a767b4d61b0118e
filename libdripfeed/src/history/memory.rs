//! In-memory history for tests and dry runs

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

use super::{check_single_line, HistoryEntry, HistoryStore};
use crate::error::HistoryError;

/// History kept in process memory
///
/// Clones share the same entries, so a test can keep a handle for
/// inspection after moving the store into a publisher.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    entries: Arc<Mutex<Vec<String>>>,
    fail_appends: bool,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with existing entries
    pub fn with_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: Arc::new(Mutex::new(entries.into_iter().map(Into::into).collect())),
            fail_appends: false,
        }
    }

    /// A store whose appends always fail, for exercising the
    /// published-but-not-recorded path
    pub fn failing() -> Self {
        Self {
            fail_appends: true,
            ..Self::default()
        }
    }

    /// Snapshot of the recorded texts, in append order
    pub fn snapshot(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, text: &str) -> Result<(), HistoryError> {
        check_single_line(text)?;

        if self.fail_appends {
            return Err(HistoryError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "simulated history write failure",
            )));
        }

        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        Ok(self
            .snapshot()
            .into_iter()
            .map(|text| HistoryEntry {
                text,
                posted_at: None,
            })
            .collect())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
