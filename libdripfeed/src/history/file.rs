//! Flat-file history: one published text per line, append-only

use async_trait::async_trait;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use super::{check_single_line, HistoryEntry, HistoryStore};
use crate::error::HistoryError;
use crate::pool::parse_lines;

pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    /// Open the history file, creating it and its parent directories if needed
    pub async fn open(path: &Path) -> Result<Self, HistoryError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn append(&self, text: &str) -> Result<(), HistoryError> {
        check_single_line(text)?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut line = String::with_capacity(text.len() + 2);

        // A hand-edited file may lack its final newline.
        if file.metadata().await?.len() > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1)).await?;
            file.read_exact(&mut last).await?;
            if last[0] != b'\n' {
                line.push('\n');
            }
        }

        line.push_str(text);
        line.push('\n');

        file.write_all(line.as_bytes()).await?;
        file.sync_data().await?;

        tracing::debug!("Appended history entry to {}", self.path.display());
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(parse_lines(&content)
            .into_iter()
            .map(|text| HistoryEntry {
                text,
                posted_at: None,
            })
            .collect())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
