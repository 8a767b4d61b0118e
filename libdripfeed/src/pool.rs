//! Candidate pool loading

use std::path::Path;

use crate::error::{ConfigError, Result};

/// Split text into candidate lines.
///
/// Lines end at `\n`, `\r\n` or a bare `\r`. Each line is
/// whitespace-trimmed and blank lines are dropped. Order and duplicates are
/// kept as-is.
pub fn parse_lines(content: &str) -> Vec<String> {
    content
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read the candidate pool from `path`.
///
/// # Errors
///
/// Returns `ConfigError::PoolNotFound` when the file does not exist and
/// `ConfigError::PoolUnreadable` when it cannot be read.
pub async fn load_pool(path: &Path) -> Result<Vec<String>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::PoolNotFound(path.display().to_string()).into());
        }
        Err(e) => {
            return Err(ConfigError::PoolUnreadable {
                path: path.display().to_string(),
                source: e,
            }
            .into());
        }
    };

    let pool = parse_lines(&content);
    tracing::debug!("Loaded {} candidates from {}", pool.len(), path.display());
    Ok(pool)
}
