//! SQLite-backed history

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::path::Path;

use super::{check_single_line, HistoryEntry, HistoryStore};
use crate::error::HistoryError;

pub struct SqliteHistoryStore {
    pool: SqlitePool,
    location: String,
}

impl SqliteHistoryStore {
    /// Open (or create) the database and ensure the `posted` table exists
    pub async fn open(path: &Path) -> Result<Self, HistoryError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let location = path.display().to_string();

        // Forward slashes work on every platform; mode=rwc creates the file.
        let db_url = format!("sqlite://{}?mode=rwc", location.replace('\\', "/"));
        let pool = SqlitePool::connect(&db_url).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posted (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                posted_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posted_text ON posted(text)")
            .execute(&pool)
            .await?;

        Ok(Self { pool, location })
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn append(&self, text: &str) -> Result<(), HistoryError> {
        check_single_line(text)?;

        sqlx::query("INSERT INTO posted (text, posted_at) VALUES (?, ?)")
            .bind(text)
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn load(&self) -> Result<std::collections::HashSet<String>, HistoryError> {
        let rows = sqlx::query("SELECT DISTINCT text FROM posted")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get::<String, _>("text")).collect())
    }

    async fn entries(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let rows = sqlx::query("SELECT text, posted_at FROM posted ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| HistoryEntry {
                text: row.get("text"),
                posted_at: DateTime::from_timestamp(row.get::<i64, _>("posted_at"), 0),
            })
            .collect())
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.location)
    }
}
