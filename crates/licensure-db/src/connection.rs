//! Database connection management.
//!
//! Provides a `LicensePool` wrapper around the `SQLx` SQLite pool that knows
//! how to open both file-backed and in-memory stores.

use crate::error::{DatabaseError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

/// Path that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// SQLite connection pool for the license store.
#[derive(Debug, Clone)]
pub struct LicensePool {
    pool: Pool<Sqlite>,
}

impl LicensePool {
    /// Open (creating if missing) the database at `path`.
    ///
    /// `:memory:` opens a private in-memory database. Every pooled
    /// connection would see its own empty database, so the in-memory pool
    /// is pinned to a single connection that is never recycled.
    ///
    /// # Errors
    /// Returns `DatabaseError::Open` if the file cannot be opened or created.
    pub async fn new(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.to_str().ok_or_else(|| {
            DatabaseError::Open("invalid database path: not valid UTF-8".to_string())
        })?;

        let pool = if path_str == IN_MEMORY {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DatabaseError::Open(format!("invalid connection string: {e}")))?;
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            let options = SqliteConnectOptions::new()
                .filename(path)
                .journal_mode(SqliteJournalMode::Wal)
                .create_if_missing(true);
            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect_with(options)
                .await
        }
        .map_err(|e| DatabaseError::Open(format!("failed to open {path_str}: {e}")))?;

        tracing::info!("Database pool created at {}", path_str);

        Ok(Self { pool })
    }

    /// Get a reference to the underlying `SQLx` pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the connection pool gracefully.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }

    /// Verify that the database answers queries.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
