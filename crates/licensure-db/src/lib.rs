//! Licensure Database Layer
//!
//! Provides `SQLite` access for canonical license records.
//! Uses `SQLx` with embedded migrations.
//!
//! # Architecture
//!
//! - **Schema**: a single `licenses` table with an increasing `id` used as the read cursor
//! - **Idempotent writes**: a unique index over all five record columns plus
//!   `ON CONFLICT DO NOTHING`, so re-crawls never duplicate rows
//! - **Migrations**: SQL migrations are embedded and versioned using `SQLx`
//! - **Parameterized queries**: every value is bound, including search prefixes
//!
//! # Example
//!
//! ```ignore
//! use licensure_db::{licenses, Database};
//!
//! let db = Database::new("licenses.db", 5).await?;
//! db.run_migrations().await?;
//! let report = licenses::insert_batch(db.pool(), &records).await;
//! let first_page = licenses::search(db.pool(), Some("smi"), 0).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod error;
pub mod licenses;
pub mod migrations;

// Re-export commonly used types
pub use connection::LicensePool;
pub use error::{DatabaseError, Result};
pub use licenses::{BatchReport, ChunkFailure, StoredLicense, SEARCH_PAGE_SIZE};

use licensure_core::DatabaseConfig;
use std::path::Path;

/// High-level database interface with migrations.
///
/// This provides a convenient wrapper around `LicensePool` that handles
/// initialization and migration.
#[derive(Debug, Clone)]
pub struct Database {
    pool: LicensePool,
}

impl Database {
    /// Open the database file at `path`, creating it if missing.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let pool = LicensePool::new(path, max_connections).await?;
        Ok(Self { pool })
    }

    /// Open the database described by the configuration.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        Self::new(&config.path, config.max_connections).await
    }

    /// Open a private in-memory database.
    pub async fn in_memory() -> Result<Self> {
        Self::new(connection::IN_MEMORY, 1).await
    }

    /// Run all pending database migrations.
    ///
    /// # Errors
    /// Returns `DatabaseError::Migration` if any migration fails.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(self.pool.pool()).await
    }

    /// Get the current schema version.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(self.pool.pool()).await
    }

    /// Get a reference to the underlying connection pool.
    ///
    /// This allows direct access to the `SQLx` pool for custom queries.
    #[must_use]
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Sqlite> {
        self.pool.pool()
    }

    /// Close the database connection gracefully.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_creation() {
        let db = Database::in_memory().await.expect("create database");
        db.pool.ping().await.expect("ping database");
    }

    #[tokio::test]
    async fn test_database_migrations() {
        let db = Database::in_memory().await.expect("create database");

        let version_before = db.get_schema_version().await.expect("get version");
        assert_eq!(version_before, 0);

        db.run_migrations().await.expect("run migrations");

        let version_after = db.get_schema_version().await.expect("get version");
        assert_eq!(version_after, 1);
    }

    #[tokio::test]
    async fn test_database_schema() {
        let db = Database::in_memory().await.expect("create database");
        db.run_migrations().await.expect("run migrations");

        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('licenses') ORDER BY cid")
                .fetch_all(db.pool())
                .await
                .expect("query columns");

        assert_eq!(
            columns,
            vec![
                "id",
                "name",
                "license_number",
                "city",
                "state",
                "is_license_active"
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_name_rejected_by_schema() {
        let db = Database::in_memory().await.expect("create database");
        db.run_migrations().await.expect("run migrations");

        let result = sqlx::query(
            "INSERT INTO licenses (name, license_number, city, state, is_license_active)
             VALUES ('  ', 'RN1', 'ERIE', NULL, 1)",
        )
        .execute(db.pool())
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_database_close() {
        let db = Database::in_memory().await.expect("create database");
        db.close().await; // Should not panic
    }
}
