//! Embedded schema migrations for the license store.

use crate::error::{DatabaseError, Result};
use sqlx::migrate::Migrator;
use sqlx::{Pool, Sqlite};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Version of the newest migration compiled into this build.
#[must_use]
pub fn latest_version() -> i64 {
    MIGRATOR.iter().map(|m| m.version).max().unwrap_or(0)
}

/// Apply every migration the database has not seen yet.
///
/// Applied versions are tracked by `SQLx` in `_sqlx_migrations`, so calling
/// this on an up-to-date store does nothing.
///
/// # Errors
/// Returns `DatabaseError::Migration` if a migration fails to apply.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

    tracing::info!("License store schema at version {}", latest_version());
    Ok(())
}

/// Highest successfully applied migration, or 0 for a fresh database.
pub async fn get_schema_version(pool: &Pool<Sqlite>) -> Result<i64> {
    let tracked: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;

    if !tracked {
        return Ok(0);
    }

    let version: Option<i64> =
        sqlx::query_scalar("SELECT MAX(version) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;
    Ok(version.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{LicensePool, IN_MEMORY};

    async fn fresh_pool() -> LicensePool {
        LicensePool::new(IN_MEMORY, 1).await.expect("create pool")
    }

    #[test]
    fn test_latest_version() {
        assert_eq!(latest_version(), 1);
    }

    #[tokio::test]
    async fn test_fresh_database_is_version_zero() {
        let pool = fresh_pool().await;
        assert_eq!(get_schema_version(pool.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_migrations_create_licenses_table() {
        let pool = fresh_pool().await;
        run_migrations(pool.pool()).await.expect("run migrations");

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations'
             ORDER BY name",
        )
        .fetch_all(pool.pool())
        .await
        .expect("list tables");

        assert_eq!(tables, vec!["licenses"]);
        assert_eq!(
            get_schema_version(pool.pool()).await.unwrap(),
            latest_version()
        );
    }

    #[tokio::test]
    async fn test_rerun_is_noop() {
        let pool = fresh_pool().await;
        run_migrations(pool.pool()).await.expect("first run");
        run_migrations(pool.pool()).await.expect("second run");

        let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
            .fetch_one(pool.pool())
            .await
            .unwrap();
        assert_eq!(applied, 1);
    }
}
