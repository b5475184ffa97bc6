//! Application state management.

use anyhow::Context;
use licensure_collector::CrawlOrchestrator;
use licensure_core::AppConfig;
use licensure_db::Database;
use std::sync::Arc;

/// State shared by every command: configuration and the migrated store.
pub struct AppState {
    /// Validated configuration
    pub config: AppConfig,
    /// License store, migrated to the latest schema
    pub db: Arc<Database>,
}

impl AppState {
    /// Open the configured store and bring its schema up to date.
    pub async fn open(config: AppConfig) -> anyhow::Result<Self> {
        let db = Database::open(&config.database).await.with_context(|| {
            format!(
                "failed to open license store at {}",
                config.database.path.display()
            )
        })?;
        db.run_migrations()
            .await
            .context("failed to run database migrations")?;

        tracing::info!("License store: {}", config.database.path.display());

        Ok(Self {
            config,
            db: Arc::new(db),
        })
    }

    /// Orchestrator bound to this state's store and configuration.
    #[must_use]
    pub fn orchestrator(&self) -> CrawlOrchestrator {
        CrawlOrchestrator::new(Arc::clone(&self.db), self.config.clone())
    }

    /// Close the store once no orchestrator holds it any more.
    pub async fn close(self) {
        match Arc::try_unwrap(self.db) {
            Ok(db) => db.close().await,
            Err(_) => tracing::debug!("License store still shared, leaving it open"),
        }
    }
}
