//! Crawl orchestration.
//!
//! Selects the collector for a source, runs it, normalizes what it
//! returned and writes the result through the duplicate-safe sink.

use crate::api::ApiPaginatingCollector;
use crate::browser::BrowserPaginatingCollector;
use crate::error::{CollectError, Result};
use crate::normalizer::RecordNormalizer;
use crate::retry::RetryPolicy;
use crate::source::Collector;
use chrono::{DateTime, Utc};
use licensure_browser::EngineLauncher;
use licensure_core::{AppConfig, LicenseRecord, SourceId};
use licensure_db::{licenses, Database, DatabaseError};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Outcome of one crawl.
#[derive(Debug)]
pub struct CrawlReport {
    /// Identifier of this run, also attached to its log span
    pub run_id: Uuid,
    /// Registry that was crawled
    pub source: SourceId,
    /// When collection started
    pub started_at: DateTime<Utc>,
    /// When the last write finished
    pub finished_at: DateTime<Utc>,
    /// Raw records returned by the collector, including partial results
    pub collected: usize,
    /// Records that normalized cleanly
    pub normalized: usize,
    /// Records dropped by the normalizer
    pub skipped: usize,
    /// New rows written
    pub inserted: u64,
    /// Records already stored
    pub duplicates: u64,
    /// Normalized records that could not be written
    pub failed_records: Vec<LicenseRecord>,
    /// Write failure summary when `failed_records` is not empty
    pub persistence_error: Option<DatabaseError>,
    /// Why collection stopped early, if it did
    pub collection_error: Option<CollectError>,
}

impl CrawlReport {
    /// True when the collector finished and every record was written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.collection_error.is_none() && self.failed_records.is_empty()
    }

    /// Wall-clock time the crawl took.
    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Runs crawls against the license store.
pub struct CrawlOrchestrator {
    db: Arc<Database>,
    config: AppConfig,
    normalizer: RecordNormalizer,
}

impl CrawlOrchestrator {
    /// Create a new crawl orchestrator.
    #[must_use]
    pub fn new(db: Arc<Database>, config: AppConfig) -> Self {
        Self {
            db,
            config,
            normalizer: RecordNormalizer::new(),
        }
    }

    /// Build the collector that reads `source`.
    pub fn collector_for(&self, source: SourceId) -> Result<Box<dyn Collector>> {
        let retry = RetryPolicy::from(&self.config.retry);
        match source {
            SourceId::Penn => Ok(Box::new(ApiPaginatingCollector::new(
                self.config.api_source.clone(),
                retry,
            )?)),
            SourceId::Florida => Ok(Box::new(BrowserPaginatingCollector::new(
                EngineLauncher::new(self.config.browser.clone()),
                self.config.browser_source.clone(),
                retry,
            )?)),
        }
    }

    /// Crawl one registry end to end.
    ///
    /// Only building the collector can fail here. Collection and write
    /// failures are reported in the returned [`CrawlReport`].
    pub async fn crawl(&self, source: SourceId) -> Result<CrawlReport> {
        let collector = self.collector_for(source)?;
        Ok(self.crawl_with(collector.as_ref()).await)
    }

    /// Run an already-built collector, then normalize and persist its output.
    pub async fn crawl_with(&self, collector: &dyn Collector) -> CrawlReport {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("crawl", source = %collector.source(), run_id = %run_id);
        self.run(collector, run_id).instrument(span).await
    }

    async fn run(&self, collector: &dyn Collector, run_id: Uuid) -> CrawlReport {
        let source = collector.source();
        let started_at = Utc::now();
        tracing::info!("Crawl started");

        let (raw, collection_error) = match collector.collect().await {
            Ok(raw) => (raw, None),
            Err(mut e) => {
                let partial = e.take_partial();
                tracing::warn!(
                    "Collection stopped early: {} ({} records collected before the failure)",
                    e,
                    partial.len()
                );
                (partial, Some(e))
            }
        };

        let mut records = Vec::with_capacity(raw.len());
        let mut skipped = 0;
        for item in &raw {
            match self.normalizer.normalize(item) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!("Skipping record: {}", e);
                }
            }
        }

        let batch = licenses::insert_batch(self.db.pool(), &records).await;
        let persistence_error = batch.check().err();
        if let Some(e) = &persistence_error {
            tracing::error!("{}", e);
        }

        let report = CrawlReport {
            run_id,
            source,
            started_at,
            finished_at: Utc::now(),
            collected: raw.len(),
            normalized: records.len(),
            skipped,
            inserted: batch.inserted,
            duplicates: batch.duplicates,
            failed_records: batch.failed_records().cloned().collect(),
            persistence_error,
            collection_error,
        };

        tracing::info!(
            "Crawl finished: {} collected, {} skipped, {} inserted, {} duplicates, {} failed",
            report.collected,
            report.skipped,
            report.inserted,
            report.duplicates,
            report.failed_records.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ApiEntry, RawProviderRecord, TableRow};

    type Outcome = Box<dyn Fn() -> Result<Vec<RawProviderRecord>> + Send + Sync>;

    struct StubCollector {
        source: SourceId,
        outcome: Outcome,
    }

    #[async_trait::async_trait]
    impl Collector for StubCollector {
        fn source(&self) -> SourceId {
            self.source
        }

        async fn collect(&self) -> Result<Vec<RawProviderRecord>> {
            (self.outcome)()
        }
    }

    fn stub(
        source: SourceId,
        outcome: impl Fn() -> Result<Vec<RawProviderRecord>> + Send + Sync + 'static,
    ) -> StubCollector {
        StubCollector {
            source,
            outcome: Box::new(outcome),
        }
    }

    fn api(first: &str, license: &str) -> RawProviderRecord {
        RawProviderRecord::Api(ApiEntry {
            first_name: Some(first.to_string()),
            middle_name: None,
            last_name: Some("SMITH".to_string()),
            license_number: Some(license.to_string()),
            city: Some("Erie".to_string()),
            state: Some("PA".to_string()),
            status: Some("Active".to_string()),
        })
    }

    fn row(license: &str, name: &str) -> RawProviderRecord {
        RawProviderRecord::Table(TableRow {
            license_number: license.to_string(),
            full_name: name.to_string(),
            profession: "Medical Doctor".to_string(),
            city: "Miami".to_string(),
            status: "CLEAR/Active".to_string(),
        })
    }

    async fn orchestrator() -> CrawlOrchestrator {
        let db = Database::in_memory().await.unwrap();
        db.run_migrations().await.unwrap();
        CrawlOrchestrator::new(Arc::new(db), AppConfig::default())
    }

    async fn stored_names(orchestrator: &CrawlOrchestrator) -> Vec<String> {
        licenses::search(orchestrator.db.pool(), None, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.record.name)
            .collect()
    }

    #[tokio::test]
    async fn test_crawl_persists_normalized_records() {
        let orchestrator = orchestrator().await;
        let collector = stub(SourceId::Penn, || Ok(vec![api("ANN", "RN1"), api("BOB", "RN2")]));

        let report = orchestrator.crawl_with(&collector).await;

        assert!(report.is_complete());
        assert_eq!(report.source, SourceId::Penn);
        assert_eq!(report.collected, 2);
        assert_eq!(report.normalized, 2);
        assert_eq!(report.inserted, 2);
        assert!(report.finished_at >= report.started_at);
        assert_eq!(stored_names(&orchestrator).await, vec!["ANN SMITH", "BOB SMITH"]);
    }

    #[tokio::test]
    async fn test_recrawl_is_idempotent() {
        let orchestrator = orchestrator().await;
        let collector = stub(SourceId::Florida, || {
            Ok(vec![row("ME1", "DOE, JANE"), row("ME2", "ROE, RICH")])
        });

        let first = orchestrator.crawl_with(&collector).await;
        let second = orchestrator.crawl_with(&collector).await;

        assert_eq!(first.inserted, 2);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 2);
        assert_ne!(first.run_id, second.run_id);
        assert_eq!(stored_names(&orchestrator).await.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_records_are_skipped() {
        let orchestrator = orchestrator().await;
        let collector = stub(SourceId::Florida, || {
            Ok(vec![row("ME1", "DOE, JANE"), row("ME2", ""), row("ME3", "ROE, RICH")])
        });

        let report = orchestrator.crawl_with(&collector).await;

        assert!(report.is_complete());
        assert_eq!(report.collected, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.inserted, 2);
    }

    #[tokio::test]
    async fn test_partial_records_are_persisted() {
        let orchestrator = orchestrator().await;
        let collector = stub(SourceId::Penn, || {
            Err(CollectError::TransientNetwork {
                source_id: SourceId::Penn,
                attempts: 4,
                reason: "HTTP status server error (503 Service Unavailable)".to_string(),
                partial: vec![api("ANN", "RN1")],
            })
        });

        let report = orchestrator.crawl_with(&collector).await;

        assert!(!report.is_complete());
        assert_eq!(report.inserted, 1);
        assert!(matches!(
            report.collection_error,
            Some(CollectError::TransientNetwork { attempts: 4, .. })
        ));
        assert_eq!(stored_names(&orchestrator).await, vec!["ANN SMITH"]);
    }

    #[tokio::test]
    async fn test_render_timeout_is_reported() {
        let orchestrator = orchestrator().await;
        let collector = stub(SourceId::Florida, || {
            Err(CollectError::RenderTimeout {
                what: "pagination control".to_string(),
                attempts: 100,
                partial: vec![row("ME1", "DOE, JANE")],
            })
        });

        let report = orchestrator.crawl_with(&collector).await;

        assert!(!report.is_complete());
        assert_eq!(report.collected, 1);
        assert_eq!(report.inserted, 1);
        assert!(matches!(
            report.collection_error,
            Some(CollectError::RenderTimeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_failures_are_reported() {
        // No migrations: every insert fails.
        let db = Database::in_memory().await.unwrap();
        let orchestrator = CrawlOrchestrator::new(Arc::new(db), AppConfig::default());
        let collector = stub(SourceId::Penn, || Ok(vec![api("ANN", "RN1"), api("BOB", "RN2")]));

        let report = orchestrator.crawl_with(&collector).await;

        assert!(!report.is_complete());
        assert!(report.collection_error.is_none());
        assert_eq!(report.inserted, 0);
        assert_eq!(report.failed_records.len(), 2);
        assert!(matches!(
            report.persistence_error,
            Some(DatabaseError::BatchFailed { failed: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_collector_for_each_source() {
        let orchestrator = orchestrator().await;
        for source in SourceId::ALL {
            let collector = orchestrator.collector_for(source).unwrap();
            assert_eq!(collector.source(), source);
        }
    }
}
