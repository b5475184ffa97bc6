use crate::state::AppState;
use anyhow::Context;
use chrono::{DateTime, Utc};
use licensure_collector::CrawlReport;
use licensure_core::SourceId;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Printable outcome of a crawl.
#[derive(Debug, Serialize)]
pub struct CrawlSummary {
    pub run_id: Uuid,
    pub source: SourceId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: i64,
    pub collected: usize,
    pub normalized: usize,
    pub skipped: usize,
    pub inserted: u64,
    pub duplicates: u64,
    pub failed: usize,
    pub complete: bool,
    pub collection_error: Option<String>,
    pub persistence_error: Option<String>,
}

impl From<&CrawlReport> for CrawlSummary {
    fn from(report: &CrawlReport) -> Self {
        Self {
            run_id: report.run_id,
            source: report.source,
            started_at: report.started_at,
            finished_at: report.finished_at,
            elapsed_ms: report.elapsed().num_milliseconds(),
            collected: report.collected,
            normalized: report.normalized,
            skipped: report.skipped,
            inserted: report.inserted,
            duplicates: report.duplicates,
            failed: report.failed_records.len(),
            complete: report.is_complete(),
            collection_error: report.collection_error.as_ref().map(ToString::to_string),
            persistence_error: report.persistence_error.as_ref().map(ToString::to_string),
        }
    }
}

/// Crawl `source` into the store.
pub async fn crawl(state: &AppState, source: SourceId) -> anyhow::Result<CrawlSummary> {
    info!("Crawling {}", source);
    let report = state
        .orchestrator()
        .crawl(source)
        .await
        .with_context(|| format!("failed to start crawl of {source}"))?;
    Ok(CrawlSummary::from(&report))
}
