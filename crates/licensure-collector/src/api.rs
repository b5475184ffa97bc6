//! Collector for registries that expose a paged JSON search API.

use crate::error::{CollectError, Result};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::source::{ApiEntry, Collector, RawProviderRecord};
use licensure_core::{ApiSourceConfig, SourceId};
use serde::Serialize;
use std::time::Duration;

/// Body of one search request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SearchRequest<'a> {
    opt_person_facility: &'a str,
    #[serde(rename = "ProfessionID")]
    profession_id: u32,
    license_type_id: u32,
    state: &'a str,
    country: &'a str,
    county: Option<&'a str>,
    is_facility: u8,
    person_id: Option<u64>,
    page_no: u32,
}

/// Walks the search API page by page, starting at page 0, until a page
/// comes back empty.
pub struct ApiPaginatingCollector {
    client: reqwest::Client,
    config: ApiSourceConfig,
    retry: RetryPolicy,
    source: SourceId,
}

impl ApiPaginatingCollector {
    /// Create a collector for the configured endpoint.
    pub fn new(config: ApiSourceConfig, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            retry,
            source: SourceId::Penn,
        })
    }

    fn request(&self, page: u32) -> SearchRequest<'_> {
        SearchRequest {
            opt_person_facility: &self.config.person_or_facility,
            profession_id: self.config.profession_id,
            license_type_id: self.config.license_type_id,
            state: &self.config.state,
            country: &self.config.country,
            county: None,
            is_facility: 0,
            person_id: None,
            page_no: page,
        }
    }

    /// One attempt at fetching a page body. Error statuses count as failures.
    async fn fetch_page(&self, page: u32) -> std::result::Result<String, reqwest::Error> {
        self.client
            .post(&self.config.endpoint)
            .json(&self.request(page))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

/// Decode a page body. `None` marks the empty page that ends the walk.
///
/// Entries of the wrong shape are skipped; a body that is not an array
/// at all is an error.
fn decode_page(page: u32, body: &str) -> std::result::Result<Option<Vec<ApiEntry>>, String> {
    let items: Vec<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| format!("page {page} is not a JSON array: {e}"))?;

    if items.is_empty() {
        return Ok(None);
    }

    Ok(Some(
        items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| match serde_json::from_value::<ApiEntry>(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping entry {} of page {}: {}", i, page, e);
                    None
                }
            })
            .collect(),
    ))
}

#[async_trait::async_trait]
impl Collector for ApiPaginatingCollector {
    fn source(&self) -> SourceId {
        self.source
    }

    async fn collect(&self) -> Result<Vec<RawProviderRecord>> {
        let mut records = Vec::new();
        let mut page = 0u32;

        loop {
            let what = format!("{} page {}", self.source, page);
            let body = match retry_with_backoff(&self.retry, &what, || self.fetch_page(page)).await
            {
                Ok(body) => body,
                Err(exhausted) => {
                    return Err(CollectError::TransientNetwork {
                        source_id: self.source,
                        attempts: exhausted.attempts,
                        reason: exhausted.last_error.to_string(),
                        partial: records,
                    })
                }
            };

            let entries = match decode_page(page, &body) {
                Ok(Some(entries)) => entries,
                Ok(None) => {
                    tracing::debug!("{} page {} is empty, collection finished", self.source, page);
                    break;
                }
                Err(context) => {
                    return Err(CollectError::Parse {
                        context,
                        partial: records,
                    })
                }
            };

            tracing::debug!("{} page {}: {} entries", self.source, page, entries.len());
            records.extend(entries.into_iter().map(RawProviderRecord::Api));
            page += 1;
        }

        tracing::info!(
            "Collected {} records from {} in {} pages",
            records.len(),
            self.source,
            page
        );
        Ok(records)
    }
}
