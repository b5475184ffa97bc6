//! Raw provider records and the collector seam.

use crate::error::Result;
use licensure_core::SourceId;
use serde::{Deserialize, Serialize};

/// One entry of the JSON search API, as the registry returns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiEntry {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub license_number: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub status: Option<String>,
}

/// One row of the results table, cells in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub license_number: String,
    pub full_name: String,
    pub profession: String,
    pub city: String,
    pub status: String,
}

/// A record as a collector produced it, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawProviderRecord {
    Api(ApiEntry),
    Table(TableRow),
}

/// Pulls every raw record a single registry exposes.
#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    /// Registry this collector reads from
    fn source(&self) -> SourceId;

    /// Collect all records in registry order.
    ///
    /// Failures that leave some records collected carry them in the error
    /// (see [`crate::CollectError::take_partial`]).
    async fn collect(&self) -> Result<Vec<RawProviderRecord>>;
}
