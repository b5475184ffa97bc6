//! Licensure Collector - registry crawling.
//!
//! This crate pulls license records out of government registries that expose
//! them in incompatible ways, maps them onto one canonical record, and hands
//! them to the duplicate-safe store in `licensure-db`.
//!
//! # Features
//!
//! - Paged JSON API collection that stops on the first empty page
//! - Browser-driven collection of server-rendered result pages, with a
//!   bounded number of concurrently open tabs
//! - Retry with exponential backoff for network calls and navigations
//! - Bounded polling for UI elements that render late
//! - Partial results survive a failed collection and are still stored
//!
//! # Example
//!
//! ```rust,ignore
//! use licensure_collector::CrawlOrchestrator;
//! use std::sync::Arc;
//!
//! let orchestrator = CrawlOrchestrator::new(Arc::new(database), config);
//! let report = orchestrator.crawl(SourceId::Penn).await?;
//! assert!(report.is_complete());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod api;
pub mod browser;
#[allow(missing_docs)]
pub mod error;
pub mod normalizer;
pub mod orchestrator;
pub mod pagination;
#[allow(missing_docs)]
pub mod parser;
pub mod retry;
#[allow(missing_docs)]
pub mod source;

// Re-export commonly used types
pub use api::ApiPaginatingCollector;
pub use browser::BrowserPaginatingCollector;
pub use error::{CollectError, Result};
pub use normalizer::RecordNormalizer;
pub use orchestrator::{CrawlOrchestrator, CrawlReport};
pub use pagination::inner_page_links;
pub use parser::TableParser;
pub use retry::{retry_with_backoff, RetryExhausted, RetryPolicy};
pub use source::{ApiEntry, Collector, RawProviderRecord, TableRow};
