//! Command handlers.

pub mod crawl;
pub mod search;
