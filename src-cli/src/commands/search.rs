use crate::state::AppState;
use licensure_db::{licenses, StoredLicense};
use serde::Serialize;

/// One page of stored records.
#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub records: Vec<StoredLicense>,
    /// Cursor for the following page; absent once the page is empty
    pub next_cursor: Option<i64>,
}

/// Read up to one page of records after `cursor`, optionally filtered by
/// a case-insensitive name prefix.
pub async fn search(
    state: &AppState,
    prefix: Option<&str>,
    cursor: i64,
) -> anyhow::Result<SearchPage> {
    let records = licenses::search(state.db.pool(), prefix, cursor).await?;
    let next_cursor = records.last().map(|r| r.id);
    tracing::debug!("Search returned {} records after cursor {}", records.len(), cursor);
    Ok(SearchPage {
        records,
        next_cursor,
    })
}
