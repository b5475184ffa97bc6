//! License record operations.
//!
//! Duplicate-safe batch inserts into the `licenses` table and the
//! cursor-paginated name search over it. Every value reaches SQLite as a
//! bound parameter.

use crate::error::DatabaseError;
use licensure_core::LicenseRecord;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};

/// Rows returned by one [`search`] call.
pub const SEARCH_PAGE_SIZE: i64 = 50;

/// Rows per INSERT statement. Five bound values per row keeps each
/// statement well under SQLite's 32766 parameter limit.
const ROWS_PER_STATEMENT: usize = 1000;

/// A license record together with its store-assigned cursor id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLicense {
    /// Increasing identifier, used as the search cursor
    pub id: i64,
    /// The canonical record
    #[serde(flatten)]
    pub record: LicenseRecord,
}

/// Records of one INSERT statement that could not be written.
#[derive(Debug, Clone)]
pub struct ChunkFailure {
    /// Records that were not persisted
    pub records: Vec<LicenseRecord>,
    /// Database error reported for the statement
    pub reason: String,
}

/// Outcome of [`insert_batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Records submitted
    pub attempted: usize,
    /// Rows actually written
    pub inserted: u64,
    /// Records skipped because an identical row already existed
    pub duplicates: u64,
    /// Statements that failed, with the records they carried
    pub failures: Vec<ChunkFailure>,
}

impl BatchReport {
    /// All records that failed to persist.
    pub fn failed_records(&self) -> impl Iterator<Item = &LicenseRecord> {
        self.failures.iter().flat_map(|f| f.records.iter())
    }

    /// Turn any failed statement into a `DatabaseError::BatchFailed`.
    pub fn check(&self) -> Result<(), DatabaseError> {
        match self.failures.first() {
            None => Ok(()),
            Some(first) => Err(DatabaseError::BatchFailed {
                failed: self.failed_records().count(),
                attempted: self.attempted,
                reason: first.reason.clone(),
            }),
        }
    }
}

/// Insert records, ignoring rows identical to one already stored.
///
/// Records are written in multi-row statements with `ON CONFLICT DO NOTHING`
/// against the natural-key index over all five columns, so re-crawling the
/// same registry is a no-op. A failing statement does not stop the batch: it
/// is logged and its records are returned in [`BatchReport::failures`].
pub async fn insert_batch(pool: &Pool<Sqlite>, records: &[LicenseRecord]) -> BatchReport {
    let mut report = BatchReport {
        attempted: records.len(),
        ..BatchReport::default()
    };

    for chunk in records.chunks(ROWS_PER_STATEMENT) {
        match insert_chunk(pool, chunk).await {
            Ok(inserted) => {
                report.inserted += inserted;
                report.duplicates += chunk.len() as u64 - inserted;
            }
            Err(e) => {
                tracing::error!("Failed to insert {} license records: {}", chunk.len(), e);
                report.failures.push(ChunkFailure {
                    records: chunk.to_vec(),
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::debug!(
        "Batch insert: {} attempted, {} inserted, {} duplicates, {} failed",
        report.attempted,
        report.inserted,
        report.duplicates,
        report.failed_records().count()
    );

    report
}

async fn insert_chunk(pool: &Pool<Sqlite>, chunk: &[LicenseRecord]) -> Result<u64, sqlx::Error> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "INSERT INTO licenses (name, license_number, city, state, is_license_active) ",
    );
    builder.push_values(chunk, |mut row, record| {
        row.push_bind(record.name.clone())
            .push_bind(record.license_number.clone())
            .push_bind(record.city.clone())
            .push_bind(record.state.clone())
            .push_bind(record.is_license_active);
    });
    builder.push(" ON CONFLICT DO NOTHING");

    let result = builder.build().execute(pool).await?;
    Ok(result.rows_affected())
}

/// Fetch the next page of stored licenses after `cursor`.
///
/// Returns up to [`SEARCH_PAGE_SIZE`] rows with `id > cursor`, ordered by id.
/// When `prefix` is non-empty only names starting with it are returned.
/// Matching uses SQLite `LIKE`, which folds case for ASCII letters only:
/// `smith` finds `SMITH`, but `émile` does not find `ÉMILE`. Pass the last
/// returned id as the next cursor; an empty page means the listing is
/// exhausted.
///
/// # Errors
/// Returns `sqlx::Error` if the database query fails.
pub async fn search(
    pool: &Pool<Sqlite>,
    prefix: Option<&str>,
    cursor: i64,
) -> Result<Vec<StoredLicense>, sqlx::Error> {
    let rows = match prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => {
            sqlx::query(
                r"SELECT id, name, license_number, city, state, is_license_active
                  FROM licenses
                  WHERE name LIKE ? ESCAPE '\' AND id > ?
                  ORDER BY id
                  LIMIT ?",
            )
            .bind(like_prefix_pattern(prefix))
            .bind(cursor)
            .bind(SEARCH_PAGE_SIZE)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT id, name, license_number, city, state, is_license_active
                 FROM licenses
                 WHERE id > ?
                 ORDER BY id
                 LIMIT ?",
            )
            .bind(cursor)
            .bind(SEARCH_PAGE_SIZE)
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter().map(parse_license_row).collect()
}

/// Escape LIKE wildcards so user text only ever matches literally.
fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn parse_license_row(row: &sqlx::sqlite::SqliteRow) -> Result<StoredLicense, sqlx::Error> {
    Ok(StoredLicense {
        id: row.try_get("id")?,
        record: LicenseRecord {
            name: row.try_get("name")?,
            license_number: row.try_get("license_number")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            is_license_active: row.try_get("is_license_active")?,
        },
    })
}
