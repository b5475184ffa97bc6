//! Mapping from provider-specific raw records to [`LicenseRecord`].

use crate::error::{CollectError, Result};
use crate::source::{ApiEntry, RawProviderRecord, TableRow};
use licensure_core::LicenseRecord;

/// Converts raw provider records into canonical records.
///
/// Stateless; one instance can be shared across crawls.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordNormalizer;

impl RecordNormalizer {
    /// Create a normalizer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Normalize a single raw record.
    ///
    /// Returns `CollectError::InvalidRecord` when the record has no usable
    /// name or license number.
    pub fn normalize(&self, raw: &RawProviderRecord) -> Result<LicenseRecord> {
        match raw {
            RawProviderRecord::Api(entry) => Self::from_api(entry),
            RawProviderRecord::Table(row) => Self::from_table(row),
        }
    }

    fn from_api(entry: &ApiEntry) -> Result<LicenseRecord> {
        let name = assemble_name(
            entry.first_name.as_deref(),
            entry.middle_name.as_deref(),
            entry.last_name.as_deref(),
        );
        let license_number = required(entry.license_number.as_deref(), "license number")?;

        LicenseRecord::new(
            name,
            license_number,
            entry.city.as_deref().unwrap_or_default(),
            entry.state.as_deref().filter(|s| !s.trim().is_empty()),
            entry.status.as_deref() == Some("Active"),
        )
        .map_err(|e| CollectError::InvalidRecord(e.to_string()))
    }

    fn from_table(row: &TableRow) -> Result<LicenseRecord> {
        let license_number = required(Some(row.license_number.as_str()), "license number")?;

        LicenseRecord::new(
            row.full_name.trim(),
            license_number,
            &row.city,
            None,
            status_is_active(&row.status),
        )
        .map_err(|e| CollectError::InvalidRecord(e.to_string()))
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CollectError::InvalidRecord(format!("missing {field}"))),
    }
}

/// Join the present name parts with single spaces.
///
/// Blank parts are treated as missing.
#[must_use]
pub fn assemble_name(first: Option<&str>, middle: Option<&str>, last: Option<&str>) -> String {
    [first, middle, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a combined status text such as `CLEAR/Active` marks an active
/// license. Matches the word `active` case-insensitively, so `Inactive`
/// is not active.
#[must_use]
pub fn status_is_active(status: &str) -> bool {
    status
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word.eq_ignore_ascii_case("active"))
}
