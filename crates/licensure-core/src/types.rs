//! Shared types used across the Licensure crawler.
//!
//! This module defines the canonical license record every source is
//! normalized into, and the identifiers of the supported registries.

use crate::error::{LicensureError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a supported license registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Pennsylvania licensing system, a paginated JSON API.
    Penn,
    /// Florida healthcare provider search, server-rendered HTML behind a search form.
    Florida,
}

impl SourceId {
    /// All supported sources, in a stable order.
    pub const ALL: [SourceId; 2] = [SourceId::Penn, SourceId::Florida];

    /// Get the identifier used on the command line and in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Penn => "penn",
            Self::Florida => "florida",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = LicensureError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "penn" => Ok(Self::Penn),
            "florida" => Ok(Self::Florida),
            other => Err(LicensureError::Validation(format!(
                "unknown source '{other}', expected one of: penn, florida"
            ))),
        }
    }
}

/// Canonical, storage-ready license entry common to all sources.
///
/// Records are built once per raw provider entry, written once, and never
/// mutated. `city` (and `state`, when present) are stored upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Full display name of the licensee, never empty
    pub name: String,
    /// Provider-assigned license number (not globally unique)
    pub license_number: String,
    /// City, upper-cased
    pub city: String,
    /// State, upper-cased; absent for sources that do not report it
    pub state: Option<String>,
    /// Whether the registry reports the license as active
    pub is_license_active: bool,
}

impl LicenseRecord {
    /// Build a record, enforcing the canonical casing and the non-empty name.
    ///
    /// # Errors
    /// Returns `LicensureError::Validation` if `name` is empty after trimming.
    pub fn new(
        name: impl Into<String>,
        license_number: impl Into<String>,
        city: &str,
        state: Option<&str>,
        is_license_active: bool,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LicensureError::Validation(
                "license record name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            name,
            license_number: license_number.into(),
            city: city.trim().to_uppercase(),
            state: state.map(|s| s.trim().to_uppercase()),
            is_license_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_parse() {
        assert_eq!("penn".parse::<SourceId>().expect("parse"), SourceId::Penn);
        assert_eq!(
            " Florida ".parse::<SourceId>().expect("parse"),
            SourceId::Florida
        );
        assert!("ohio".parse::<SourceId>().is_err());
        assert!("".parse::<SourceId>().is_err());
    }

    #[test]
    fn test_source_id_display_round_trips() {
        for source in SourceId::ALL {
            let parsed: SourceId = source.to_string().parse().expect("parse display");
            assert_eq!(parsed, source);
        }
    }

    #[test]
    fn test_source_id_serialization() {
        let json = serde_json::to_string(&SourceId::Florida).expect("serialize source");
        assert_eq!(json, "\"florida\"");
    }

    #[test]
    fn test_license_record_normalizes_casing() {
        let record = LicenseRecord::new("JOHN SMITH", "RN123", " pittsburgh", Some("pa"), true)
            .expect("valid record");
        assert_eq!(record.city, "PITTSBURGH");
        assert_eq!(record.state.as_deref(), Some("PA"));
    }

    #[test]
    fn test_license_record_rejects_empty_name() {
        let result = LicenseRecord::new("   ", "RN123", "ERIE", None, false);
        assert!(matches!(result, Err(LicensureError::Validation(_))));
    }
}
