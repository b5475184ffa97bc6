//! Core error types for the Licensure crawler.
//!
//! Subsystem crates carry their own error enums. This module holds record
//! validation errors and configuration loading errors.

use thiserror::Error;

/// Errors raised by the shared types and configuration.
#[derive(Error, Debug)]
pub enum LicensureError {
    /// A value does not satisfy a record or identifier invariant
    #[error("validation error: {0}")]
    Validation(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Config file not found at an explicitly requested path
    #[error("config file not found at {path}")]
    NotFound {
        /// Path where config was expected
        path: String,
    },

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// I/O error reading config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `LicensureError`.
pub type Result<T> = std::result::Result<T, LicensureError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LicensureError::Validation("unknown source 'ohio'".to_string());
        assert_eq!(err.to_string(), "validation error: unknown source 'ohio'");

        let err = ConfigError::InvalidValue {
            field: "browser_source.max_open_tabs".to_string(),
            reason: "must be at least 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value for browser_source.max_open_tabs: must be at least 1"
        );
    }
}
