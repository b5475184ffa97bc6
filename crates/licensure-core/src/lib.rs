//! Licensure Core - Foundation crate for the license registry crawler.
//!
//! This crate provides shared types, error handling and configuration
//! management that all other Licensure crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - The canonical [`LicenseRecord`] and the [`SourceId`] of each registry
//!
//! # Example
//!
//! ```rust
//! use licensure_core::{AppConfig, SourceId};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! config.validate()?;
//!
//! let source: SourceId = "florida".parse()?;
//! assert_eq!(source, SourceId::Florida);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    ApiSourceConfig, AppConfig, BrowserConfig, BrowserSourceConfig, DatabaseConfig, RetryConfig,
};
pub use error::{ConfigError, ConfigResult, LicensureError, Result};
pub use types::{LicenseRecord, SourceId};
