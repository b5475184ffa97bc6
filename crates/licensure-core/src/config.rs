//! Configuration management for Licensure.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// This is loaded from `~/.config/licensure/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// License store settings
    pub database: DatabaseConfig,
    /// JSON API registry settings
    pub api_source: ApiSourceConfig,
    /// Browser-driven registry settings
    pub browser_source: BrowserSourceConfig,
    /// Headless browser settings
    pub browser: BrowserConfig,
    /// Retry/backoff settings for network and navigation calls
    pub retry: RetryConfig,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// Unlike [`AppConfig::load`], a missing file is an error here.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration (from `path` when given) with environment variable overrides,
    /// then validate it.
    ///
    /// Supports the following environment variables:
    /// - `LICENSURE_DATABASE_PATH`: Override the SQLite database path
    /// - `LICENSURE_HEADLESS`: Override browser headless mode (true/false)
    /// - `LICENSURE_MAX_OPEN_TABS`: Override the browser worker limit
    /// - `LICENSURE_API_ENDPOINT`: Override the JSON API endpoint
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("LICENSURE_DATABASE_PATH") {
            tracing::debug!("Override database.path from env: {}", val);
            self.database.path = PathBuf::from(val);
        }

        if let Some(val) = lookup("LICENSURE_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Some(val) = lookup("LICENSURE_MAX_OPEN_TABS") {
            if let Ok(max) = val.parse() {
                self.browser_source.max_open_tabs = max;
                tracing::debug!("Override browser_source.max_open_tabs from env: {}", max);
            }
        }

        if let Some(val) = lookup("LICENSURE_API_ENDPOINT") {
            tracing::debug!("Override api_source.endpoint from env: {}", val);
            self.api_source.endpoint = val;
        }
    }

    /// Check the bounds every retry and fan-out loop relies on.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.browser_source.max_open_tabs == 0 {
            return Err(invalid("browser_source.max_open_tabs", "must be at least 1"));
        }
        if self.browser_source.max_poll_attempts == 0 {
            return Err(invalid("browser_source.max_poll_attempts", "must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", "must be at least 1"));
        }
        if self.database.max_connections == 0 {
            return Err(invalid("database.max_connections", "must be at least 1"));
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/licensure/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("org", "licensure", "licensure").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/licensure`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("org", "licensure", "licensure").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// License store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
    /// Maximum pooled connections
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: AppConfig::data_dir()
                .map_or_else(|_| PathBuf::from("licenses.db"), |dir| dir.join("licenses.db")),
            max_connections: 5,
        }
    }
}

/// JSON API registry settings (the Pennsylvania search endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSourceConfig {
    /// Search endpoint receiving the paged POST requests
    pub endpoint: String,
    /// Person or facility selector sent as `OptPersonFacility`
    pub person_or_facility: String,
    /// Profession identifier
    pub profession_id: u32,
    /// License type identifier
    pub license_type_id: u32,
    /// State filter (empty for all states)
    pub state: String,
    /// Country filter
    pub country: String,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiSourceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.pals.pa.gov/api/Search/SearchForPersonOrFacilty".to_string(),
            person_or_facility: "Person".to_string(),
            profession_id: 37,
            license_type_id: 84,
            state: String::new(),
            country: "ALL".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Browser-driven registry settings (the Florida provider search).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSourceConfig {
    /// Site origin that discovered page paths are resolved against
    pub base_url: String,
    /// Path of the search form
    pub search_path: String,
    /// Selector of the board filter control
    pub board_selector: String,
    /// Board option value
    pub board_id: String,
    /// Selector of the profession filter control
    pub profession_selector: String,
    /// Profession option value
    pub profession_id: String,
    /// Selector of the search submit control
    pub submit_selector: String,
    /// Selector of the anchors inside the pagination control
    pub pagination_selector: String,
    /// Selector of the results table
    pub table_selector: String,
    /// Maximum number of result pages being opened at once
    pub max_open_tabs: usize,
    /// Delay between polls while waiting for the pagination control
    pub poll_interval_ms: u64,
    /// Maximum polls before giving up on the pagination control
    pub max_poll_attempts: u32,
}

impl BrowserSourceConfig {
    /// Full URL of the search form.
    #[must_use]
    pub fn search_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.search_path)
    }
}

impl Default for BrowserSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mqa-internet.doh.state.fl.us".to_string(),
            search_path: "/MQASearchServices/healthcareproviders".to_string(),
            board_selector: "select#BoardDD".to_string(),
            board_id: "15".to_string(),
            profession_selector: "select#ProfessionDD".to_string(),
            profession_id: "1501".to_string(),
            submit_selector: "[type=submit]".to_string(),
            pagination_selector: "ul.pagination > li > a".to_string(),
            table_selector: "table".to_string(),
            max_open_tabs: 4,
            poll_interval_ms: 150,
            max_poll_attempts: 100,
        }
    }
}

/// Headless browser settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            navigation_timeout_secs: 30,
        }
    }
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per operation, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for every further retry
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 500,
        }
    }
}
