//! Browser automation engine for server-rendered registry sites.
//!
//! Provides headless Chromium control behind the [`BrowserSession`] and
//! [`BrowserActions`] seams, with tabs that are always closed, including
//! on error paths.

pub mod actions;
pub mod engine;
pub mod error;
pub mod tab;

pub use actions::{resolve_url, BrowserActions, BrowserSession, SessionLauncher};
pub use engine::{BrowserEngine, EngineLauncher};
pub use error::{BrowserError, Result};
pub use tab::ChromeTab;
