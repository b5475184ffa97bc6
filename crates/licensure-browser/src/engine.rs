use crate::actions::{BrowserSession, SessionLauncher};
use crate::error::{BrowserError, Result};
use crate::tab::ChromeTab;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use futures::stream::StreamExt;
use licensure_core::BrowserConfig;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Browser automation engine
pub struct BrowserEngine {
    browser: Browser,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
    closed: bool,
}

impl BrowserEngine {
    /// Launch Chromium with the given settings
    pub async fn launch(settings: &BrowserConfig) -> Result<Self> {
        let config = chrome_config(settings)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        // Spawn browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("Browser handler event error: {}", e);
                }
            }
        });

        tracing::info!("Browser launched (headless: {})", settings.headless);

        Ok(Self {
            browser,
            handler,
            navigation_timeout: Duration::from_secs(settings.navigation_timeout_secs),
            closed: false,
        })
    }
}

fn chrome_config(settings: &BrowserConfig) -> Result<ChromeConfig> {
    let mut builder = ChromeConfig::builder()
        .no_sandbox()
        .window_size(settings.window_width, settings.window_height)
        .request_timeout(Duration::from_secs(settings.navigation_timeout_secs));

    if !settings.headless {
        builder = builder.with_head();
    }

    builder.build().map_err(BrowserError::ChromiumError)
}

#[async_trait::async_trait]
impl BrowserSession for BrowserEngine {
    type Tab = ChromeTab;

    async fn open_tab(&self) -> Result<ChromeTab> {
        if self.closed {
            return Err(BrowserError::ChromiumError("browser already shut down".to_string()));
        }
        let page = self.browser.new_page("about:blank").await?;
        Ok(ChromeTab::new(page, self.navigation_timeout))
    }

    async fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Failed waiting for browser process: {}", e);
        }
        self.handler.abort();
        tracing::info!("Browser shut down");

        closed.map(|_| ()).map_err(BrowserError::from)
    }
}

impl Drop for BrowserEngine {
    fn drop(&mut self) {
        // The chromium child process is killed by `Browser`'s own drop.
        self.handler.abort();
    }
}

/// Launches a [`BrowserEngine`] per crawl.
#[derive(Debug, Clone)]
pub struct EngineLauncher {
    settings: BrowserConfig,
}

impl EngineLauncher {
    /// Create a launcher for the given browser settings
    #[must_use]
    pub fn new(settings: BrowserConfig) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl SessionLauncher for EngineLauncher {
    type Session = BrowserEngine;

    async fn launch(&self) -> Result<BrowserEngine> {
        BrowserEngine::launch(&self.settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrome_config_builds_from_defaults() {
        let settings = BrowserConfig::default();
        let result = chrome_config(&settings);
        // Without a chromium install the builder reports a missing executable.
        if let Err(e) = result {
            assert!(matches!(e, BrowserError::ChromiumError(_)));
        }
    }
}
