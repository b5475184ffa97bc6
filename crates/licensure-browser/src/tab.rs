//! A single Chromium tab with guaranteed release.

use crate::actions::BrowserActions;
use crate::error::{BrowserError, Result};
use chromiumoxide::Page;
use std::future::Future;
use std::time::Duration;

/// Chromium tab that is closed exactly once.
///
/// `close()` is the normal path. A tab dropped while still open (early
/// return, panic) schedules its close on the runtime it was created on,
/// since chromiumoxide pages are not released on drop.
pub struct ChromeTab {
    page: Option<Page>,
    navigation_timeout: Duration,
    runtime: tokio::runtime::Handle,
}

impl ChromeTab {
    /// Wrap a freshly opened page.
    pub fn new(page: Page, navigation_timeout: Duration) -> Self {
        Self {
            page: Some(page),
            navigation_timeout,
            runtime: tokio::runtime::Handle::current(),
        }
    }

    fn page(&self) -> Result<&Page> {
        self.page.as_ref().ok_or(BrowserError::TabClosed)
    }

    async fn with_timeout<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, chromiumoxide::error::CdpError>>,
    {
        match tokio::time::timeout(self.navigation_timeout, fut).await {
            Ok(result) => result.map_err(|e| BrowserError::NavigationError(format!("{what}: {e}"))),
            Err(_) => Err(BrowserError::Timeout(format!(
                "{what} after {:?}",
                self.navigation_timeout
            ))),
        }
    }
}

#[async_trait::async_trait]
impl BrowserActions for ChromeTab {
    async fn navigate(&self, url: &str) -> Result<()> {
        let page = self.page()?;
        self.with_timeout(&format!("navigation to {url}"), async {
            page.goto(url).await.map(|_| ())
        })
        .await?;
        tracing::debug!("Navigated to {}", url);
        Ok(())
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        let page = self.page()?;
        let script = format!(
            r"(() => {{
                const el = document.querySelector({sel});
                const v = {val};
                if (!el) return false;
                if (el.options && !Array.from(el.options).some(o => o.value === v)) return false;
                el.value = v;
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()",
            sel = serde_json::to_string(selector)?,
            val = serde_json::to_string(value)?,
        );

        let found: bool = page.evaluate(script.as_str()).await?.into_value()?;
        if found {
            Ok(())
        } else {
            Err(BrowserError::SelectorNotFound(selector.to_string()))
        }
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let page = self.page()?;
        let element = page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?;
        element.click().await?;
        Ok(())
    }

    async fn wait_for_navigation(&self) -> Result<()> {
        let page = self.page()?;
        self.with_timeout("waiting for navigation", async {
            page.wait_for_navigation().await.map(|_| ())
        })
        .await
    }

    async fn attribute_all(&self, selector: &str, attribute: &str) -> Result<Vec<Option<String>>> {
        let page = self.page()?;
        // A missing element is an empty match here, the caller decides whether to poll.
        let Ok(elements) = page.find_elements(selector).await else {
            return Ok(Vec::new());
        };

        let mut values = Vec::with_capacity(elements.len());
        for element in &elements {
            values.push(element.attribute(attribute).await?);
        }
        Ok(values)
    }

    async fn inner_html(&self, selector: &str) -> Result<String> {
        let page = self.page()?;
        let element = page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?;
        Ok(element.inner_html().await?.unwrap_or_default())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(page) = self.page.take() {
            page.close().await?;
            tracing::debug!("Tab closed");
        }
        Ok(())
    }
}

impl Drop for ChromeTab {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            self.runtime.spawn(async move {
                if let Err(e) = page.close().await {
                    tracing::warn!("Failed to close dropped tab: {}", e);
                }
            });
        }
    }
}
