//! Collector for registries that only serve server-rendered HTML behind
//! an interactive search form.
//!
//! One tab submits the search. Every result page then gets its own tab.
//! Tabs are opened concurrently up to `max_open_tabs`, and their tables
//! are scraped sequentially in page order.

use crate::error::{CollectError, Result};
use crate::pagination::inner_page_links;
use crate::parser::TableParser;
use crate::retry::{retry_with_backoff, RetryExhausted, RetryPolicy};
use crate::source::{Collector, RawProviderRecord};
use futures::stream::{self, StreamExt};
use licensure_browser::{resolve_url, BrowserActions, BrowserError, BrowserSession, SessionLauncher};
use licensure_core::{BrowserSourceConfig, SourceId};
use std::future::Future;
use std::time::Duration;

/// Scrapes every result page of the browser-only registry.
pub struct BrowserPaginatingCollector<L> {
    launcher: L,
    config: BrowserSourceConfig,
    retry: RetryPolicy,
    parser: TableParser,
    source: SourceId,
}

impl<L: SessionLauncher> BrowserPaginatingCollector<L> {
    /// Create a collector that launches its browser through `launcher`.
    pub fn new(launcher: L, config: BrowserSourceConfig, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            launcher,
            config,
            retry,
            parser: TableParser::new()?,
            source: SourceId::Florida,
        })
    }

    /// Open a tab on `url`, retrying failed navigations.
    ///
    /// A tab whose navigation failed is closed before the next attempt.
    async fn open_page<S: BrowserSession>(
        &self,
        session: &S,
        url: &str,
    ) -> std::result::Result<S::Tab, RetryExhausted<BrowserError>> {
        let what = format!("navigation to {url}");
        retry_with_backoff(&self.retry, &what, move || async move {
            let mut tab = session.open_tab().await?;
            if let Err(e) = tab.navigate(url).await {
                if let Err(close_err) = tab.close().await {
                    tracing::warn!("Failed to close tab after navigation error: {}", close_err);
                }
                return Err(e);
            }
            Ok(tab)
        })
        .await
    }

    /// Call `check` until it yields a value, at most `max_poll_attempts` times.
    async fn poll_until<T, F, Fut>(&self, what: &str, mut check: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<Option<T>, BrowserError>>,
    {
        let attempts = self.config.max_poll_attempts;
        let interval = Duration::from_millis(self.config.poll_interval_ms);

        for attempt in 1..=attempts {
            if let Some(value) = check().await? {
                return Ok(value);
            }
            tracing::trace!("{} not rendered yet (poll {}/{})", what, attempt, attempts);
            if attempt < attempts {
                tokio::time::sleep(interval).await;
            }
        }

        Err(CollectError::RenderTimeout {
            what: what.to_string(),
            attempts,
            partial: Vec::new(),
        })
    }

    /// Choose `value` in a select control once that option exists.
    async fn select_when_ready<T: BrowserActions>(
        &self,
        tab: &T,
        selector: &str,
        value: &str,
    ) -> Result<()> {
        self.poll_until(&format!("option '{value}' of {selector}"), move || async move {
            match tab.select_option(selector, value).await {
                Ok(()) => Ok(Some(())),
                Err(BrowserError::SelectorNotFound(_)) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
    }

    /// Apply the board and profession filters and submit the search.
    async fn submit_search<T: BrowserActions>(&self, tab: &T) -> Result<()> {
        let cfg = &self.config;
        self.select_when_ready(tab, &cfg.board_selector, &cfg.board_id)
            .await?;
        self.select_when_ready(tab, &cfg.profession_selector, &cfg.profession_id)
            .await?;
        let submit = cfg.submit_selector.as_str();
        retry_with_backoff(&self.retry, "search submission", move || async move {
            tab.click(submit).await?;
            tab.wait_for_navigation().await
        })
        .await
        .map_err(|e| self.network_failure(e, Vec::new()))?;
        tracing::debug!(
            "Search submitted (board {}, profession {})",
            cfg.board_id,
            cfg.profession_id
        );
        Ok(())
    }

    /// Absolute URLs of the result pages listed by the pagination control.
    async fn discover_pages<T: BrowserActions>(&self, tab: &T) -> Result<Vec<String>> {
        let selector = self.config.pagination_selector.as_str();
        let hrefs = self
            .poll_until("pagination control", move || async move {
                let hrefs = tab.attribute_all(selector, "href").await?;
                Ok::<_, BrowserError>((!hrefs.is_empty()).then_some(hrefs))
            })
            .await?;

        let urls: Vec<String> = inner_page_links(&hrefs)
            .iter()
            .filter_map(|href| match resolve_url(&self.config.base_url, href) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("Skipping pagination link '{}': {}", href, e);
                    None
                }
            })
            .collect();

        tracing::debug!("Discovered {} result pages", urls.len());
        Ok(urls)
    }

    /// Table rows of one tab, skipping rows that do not parse.
    async fn scrape_tab<T: BrowserActions>(&self, tab: &T, page: usize) -> Vec<RawProviderRecord> {
        let html = match tab.inner_html(&self.config.table_selector).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Skipping result page {}: {}", page, e);
                return Vec::new();
            }
        };

        self.parser
            .parse(&html)
            .into_iter()
            .filter_map(|row| match row {
                Ok(row) => Some(RawProviderRecord::Table(row)),
                Err(e) => {
                    tracing::warn!("Skipping row on result page {}: {}", page, e);
                    None
                }
            })
            .collect()
    }

    /// Everything between launch and release. Every tab it opens ends up
    /// in `tabs`, including on error, so the caller can close them.
    async fn scrape<S: BrowserSession>(
        &self,
        session: &S,
        tabs: &mut Vec<S::Tab>,
    ) -> Result<Vec<RawProviderRecord>> {
        let search_url = self.config.search_url();
        let search_tab = self
            .open_page(session, &search_url)
            .await
            .map_err(|e| self.network_failure(e, Vec::new()))?;
        tabs.push(search_tab);

        self.submit_search(&tabs[0]).await?;
        let urls = match self.discover_pages(&tabs[0]).await {
            Ok(urls) => urls,
            Err(CollectError::RenderTimeout { what, attempts, .. }) => {
                // The search page's own table is still on screen.
                let partial = self.scrape_tab(&tabs[0], 0).await;
                return Err(CollectError::RenderTimeout {
                    what,
                    attempts,
                    partial,
                });
            }
            Err(e) => return Err(e),
        };

        let opening: Vec<_> = urls
            .iter()
            .map(|url| self.open_page(session, url))
            .collect();
        let opened: Vec<_> = stream::iter(opening)
            .buffered(self.config.max_open_tabs.max(1))
            .collect()
            .await;

        let mut failure = None;
        for result in opened {
            match result {
                Ok(tab) => tabs.push(tab),
                Err(exhausted) => {
                    failure.get_or_insert(exhausted);
                }
            }
        }

        let mut records = Vec::new();
        for (page, tab) in tabs.iter().enumerate() {
            records.extend(self.scrape_tab(tab, page).await);
        }

        match failure {
            Some(exhausted) => Err(self.network_failure(exhausted, records)),
            None => Ok(records),
        }
    }

    fn network_failure(
        &self,
        exhausted: RetryExhausted<BrowserError>,
        partial: Vec<RawProviderRecord>,
    ) -> CollectError {
        CollectError::TransientNetwork {
            source_id: self.source,
            attempts: exhausted.attempts,
            reason: exhausted.last_error.to_string(),
            partial,
        }
    }
}

/// Close every tab, then the session. Failures are logged, never raised.
async fn release<S: BrowserSession>(session: &mut S, tabs: &mut Vec<S::Tab>) {
    let count = tabs.len();
    for mut tab in tabs.drain(..) {
        if let Err(e) = tab.close().await {
            tracing::warn!("Failed to close tab: {}", e);
        }
    }
    if let Err(e) = session.shutdown().await {
        tracing::warn!("Failed to shut down browser session: {}", e);
    }
    tracing::debug!("Released {} tabs and the browser session", count);
}

#[async_trait::async_trait]
impl<L: SessionLauncher> Collector for BrowserPaginatingCollector<L> {
    fn source(&self) -> SourceId {
        self.source
    }

    async fn collect(&self) -> Result<Vec<RawProviderRecord>> {
        let mut session = self.launcher.launch().await?;
        let mut tabs = Vec::new();

        let outcome = self.scrape(&session, &mut tabs).await;
        release(&mut session, &mut tabs).await;

        if let Ok(records) = &outcome {
            tracing::info!("Collected {} records from {}", records.len(), self.source);
        }
        outcome
    }
}
