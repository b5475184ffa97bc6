use crate::error::{BrowserError, Result};

/// Per-tab browser actions for automation
#[async_trait::async_trait]
pub trait BrowserActions: Send + Sync {
    /// Navigate to a URL
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Choose an option of a `<select>` control by value
    async fn select_option(&self, selector: &str, value: &str) -> Result<()>;

    /// Click an element by selector
    async fn click(&self, selector: &str) -> Result<()>;

    /// Wait until the navigation triggered by the last action has finished
    async fn wait_for_navigation(&self) -> Result<()>;

    /// Read one attribute from every element matching the selector.
    ///
    /// Elements without the attribute yield `None`, in document order.
    async fn attribute_all(&self, selector: &str, attribute: &str) -> Result<Vec<Option<String>>>;

    /// Inner HTML of the first element matching the selector
    async fn inner_html(&self, selector: &str) -> Result<String>;

    /// Close the tab. Closing twice is a no-op.
    async fn close(&mut self) -> Result<()>;
}

/// A running browser that hands out independent tabs.
#[async_trait::async_trait]
pub trait BrowserSession: Send + Sync {
    /// Tab type produced by this session
    type Tab: BrowserActions + 'static;

    /// Open a new, blank browsing context
    async fn open_tab(&self) -> Result<Self::Tab>;

    /// Release the browser. Must be safe to call after a failed crawl.
    async fn shutdown(&mut self) -> Result<()>;
}

/// Starts browser sessions on demand.
#[async_trait::async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Session type produced by this launcher
    type Session: BrowserSession;

    /// Launch a fresh session
    async fn launch(&self) -> Result<Self::Session>;
}

/// Resolve a link found on a page against the site origin.
///
/// Absolute links are returned unchanged.
pub fn resolve_url(base: &str, href: &str) -> Result<String> {
    let base = url::Url::parse(base)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid base URL: {}", e)))?;

    base.join(href)
        .map(String::from)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid link '{}': {}", href, e)))
}
