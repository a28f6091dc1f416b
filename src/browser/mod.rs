//! Browser capability seam.
//!
//! The pipeline never talks to a browser engine directly; it drives a
//! [`BrowserSession`], an opaque capability over "navigate, query DOM,
//! wait, click, type". The production implementation is chromiumoxide
//! (CDP) behind the `browser` feature; tests supply an in-memory session.

#[cfg(feature = "browser")]
mod chrome;
mod config;
#[cfg(test)]
pub(crate) mod fake;

#[cfg(feature = "browser")]
pub use chrome::ChromeSession;
pub use config::BrowserEngineConfig;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::BrowserError;

/// Interval between condition re-checks inside the bounded waits.
const WAIT_POLL_STEP: Duration = Duration::from_millis(250);

/// A live, single-tab browser session.
///
/// Implementations are free to represent DOM elements however they like;
/// callers only ever hold them as opaque `Element` handles and feed them
/// back into the session.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Element: Send + Sync;

    /// Navigate the session's tab to a URL.
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    /// All elements matching a selector on the current page.
    async fn query(&self, selector: &str) -> Result<Vec<Self::Element>, BrowserError>;

    /// All elements matching a selector within a previously queried element.
    async fn query_within(
        &self,
        element: &Self::Element,
        selector: &str,
    ) -> Result<Vec<Self::Element>, BrowserError>;

    /// Visible text content of an element.
    async fn text(&self, element: &Self::Element) -> Result<String, BrowserError>;

    /// Attribute value of an element, if present.
    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, BrowserError>;

    /// Click an element.
    async fn click(&self, element: &Self::Element) -> Result<(), BrowserError>;

    /// Clear an input element and type text into it.
    async fn clear_and_type(
        &self,
        element: &Self::Element,
        text: &str,
    ) -> Result<(), BrowserError>;

    /// Wait until a selector matches, bounded by `timeout`.
    ///
    /// Returns the first matching element, or [`BrowserError::Timeout`].
    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Self::Element, BrowserError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(element) = self.query(selector).await?.into_iter().next() {
                return Ok(element);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BrowserError::Timeout {
                    selector: selector.to_string(),
                    waited_secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(WAIT_POLL_STEP).await;
        }
    }

    /// Wait until a selector no longer matches, bounded by `timeout`.
    async fn wait_for_absent(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.query(selector).await?.is_empty() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BrowserError::Timeout {
                    selector: selector.to_string(),
                    waited_secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(WAIT_POLL_STEP).await;
        }
    }
}
