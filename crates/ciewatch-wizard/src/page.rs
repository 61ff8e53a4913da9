//! Browser page abstraction driven by the navigator.
//!
//! Every operation that waits takes an explicit bound; implementations must
//! return [`DriverError::Timeout`] when it expires. The navigator additionally
//! wraps every call in its own `tokio::time::timeout`, so a misbehaving
//! implementation cannot block a cycle forever.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::DriverError;

/// Ordered, trimmed cell texts of one table row (`th` and `td` alike).
pub type RowCells = Vec<String>;

/// One open browser page. Exclusively owned by a single cycle.
#[async_trait]
pub trait WizardPage: Send {
    /// Navigate to `url` and wait for the document to finish loading.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), DriverError>;

    /// Wait until an element matching `selector` is attached to the DOM.
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration)
        -> Result<(), DriverError>;

    /// Wait until the current URL contains `fragment`.
    async fn wait_for_url(&mut self, fragment: &str, timeout: Duration) -> Result<(), DriverError>;

    /// Assign `value` and dispatch bubbling `input` and `change` events.
    ///
    /// Works on controls the page keeps hidden or inert, where a click would
    /// not register.
    async fn set_value(&mut self, selector: &str, value: &str) -> Result<(), DriverError>;

    /// Remove `attribute` from the first element matching `selector`, if any.
    async fn remove_attribute(&mut self, selector: &str, attribute: &str)
        -> Result<(), DriverError>;

    /// Detach every element matching `selector`. Matching nothing is not an error.
    async fn remove_elements(&mut self, selector: &str) -> Result<(), DriverError>;

    /// Wait for `selector` and click the first match.
    async fn click(&mut self, selector: &str, timeout: Duration) -> Result<(), DriverError>;

    /// Focus `selector` and type `text` one key at a time, pausing `delay`
    /// between keystrokes.
    async fn type_slowly(
        &mut self,
        selector: &str,
        text: &str,
        delay: Duration,
    ) -> Result<(), DriverError>;

    /// Wait for an element matching `selector` whose text contains `text`,
    /// then click it.
    async fn click_with_text(
        &mut self,
        selector: &str,
        text: &str,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    /// Start recording response bodies whose URL contains `url_fragment`.
    ///
    /// Must be called before the request that produces the response.
    async fn capture_responses(&mut self, url_fragment: &str) -> Result<(), DriverError>;

    /// Wait for the most recent response recorded by [`capture_responses`](Self::capture_responses).
    async fn wait_for_response(&mut self, timeout: Duration) -> Result<String, DriverError>;

    /// Cell texts of the row enclosing each element matching `marker_selector`.
    async fn row_cells(&mut self, marker_selector: &str) -> Result<Vec<RowCells>, DriverError>;

    /// Release the page. Called exactly once per session, on every path.
    async fn close(&mut self) -> Result<(), DriverError>;
}

/// Opens fresh pages, one per cycle.
#[async_trait]
pub trait PageLauncher: Send + Sync {
    type Page: WizardPage;

    /// # Errors
    ///
    /// Returns [`DriverError`] if no page can be opened.
    async fn launch(&self) -> Result<Self::Page, DriverError>;
}
