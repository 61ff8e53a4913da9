//! In-memory [`WizardPage`] that plays back a scripted wizard.
//!
//! The page behaves like the real portal as far as the navigator can tell:
//! submitting the identity form moves the URL to the location route, and the
//! availability table appears only when rows were scripted. Waits on a
//! "stalled" selector time out immediately instead of sleeping.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::DriverError;
use crate::page::{PageLauncher, RowCells, WizardPage};
use crate::selectors;

#[derive(Debug, Default)]
pub struct ScriptedPage {
    url: String,
    rows: Option<Vec<RowCells>>,
    response: Option<String>,
    stall_on: Option<String>,
    fail_on: Option<String>,
    capturing: Option<String>,
    journal: Arc<Mutex<Vec<String>>>,
    open_pages: Option<Arc<AtomicUsize>>,
    closed: bool,
}

impl ScriptedPage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render an availability table with these rows.
    #[must_use]
    pub fn with_rows(mut self, rows: Vec<Vec<&str>>) -> Self {
        self.rows = Some(
            rows.into_iter()
                .map(|row| row.into_iter().map(str::to_string).collect())
                .collect(),
        );
        self
    }

    /// Answer the availability request with this body.
    #[must_use]
    pub fn with_response(mut self, body: impl Into<String>) -> Self {
        self.response = Some(body.into());
        self
    }

    /// Waits and clicks on `target` (a selector or a URL fragment) time out.
    #[must_use]
    pub fn stalling_on(mut self, target: &str) -> Self {
        self.stall_on = Some(target.to_string());
        self
    }

    /// Any action on `selector` fails with [`DriverError::ElementNotFound`].
    #[must_use]
    pub fn failing_on(mut self, selector: &str) -> Self {
        self.fail_on = Some(selector.to_string());
        self
    }

    /// Shared log of every action performed on the page, in order.
    #[must_use]
    pub fn journal(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.journal)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn record(&self, entry: String) {
        if let Ok(mut journal) = self.journal.lock() {
            journal.push(entry);
        }
    }

    fn check(&self, target: &str, timeout: Duration) -> Result<(), DriverError> {
        if self.stall_on.as_deref() == Some(target) {
            return Err(DriverError::Timeout {
                what: target.to_string(),
                after: timeout,
            });
        }
        if self.fail_on.as_deref() == Some(target) {
            return Err(DriverError::ElementNotFound {
                selector: target.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl WizardPage for ScriptedPage {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), DriverError> {
        self.record(format!("goto {url}"));
        self.check(url, timeout)?;
        self.url = url.to_string();
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        self.record(format!("wait {selector}"));
        self.check(selector, timeout)?;
        if selector == selectors::OFFICE_ROW_MARKER && self.rows.is_none() {
            return Err(DriverError::Timeout {
                what: selector.to_string(),
                after: timeout,
            });
        }
        Ok(())
    }

    async fn wait_for_url(&mut self, fragment: &str, timeout: Duration) -> Result<(), DriverError> {
        self.record(format!("wait-url {fragment}"));
        self.check(fragment, timeout)?;
        if self.url.contains(fragment) {
            Ok(())
        } else {
            Err(DriverError::Timeout {
                what: format!("url containing {fragment}"),
                after: timeout,
            })
        }
    }

    async fn set_value(&mut self, selector: &str, value: &str) -> Result<(), DriverError> {
        self.record(format!("set {selector}={value}"));
        self.check(selector, Duration::ZERO)
    }

    async fn remove_attribute(
        &mut self,
        selector: &str,
        attribute: &str,
    ) -> Result<(), DriverError> {
        self.record(format!("remove-attr {selector} {attribute}"));
        self.check(selector, Duration::ZERO)
    }

    async fn remove_elements(&mut self, selector: &str) -> Result<(), DriverError> {
        self.record(format!("remove {selector}"));
        self.check(selector, Duration::ZERO)
    }

    async fn click(&mut self, selector: &str, timeout: Duration) -> Result<(), DriverError> {
        self.record(format!("click {selector}"));
        self.check(selector, timeout)?;
        if selector == selectors::SUBMIT && !self.url.contains(selectors::LOCATION_ROUTE) {
            self.url = format!("{}/{}", self.url, selectors::LOCATION_ROUTE);
        }
        Ok(())
    }

    async fn type_slowly(
        &mut self,
        selector: &str,
        text: &str,
        _delay: Duration,
    ) -> Result<(), DriverError> {
        self.record(format!("type {selector}={text}"));
        self.check(selector, Duration::ZERO)
    }

    async fn click_with_text(
        &mut self,
        selector: &str,
        text: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        self.record(format!("click-text {selector}={text}"));
        self.check(selector, timeout)
    }

    async fn capture_responses(&mut self, url_fragment: &str) -> Result<(), DriverError> {
        self.record(format!("capture {url_fragment}"));
        self.capturing = Some(url_fragment.to_string());
        Ok(())
    }

    async fn wait_for_response(&mut self, timeout: Duration) -> Result<String, DriverError> {
        self.record("wait-response".to_string());
        match (&self.capturing, &self.response) {
            (Some(_), Some(body)) => Ok(body.clone()),
            _ => Err(DriverError::Timeout {
                what: "availability response".to_string(),
                after: timeout,
            }),
        }
    }

    async fn row_cells(&mut self, marker_selector: &str) -> Result<Vec<RowCells>, DriverError> {
        self.record(format!("rows {marker_selector}"));
        self.check(marker_selector, Duration::ZERO)?;
        Ok(self.rows.clone().unwrap_or_default())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.record("close".to_string());
        if !self.closed {
            self.closed = true;
            if let Some(open) = &self.open_pages {
                open.fetch_sub(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }
}

/// Hands out queued [`ScriptedPage`]s and tracks how many are open at once.
#[derive(Debug, Default)]
pub struct ScriptedLauncher {
    pages: Mutex<VecDeque<ScriptedPage>>,
    open: Arc<AtomicUsize>,
    max_open: AtomicUsize,
    launched: AtomicUsize,
}

impl ScriptedLauncher {
    #[must_use]
    pub fn new(pages: impl IntoIterator<Item = ScriptedPage>) -> Self {
        Self {
            pages: Mutex::new(pages.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Pages currently launched and not yet closed.
    #[must_use]
    pub fn open_pages(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously open pages observed.
    #[must_use]
    pub fn max_open_pages(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageLauncher for ScriptedLauncher {
    type Page = ScriptedPage;

    async fn launch(&self) -> Result<ScriptedPage, DriverError> {
        let next = self
            .pages
            .lock()
            .map_err(|e| DriverError::Browser(e.to_string()))?
            .pop_front();
        let Some(mut page) = next else {
            return Err(DriverError::Browser("no scripted page left".to_string()));
        };
        self.launched.fetch_add(1, Ordering::SeqCst);
        let now_open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_open.fetch_max(now_open, Ordering::SeqCst);
        page.open_pages = Some(Arc::clone(&self.open));
        Ok(page)
    }
}
