//! [`WizardPage`] backed by a local Chrome through `headless_chrome`.
//!
//! DOM work is done with small scripts evaluated in the page. Each script
//! returns a primitive (a boolean, or a JSON-encoded string) so no remote
//! object handles are needed. `headless_chrome` is blocking; DevTools calls
//! run on tokio's blocking pool.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use tokio::time::Instant;

use crate::error::DriverError;
use crate::page::{PageLauncher, RowCells, WizardPage};

const POLL_INTERVAL: Duration = Duration::from_millis(150);

/// Launches one Chrome process per page.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    headless: bool,
}

impl ChromeLauncher {
    #[must_use]
    pub fn new(headless: bool) -> Self {
        Self { headless }
    }
}

#[async_trait]
impl PageLauncher for ChromeLauncher {
    type Page = ChromePage;

    async fn launch(&self) -> Result<ChromePage, DriverError> {
        let headless = self.headless;
        tokio::task::spawn_blocking(move || {
            let options = LaunchOptions::default_builder()
                .headless(headless)
                .build()
                .map_err(|e| DriverError::Browser(e.to_string()))?;
            let browser = Browser::new(options).map_err(|e| DriverError::Browser(e.to_string()))?;
            let tab = browser
                .new_tab()
                .map_err(|e| DriverError::Browser(e.to_string()))?;
            tracing::debug!(headless, "chrome launched");
            Ok(ChromePage {
                browser: Some(browser),
                tab,
            })
        })
        .await
        .map_err(|e| DriverError::Browser(e.to_string()))?
    }
}

/// One Chrome tab. Dropping the page kills its browser process.
pub struct ChromePage {
    browser: Option<Browser>,
    tab: Arc<Tab>,
}

impl std::fmt::Debug for ChromePage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromePage")
            .field("open", &self.browser.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WizardPage for ChromePage {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), DriverError> {
        let tab = Arc::clone(&self.tab);
        let target = url.to_string();
        blocking(&tab, move |tab| {
            tab.set_default_timeout(timeout);
            tab.navigate_to(&target)
                .map_err(|e| DriverError::Browser(e.to_string()))?;
            tab.wait_until_navigated()
                .map_err(|e| DriverError::Timeout {
                    what: format!("navigation to {target} ({e})"),
                    after: timeout,
                })?;
            Ok(())
        })
        .await?;

        poll_until("document load", timeout, || {
            eval_flag(&tab, "document.readyState === 'complete'".to_string())
        })
        .await
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let tab = Arc::clone(&self.tab);
        let script = format!("document.querySelector({}) !== null", js_str(selector));
        poll_until(selector, timeout, || eval_flag(&tab, script.clone())).await
    }

    async fn wait_for_url(&mut self, fragment: &str, timeout: Duration) -> Result<(), DriverError> {
        let tab = Arc::clone(&self.tab);
        let what = format!("url containing {fragment}");
        poll_until(&what, timeout, || {
            let fragment = fragment.to_string();
            let tab = Arc::clone(&tab);
            async move {
                let url = blocking(&tab, |tab| Ok(tab.get_url())).await?;
                Ok(url.contains(&fragment).then_some(()))
            }
        })
        .await
    }

    async fn set_value(&mut self, selector: &str, value: &str) -> Result<(), DriverError> {
        let script = format!(
            "(() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                el.value = {val};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()",
            sel = js_str(selector),
            val = js_str(value),
        );
        expect_found(&self.tab, selector, script).await
    }

    async fn remove_attribute(
        &mut self,
        selector: &str,
        attribute: &str,
    ) -> Result<(), DriverError> {
        let script = format!(
            "(() => {{
                const el = document.querySelector({sel});
                if (el) el.removeAttribute({attr});
                return true;
            }})()",
            sel = js_str(selector),
            attr = js_str(attribute),
        );
        eval(&self.tab, script).await.map(drop)
    }

    async fn remove_elements(&mut self, selector: &str) -> Result<(), DriverError> {
        let script = format!(
            "(() => {{ document.querySelectorAll({}).forEach(e => e.remove()); return true; }})()",
            js_str(selector)
        );
        eval(&self.tab, script).await.map(drop)
    }

    async fn click(&mut self, selector: &str, timeout: Duration) -> Result<(), DriverError> {
        self.wait_for_selector(selector, timeout).await?;
        let script = format!(
            "(() => {{
                const el = document.querySelector({});
                if (!el) return false;
                el.click();
                return true;
            }})()",
            js_str(selector)
        );
        expect_found(&self.tab, selector, script).await
    }

    async fn type_slowly(
        &mut self,
        selector: &str,
        text: &str,
        delay: Duration,
    ) -> Result<(), DriverError> {
        let tab = Arc::clone(&self.tab);
        let target = selector.to_string();
        blocking(&tab, move |tab| {
            tab.find_element(&target)
                .map_err(|_| DriverError::ElementNotFound {
                    selector: target.clone(),
                })?
                .click()
                .map_err(|e| DriverError::Browser(e.to_string()))?;
            Ok(())
        })
        .await?;

        // One key at a time so the page's incremental search fires per key.
        for ch in text.chars() {
            let key = ch.to_string();
            blocking(&tab, move |tab| {
                tab.type_str(&key)
                    .map_err(|e| DriverError::Browser(e.to_string()))?;
                Ok(())
            })
            .await?;
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn click_with_text(
        &mut self,
        selector: &str,
        text: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let tab = Arc::clone(&self.tab);
        let script = format!(
            "(() => {{
                const wanted = {text};
                const el = Array.from(document.querySelectorAll({sel}))
                    .find(e => (e.innerText || e.textContent || '').includes(wanted));
                if (!el) return false;
                el.click();
                return true;
            }})()",
            sel = js_str(selector),
            text = js_str(text),
        );
        let what = format!("{selector} containing '{text}'");
        poll_until(&what, timeout, || eval_flag(&tab, script.clone())).await
    }

    async fn capture_responses(&mut self, url_fragment: &str) -> Result<(), DriverError> {
        let script = CAPTURE_HOOK.replace("__FRAGMENT__", &js_str(url_fragment));
        eval(&self.tab, script).await.map(drop)
    }

    async fn wait_for_response(&mut self, timeout: Duration) -> Result<String, DriverError> {
        let tab = Arc::clone(&self.tab);
        let script = "(() => {
                const c = window.__ciewatchCaptured;
                return c && c.length ? c[c.length - 1] : null;
            })()"
            .to_string();
        poll_until("availability response", timeout, || {
            let tab = Arc::clone(&tab);
            let script = script.clone();
            async move {
                Ok(eval(&tab, script)
                    .await?
                    .as_str()
                    .map(str::to_string))
            }
        })
        .await
    }

    async fn row_cells(&mut self, marker_selector: &str) -> Result<Vec<RowCells>, DriverError> {
        let script = format!(
            "JSON.stringify(Array.from(document.querySelectorAll({})).map(m => {{
                const row = m.closest('tr');
                return row
                    ? Array.from(row.querySelectorAll('th, td')).map(c => (c.innerText || '').trim())
                    : [];
            }}))",
            js_str(marker_selector)
        );
        let value = eval(&self.tab, script).await?;
        let json = value
            .as_str()
            .ok_or_else(|| DriverError::Script("row script returned no string".to_string()))?;
        serde_json::from_str(json).map_err(|e| DriverError::Script(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        let Some(browser) = self.browser.take() else {
            return Ok(());
        };
        let tab = Arc::clone(&self.tab);
        let closed = blocking(&tab, |tab| {
            tab.close(true)
                .map(drop)
                .map_err(|e| DriverError::Browser(e.to_string()))
        })
        .await;
        // Dropping the browser waits for the Chrome process to exit.
        tokio::task::spawn_blocking(move || drop(browser))
            .await
            .map_err(|e| DriverError::Browser(e.to_string()))?;
        closed
    }
}

/// Wraps `fetch` and `XMLHttpRequest` so bodies of matching responses are
/// kept on `window.__ciewatchCaptured`.
const CAPTURE_HOOK: &str = r"(() => {
    window.__ciewatchFragment = __FRAGMENT__;
    if (window.__ciewatchCaptured) return true;
    window.__ciewatchCaptured = [];
    const keep = (url, body) => {
        if (String(url || '').includes(window.__ciewatchFragment)) {
            window.__ciewatchCaptured.push(typeof body === 'string' ? body : JSON.stringify(body));
        }
    };
    const nativeFetch = window.fetch;
    window.fetch = function (...args) {
        return nativeFetch.apply(this, args).then(res => {
            const url = res.url || (args[0] && args[0].url) || args[0];
            res.clone().text().then(text => keep(url, text)).catch(() => {});
            return res;
        });
    };
    const nativeOpen = XMLHttpRequest.prototype.open;
    XMLHttpRequest.prototype.open = function (method, url, ...rest) {
        this.addEventListener('load', () => {
            try { keep(url, this.response); } catch (e) {}
        });
        return nativeOpen.call(this, method, url, ...rest);
    };
    return true;
})()";

/// Encode `s` as a JavaScript string literal.
fn js_str(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

async fn blocking<T, F>(tab: &Arc<Tab>, f: F) -> Result<T, DriverError>
where
    F: FnOnce(&Tab) -> Result<T, DriverError> + Send + 'static,
    T: Send + 'static,
{
    let tab = Arc::clone(tab);
    tokio::task::spawn_blocking(move || f(&tab))
        .await
        .map_err(|e| DriverError::Browser(e.to_string()))?
}

async fn eval(tab: &Arc<Tab>, script: String) -> Result<Value, DriverError> {
    blocking(tab, move |tab| {
        let object = tab
            .evaluate(&script, false)
            .map_err(|e| DriverError::Script(e.to_string()))?;
        Ok(object.value.unwrap_or(Value::Null))
    })
    .await
}

/// Evaluate a boolean script; `Some(())` once it is true.
async fn eval_flag(tab: &Arc<Tab>, script: String) -> Result<Option<()>, DriverError> {
    let value = eval(tab, script).await?;
    Ok(value.as_bool().unwrap_or(false).then_some(()))
}

async fn expect_found(tab: &Arc<Tab>, selector: &str, script: String) -> Result<(), DriverError> {
    match eval(tab, script).await?.as_bool() {
        Some(true) => Ok(()),
        _ => Err(DriverError::ElementNotFound {
            selector: selector.to_string(),
        }),
    }
}

/// Re-run `check` until it yields a value or `timeout` elapses.
///
/// Check errors count as "not yet": the page may be mid-navigation and
/// briefly without an execution context.
async fn poll_until<T, F, Fut>(what: &str, timeout: Duration, mut check: F) -> Result<T, DriverError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, DriverError>>,
{
    let started = Instant::now();
    loop {
        match check().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => tracing::trace!(what, error = %e, "check failed; retrying"),
        }
        if started.elapsed() >= timeout {
            return Err(DriverError::Timeout {
                what: what.to_string(),
                after: timeout,
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
