//! Headless browser sessions for the scraper tier.
//!
//! The scraper only needs a handful of page operations, so the browser sits behind
//! a small trait pair. [`ChromeLauncher`] drives a real headless Chrome through the
//! DevTools protocol.

use crate::error::{Result, TubeRagError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::js::EvaluationResult;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Starts browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>>;
}

/// A live browser with at most one open page.
///
/// Callers must call [`BrowserSession::close`] on every exit path.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate to `url`, opening the page if needed.
    async fn open(&mut self, url: &str) -> Result<()>;

    /// Focus the element matching `selector` and type `text` into it.
    async fn type_into(&mut self, selector: &str, text: &str) -> Result<()>;

    /// Click the element matching `selector` through a script-dispatched click.
    async fn click(&mut self, selector: &str) -> Result<()>;

    /// Whether an element matching `selector` is present.
    async fn exists(&mut self, selector: &str) -> Result<bool>;

    /// Visible text of every element matching `selector`, in document order.
    async fn texts(&mut self, selector: &str) -> Result<Vec<String>>;

    /// Evaluate a script expected to produce a string or null.
    async fn evaluate_string(&mut self, script: &str) -> Result<Option<String>>;

    /// Shut the browser down. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

/// Launches headless Chrome/Chromium.
pub struct ChromeLauncher {
    executable: Option<PathBuf>,
}

impl ChromeLauncher {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        let mut builder = BrowserConfig::builder()
            .new_headless_mode()
            .no_sandbox()
            .window_size(1920, 1080)
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", USER_AGENT));

        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }

        let config = builder.build().map_err(TubeRagError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| TubeRagError::Browser(format!("failed to launch Chrome: {}", e)))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        debug!("Headless Chrome launched");

        Ok(Box::new(ChromeSession {
            browser,
            handler_task,
            page: None,
            closed: false,
        }))
    }
}

/// A running Chrome process and its DevTools event loop.
struct ChromeSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Option<Page>,
    closed: bool,
}

impl ChromeSession {
    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| TubeRagError::Browser("no page is open".to_string()))
    }
}

fn cdp_err(e: chromiumoxide::error::CdpError) -> TubeRagError {
    TubeRagError::Browser(e.to_string())
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// A script result that may be JS `null` or `undefined`. Both arrive without a value.
fn optional_string(result: EvaluationResult) -> Result<Option<String>> {
    if matches!(result.value(), None | Some(serde_json::Value::Null)) {
        return Ok(None);
    }
    Ok(Some(result.into_value()?))
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn open(&mut self, url: &str) -> Result<()> {
        match &self.page {
            Some(page) => {
                page.goto(url).await.map_err(cdp_err)?;
            }
            None => {
                let page = self.browser.new_page(url).await.map_err(cdp_err)?;
                self.page = Some(page);
            }
        }
        Ok(())
    }

    async fn type_into(&mut self, selector: &str, text: &str) -> Result<()> {
        let element = self.page()?.find_element(selector).await.map_err(cdp_err)?;
        element.click().await.map_err(cdp_err)?;
        element.type_str(text).await.map_err(cdp_err)?;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        let script = format!(
            "(() => {{ const el = document.querySelector({}); if (!el) return false; el.click(); return true; }})()",
            js_string(selector)
        );
        let clicked: bool = self
            .page()?
            .evaluate(script)
            .await
            .map_err(cdp_err)?
            .into_value()?;

        if clicked {
            Ok(())
        } else {
            Err(TubeRagError::Browser(format!("no element matches {}", selector)))
        }
    }

    async fn exists(&mut self, selector: &str) -> Result<bool> {
        let script = format!("document.querySelector({}) !== null", js_string(selector));
        let found: bool = self
            .page()?
            .evaluate(script)
            .await
            .map_err(cdp_err)?
            .into_value()?;
        Ok(found)
    }

    async fn texts(&mut self, selector: &str) -> Result<Vec<String>> {
        let elements = self.page()?.find_elements(selector).await.map_err(cdp_err)?;
        let mut texts = Vec::with_capacity(elements.len());
        for element in elements {
            if let Some(text) = element.inner_text().await.map_err(cdp_err)? {
                texts.push(text);
            }
        }
        Ok(texts)
    }

    async fn evaluate_string(&mut self, script: &str) -> Result<Option<String>> {
        let result = self.page()?.evaluate(script).await.map_err(cdp_err)?;
        optional_string(result)
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.page = None;

        let close_result = self.browser.close().await;
        if let Err(e) = &close_result {
            warn!("Graceful browser close failed, killing process: {}", e);
            self.browser.kill().await;
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to reap browser process: {}", e);
        }
        self.handler_task.abort();

        debug!("Headless Chrome closed");
        close_result.map(|_| ()).map_err(cdp_err)
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // Browser kills its child process on drop; the event loop must go with it.
        self.handler_task.abort();
    }
}
