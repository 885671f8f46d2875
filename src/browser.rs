//! Browser capability used by the page fetcher.
//!
//! [`BrowserSession`] is the narrow surface the fetcher needs, so tests can
//! drive it with canned HTML. [`ChromeLauncher`] is the real implementation on
//! top of `headless_chrome`.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use headless_chrome::{Browser, LaunchOptions, Tab};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::utils::error::AppError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrowserError {
    #[error("no element matches '{0}'")]
    NoSuchElement(String),

    #[error("element '{0}' went stale")]
    StaleElement(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

/// One rendered browser tab, reused for every rule in a cycle.
///
/// Calls block the current thread.
pub trait BrowserSession: Send + Sync {
    /// Loads `url` and waits for the navigation to settle.
    fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    /// Waits until an element matching `selector` is present in the DOM.
    fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Reads the live value of the first element matching `selector`: the
    /// named attribute when given, otherwise its full `textContent`.
    ///
    /// `Ok(None)` means the element exists but has no such attribute.
    fn read_value(&self, selector: &str, attribute: Option<&str>)
    -> Result<Option<String>, BrowserError>;

    /// The current document as HTML.
    fn page_source(&self) -> Result<String, BrowserError>;

    /// Calls `condition` every `poll` until it returns true or `timeout`
    /// elapses. Returns whether the condition was met.
    fn wait_until(
        &self,
        timeout: Duration,
        poll: Duration,
        condition: &mut dyn FnMut() -> bool,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if condition() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(poll.min(deadline - now));
        }
    }
}

/// Starts one browser session per cycle.
pub trait BrowserLauncher: Send + Sync {
    type Session: BrowserSession;

    fn launch(&self) -> Result<Self::Session, AppError>;
}

pub struct ChromeLauncher {
    config: ScraperConfig,
}

impl ChromeLauncher {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    fn launch_options(&self) -> Result<LaunchOptions<'static>, AppError> {
        let mut options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .idle_browser_timeout(Duration::from_secs(self.config.idle_timeout_secs))
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-blink-features=AutomationControlled"),
            ])
            .build()
            .map_err(|e| AppError::Browser(format!("Failed to create launch options: {}", e)))?;

        if let Some(binary) = &self.config.chrome_binary {
            options.path = Some(PathBuf::from(binary));
        }
        Ok(options)
    }
}

impl BrowserLauncher for ChromeLauncher {
    type Session = ChromeSession;

    fn launch(&self) -> Result<ChromeSession, AppError> {
        if let Some(driver) = &self.config.chromedriver_path {
            debug!(path = %driver, "chromedriver_path is set but unused by the DevTools backend");
        }

        let browser = Browser::new(self.launch_options()?)
            .map_err(|e| AppError::Browser(format!("Failed to launch browser: {}", e)))?;
        let tab = browser
            .new_tab()
            .map_err(|e| AppError::Browser(format!("Failed to create tab: {}", e)))?;

        tab.set_user_agent(&self.config.user_agent, None, None)
            .map_err(|e| AppError::Browser(format!("Failed to set user agent: {}", e)))?;

        if let Err(e) = tab.enable_stealth_mode() {
            warn!(error = %e, "Could not hide navigator.webdriver; continuing");
        }

        info!(binary = ?self.config.chrome_binary, "Browser session started");
        Ok(ChromeSession {
            tab,
            _browser: browser,
        })
    }
}

/// A headless Chrome tab. Dropping it closes the tab and the browser process.
pub struct ChromeSession {
    tab: Arc<Tab>,
    _browser: Browser,
}

impl ChromeSession {
    fn evaluate(&self, expression: &str) -> Result<serde_json::Value, BrowserError> {
        let result = self
            .tab
            .evaluate(expression, false)
            .map_err(|e| BrowserError::Other(e.to_string()))?;
        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }
}

/// Renders `value` as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

impl BrowserSession for ChromeSession {
    fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| BrowserError::Other(format!("Navigation to {} failed: {}", url, e)))?;
        Ok(())
    }

    fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        match self.tab.wait_for_element_with_custom_timeout(selector, timeout) {
            Ok(_) => Ok(()),
            Err(e) if e.is::<headless_chrome::util::Timeout>() => Err(BrowserError::Timeout(timeout)),
            Err(e) => Err(BrowserError::Other(e.to_string())),
        }
    }

    fn read_value(
        &self,
        selector: &str,
        attribute: Option<&str>,
    ) -> Result<Option<String>, BrowserError> {
        let read = match attribute {
            Some(name) => format!("el.getAttribute({})", js_string(name)),
            None => "el.textContent".to_string(),
        };
        let expression = format!(
            "(() => {{ const el = document.querySelector({}); \
             if (el === null) {{ return {{ found: false }}; }} \
             return {{ found: true, value: {} }}; }})()",
            js_string(selector),
            read
        );

        // returnByValue is off, so objects come back as JSON text
        let wrapped = format!("JSON.stringify({})", expression);
        let raw = self.evaluate(&wrapped)?;
        let text = raw
            .as_str()
            .ok_or_else(|| BrowserError::Other(format!("Unexpected evaluation result: {}", raw)))?;
        let parsed: serde_json::Value =
            serde_json::from_str(text).map_err(|e| BrowserError::Other(e.to_string()))?;

        if !parsed["found"].as_bool().unwrap_or(false) {
            return Err(BrowserError::NoSuchElement(selector.to_string()));
        }
        Ok(parsed["value"].as_str().map(str::to_string))
    }

    fn page_source(&self) -> Result<String, BrowserError> {
        self.tab
            .get_content()
            .map_err(|e| BrowserError::Other(format!("Failed to get page content: {}", e)))
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(true) {
            debug!(error = %e, "Tab already gone at shutdown");
        }
        debug!("Browser session closed");
    }
}
