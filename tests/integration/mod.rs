// Integration tests for the price watcher
// These tests drive a full cycle and the dashboard against a fake browser

pub mod api_tests;
pub mod web_interface_tests;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use price_watcher::{
    browser::{BrowserError, BrowserLauncher, BrowserSession},
    config::NotificationsConfig,
    core::{CycleRunner, RuleStore, StateStore},
    fetcher::PageFetcher,
    models::{PriceObservation, PriceState, ProductRule},
    plugins::NotificationDispatcher,
    web::{create_router, AppState},
    AppError,
};
use scraper::{Html, Selector};
use tempfile::TempDir;
use tower::ServiceExt;

/// Serves canned HTML per URL.
#[derive(Clone, Default)]
pub struct FakeLauncher {
    pages: Arc<HashMap<String, String>>,
    pub launches: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    fail_launch: bool,
    navigate_delay: Duration,
}

impl FakeLauncher {
    pub fn new(pages: &[(&str, String)]) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.clone()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::default()
        }
    }

    /// Every navigation blocks the calling thread for `delay`.
    pub fn with_navigate_delay(mut self, delay: Duration) -> Self {
        self.navigate_delay = delay;
        self
    }

    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl BrowserLauncher for FakeLauncher {
    type Session = FakeSession;

    fn launch(&self) -> Result<FakeSession, AppError> {
        if self.fail_launch {
            return Err(AppError::Browser("Failed to launch browser: no chrome binary".into()));
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            pages: Arc::clone(&self.pages),
            current: Mutex::new(None),
            closed: Arc::clone(&self.closed),
            navigate_delay: self.navigate_delay,
        })
    }
}

pub struct FakeSession {
    pages: Arc<HashMap<String, String>>,
    current: Mutex<Option<String>>,
    closed: Arc<AtomicUsize>,
    navigate_delay: Duration,
}

impl FakeSession {
    fn document(&self) -> Html {
        let current = self.current.lock().unwrap();
        Html::parse_document(current.as_deref().unwrap_or(""))
    }

    fn parse(selector: &str) -> Result<Selector, BrowserError> {
        Selector::parse(selector).map_err(|e| BrowserError::Other(format!("{:?}", e)))
    }
}

impl BrowserSession for FakeSession {
    fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        std::thread::sleep(self.navigate_delay);
        let html = self
            .pages
            .get(url)
            .ok_or_else(|| BrowserError::Other(format!("net::ERR_NAME_NOT_RESOLVED at {}", url)))?;
        *self.current.lock().unwrap() = Some(html.clone());
        Ok(())
    }

    fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        let selector = Self::parse(selector)?;
        if self.document().select(&selector).next().is_some() {
            Ok(())
        } else {
            Err(BrowserError::Timeout(timeout))
        }
    }

    fn read_value(
        &self,
        selector: &str,
        attribute: Option<&str>,
    ) -> Result<Option<String>, BrowserError> {
        let parsed = Self::parse(selector)?;
        let document = self.document();
        let element = document
            .select(&parsed)
            .next()
            .ok_or_else(|| BrowserError::NoSuchElement(selector.to_string()))?;
        Ok(match attribute {
            Some(name) => element.value().attr(name).map(str::to_string),
            None => Some(element.text().collect()),
        })
    }

    fn page_source(&self) -> Result<String, BrowserError> {
        Ok(self.current.lock().unwrap().clone().unwrap_or_default())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Rule and state files in a throwaway directory.
pub struct TestEnv {
    pub dir: TempDir,
    pub rules: RuleStore,
    pub state: StateStore,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let rules = RuleStore::new(dir.path().join("products.json"));
        let state = StateStore::new(dir.path().join("state.json"));
        Self { dir, rules, state }
    }

    pub fn with_rules(rules: &[ProductRule]) -> Self {
        let env = Self::new();
        env.rules.save_rules(rules).expect("save rules");
        env
    }

    pub fn state_path(&self) -> PathBuf {
        self.state.path().to_path_buf()
    }

    pub fn seed_state(&self, entries: &[(&str, f64, &str)]) {
        let mut state = PriceState::new();
        for (name, price, url) in entries {
            state.insert(name.to_string(), PriceObservation::new(*price, *url, 1_700_000_000));
        }
        self.state.save_state(&state).expect("seed state");
    }

    pub fn runner(
        &self,
        launcher: FakeLauncher,
        notifications: &NotificationsConfig,
    ) -> CycleRunner<FakeLauncher> {
        CycleRunner::new(
            self.rules.clone(),
            self.state.clone(),
            PageFetcher::with_timeouts(Duration::from_millis(100), Duration::from_millis(5)),
            NotificationDispatcher::from_config(notifications).expect("dispatcher"),
            launcher,
        )
    }

    pub fn router(&self, launcher: FakeLauncher) -> Router {
        let runner = Arc::new(self.runner(launcher, &NotificationsConfig::default()));
        create_router(AppState::new(self.rules.clone(), self.state.clone(), runner))
    }
}

pub fn lens() -> ProductRule {
    ProductRule::new("Lens", "https://shop.example/lens", ".price").with_target_price(50000.0)
}

pub fn camera() -> ProductRule {
    ProductRule::new("Camera", "https://shop.example/camera", "meta[itemprop=price]")
        .with_attribute("content")
        .with_wait_selector("#product")
}

pub fn lens_page(price: &str) -> String {
    format!(r#"<html><body><div class="price">{}</div></body></html>"#, price)
}

pub fn camera_page(price: &str) -> String {
    format!(
        r#"<html><head><meta itemprop="price" content="{}"></head><body><div id="product">Camera</div></body></html>"#,
        price
    )
}

/// Sends one request through the router.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    form: Option<&str>,
) -> anyhow::Result<Response> {
    let mut request = Request::builder().method(method).uri(uri);
    if form.is_some() {
        request = request.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    }
    let request = request.body(Body::from(form.unwrap_or_default().to_string()))?;
    Ok(app.clone().oneshot(request).await?)
}

pub async fn body_text(response: Response) -> anyhow::Result<String> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

pub async fn body_json(response: Response) -> anyhow::Result<serde_json::Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
