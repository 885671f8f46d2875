use std::time::Duration;

use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::browser::{BrowserError, BrowserSession};
use crate::config::ScraperConfig;
use crate::core::price_extractor::extract_price;
use crate::models::ProductRule;
use crate::utils::error::{AppError, WaitPhase};

/// Renders a rule's page and reads its current price.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    wait_timeout: Duration,
    poll_interval: Duration,
}

impl PageFetcher {
    pub fn new(config: &ScraperConfig) -> Self {
        Self::with_timeouts(
            Duration::from_secs(config.wait_timeout_secs),
            Duration::from_millis(config.poll_interval_ms),
        )
    }

    pub fn with_timeouts(wait_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            wait_timeout,
            poll_interval,
        }
    }

    pub fn fetch_price(
        &self,
        rule: &ProductRule,
        session: &dyn BrowserSession,
    ) -> Result<f64, AppError> {
        debug!(product = %rule.name, url = %rule.url, "Fetching page");
        session
            .navigate(&rule.url)
            .map_err(|e| AppError::Browser(format!("{} ({})", e, rule.name)))?;

        let wait_selector = rule.effective_wait_selector();
        match session.wait_for_element(wait_selector, self.wait_timeout) {
            Ok(()) => {}
            Err(BrowserError::Timeout(_)) => {
                return Err(AppError::WaitTimeout {
                    phase: WaitPhase::Presence,
                    selector: wait_selector.to_string(),
                    rule: rule.name.clone(),
                });
            }
            Err(e) => return Err(AppError::Browser(format!("{} ({})", e, rule.name))),
        }

        // Only a missing or stale element means "not rendered yet"; any other
        // browser error ends the poll.
        let attribute = rule.attribute();
        let mut failure: Option<BrowserError> = None;
        let ready = session.wait_until(self.wait_timeout, self.poll_interval, &mut || {
            match session.read_value(&rule.selector, attribute) {
                Ok(value) => value.is_some_and(|v| !v.trim().is_empty()),
                Err(BrowserError::NoSuchElement(_) | BrowserError::StaleElement(_)) => false,
                Err(e) => {
                    warn!(product = %rule.name, selector = %rule.selector, error = %e, "Price read failed");
                    failure = Some(e);
                    true
                }
            }
        });
        if let Some(e) = failure {
            return Err(AppError::Browser(format!("{} ({})", e, rule.name)));
        }
        if !ready {
            return Err(AppError::WaitTimeout {
                phase: WaitPhase::PriceText,
                selector: rule.selector.clone(),
                rule: rule.name.clone(),
            });
        }

        let html = session
            .page_source()
            .map_err(|e| AppError::Browser(format!("{} ({})", e, rule.name)))?;
        let raw = read_from_document(&html, rule)?;

        match extract_price(&raw) {
            Some(price) => {
                debug!(product = %rule.name, price, "Extracted price");
                Ok(price)
            }
            None => Err(AppError::ExtractionFailure {
                raw,
                rule: rule.name.clone(),
            }),
        }
    }
}

/// Reads the rule's price node from a rendered document: the attribute value
/// as-is, or every text node trimmed and joined.
fn read_from_document(html: &str, rule: &ProductRule) -> Result<String, AppError> {
    let selector = Selector::parse(&rule.selector).map_err(|e| AppError::InvalidSelector {
        selector: rule.selector.clone(),
        message: format!("{:?}", e),
    })?;

    let document = Html::parse_document(html);
    let element = document
        .select(&selector)
        .next()
        .ok_or_else(|| AppError::ElementNotFound {
            selector: rule.selector.clone(),
            rule: rule.name.clone(),
        })?;

    match rule.attribute() {
        Some(name) => Ok(element.value().attr(name).unwrap_or_default().to_string()),
        None => Ok(element.text().map(str::trim).collect()),
    }
}
