use serde::{Deserialize, Serialize};
use url::Url;

use crate::utils::error::AppError;

/// One watched product, as stored in the rules file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRule {
    pub name: String,
    pub url: String,
    /// CSS selector of the element holding the price.
    pub selector: String,
    /// Element to wait for before reading `selector`. Falls back to `selector`.
    #[serde(default)]
    pub wait_selector: Option<String>,
    /// Attribute to read instead of the element's text content.
    #[serde(default)]
    pub attribute: Option<String>,
    #[serde(default)]
    pub target_price: Option<f64>,
}

/// On-disk shape of the rules file: `{"products": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesFile {
    #[serde(default)]
    pub products: Vec<ProductRule>,
}

impl ProductRule {
    pub fn new(name: impl Into<String>, url: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            selector: selector.into(),
            wait_selector: None,
            attribute: None,
            target_price: None,
        }
    }

    pub fn with_wait_selector(mut self, wait_selector: impl Into<String>) -> Self {
        self.wait_selector = Some(wait_selector.into());
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn with_target_price(mut self, target_price: f64) -> Self {
        self.target_price = Some(target_price);
        self
    }

    /// The selector the fetcher waits on before polling for the price.
    /// A blank `wait_selector` counts as unset.
    pub fn effective_wait_selector(&self) -> &str {
        self.wait_selector
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.selector)
    }

    /// The attribute to read, if any. A blank value means "read text".
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Checks the fields the settings editor requires before saving.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Product name is required".into()));
        }
        if self.selector.trim().is_empty() {
            return Err(AppError::Validation("Price selector is required".into()));
        }
        if self.url.trim().is_empty() {
            return Err(AppError::Validation("Product URL is required".into()));
        }
        if Url::parse(&self.url).is_err() {
            return Err(AppError::Validation(format!("Invalid URL: {}", self.url)));
        }
        if let Some(target) = self.target_price {
            if !target.is_finite() || target < 0.0 {
                return Err(AppError::Validation(format!(
                    "Target price must be a non-negative number: {}",
                    target
                )));
            }
        }
        Ok(())
    }
}
