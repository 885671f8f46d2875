use std::fmt;

use thiserror::Error;

/// Which of the two fetch waits gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPhase {
    /// Waiting for the wait selector to exist in the DOM.
    Presence,
    /// Polling the price selector until it holds a non-empty value.
    PriceText,
}

impl fmt::Display for WaitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitPhase::Presence => write!(f, "wait selector"),
            WaitPhase::PriceText => write!(f, "price text"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration file not found: {path}. Copy {template} to {path} and add your products.")]
    MissingConfiguration { path: String, template: String },

    #[error("Timed out waiting for {phase}: '{selector}' ({rule})")]
    WaitTimeout {
        phase: WaitPhase,
        selector: String,
        rule: String,
    },

    #[error("Failed to extract a price from '{raw}' ({rule})")]
    ExtractionFailure { raw: String, rule: String },

    #[error("Cannot build a target price message without target_price: {rule}")]
    ConfigurationError { rule: String },

    #[error("{channel} notification failed: {message}")]
    NotificationDelivery { channel: String, message: String },

    #[error("Price element not found: {selector} ({rule})")]
    ElementNotFound { selector: String, rule: String },

    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("A product named '{0}' already exists")]
    DuplicateName(String),

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Settings error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
