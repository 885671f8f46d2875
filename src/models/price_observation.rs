use std::collections::BTreeMap;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Last observed price of one rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceObservation {
    pub last_price: f64,
    /// The rule URL at the time of the observation.
    pub url: String,
    /// Seconds since the Unix epoch.
    pub updated_at: i64,
}

/// Rule name → last observation. Serialized as the state file's top-level object.
pub type PriceState = BTreeMap<String, PriceObservation>;

impl PriceObservation {
    pub fn new(last_price: f64, url: impl Into<String>, updated_at: i64) -> Self {
        Self {
            last_price,
            url: url.into(),
            updated_at,
        }
    }

    /// An observation stamped with the current time.
    pub fn observed_now(last_price: f64, url: impl Into<String>) -> Self {
        Self::new(last_price, url, Utc::now().timestamp())
    }

    pub fn updated_at_local(&self) -> Option<DateTime<Local>> {
        Local.timestamp_opt(self.updated_at, 0).single()
    }
}
