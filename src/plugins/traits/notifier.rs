use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::utils::error::AppError;

/// A webhook service a message can be delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Slack,
    Discord,
}

impl NotificationChannel {
    /// JSON key that carries the message text in the webhook payload.
    pub fn payload_key(self) -> &'static str {
        match self {
            NotificationChannel::Slack => "text",
            NotificationChannel::Discord => "content",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationChannel::Slack => write!(f, "Slack"),
            NotificationChannel::Discord => write!(f, "Discord"),
        }
    }
}

/// Delivers a plain-text message to one channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    fn channel(&self) -> NotificationChannel;

    /// Sends `message` once. No retries.
    async fn notify(&self, message: &str) -> Result<(), AppError>;
}
