use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::post_webhook;
use crate::plugins::traits::{NotificationChannel, NotifierPlugin};
use crate::utils::error::AppError;

/// Slack incoming webhook. Payload: `{"text": message}`.
pub struct SlackNotifier {
    client: Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(client: Client, webhook_url: impl Into<String>) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
        }
    }
}

#[async_trait]
impl NotifierPlugin for SlackNotifier {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Slack
    }

    async fn notify(&self, message: &str) -> Result<(), AppError> {
        post_webhook(&self.client, self.channel(), &self.webhook_url, message).await?;
        debug!(channel = %self.channel(), "Webhook accepted");
        Ok(())
    }
}
