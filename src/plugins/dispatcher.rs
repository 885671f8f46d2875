use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use super::notifiers::{DiscordNotifier, SlackNotifier};
use super::traits::{NotificationChannel, NotifierPlugin};
use crate::config::NotificationsConfig;
use crate::utils::error::AppError;

pub type NotifierPluginBox = Box<dyn NotifierPlugin>;

/// Per-channel result of one [`NotificationDispatcher::dispatch`] call.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub delivered: Vec<NotificationChannel>,
    pub failed: Vec<(NotificationChannel, AppError)>,
}

impl DispatchReport {
    /// True when at least one channel accepted the message.
    pub fn any_delivered(&self) -> bool {
        !self.delivered.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Sends each message to every configured webhook channel.
pub struct NotificationDispatcher {
    notifiers: Vec<NotifierPluginBox>,
}

impl NotificationDispatcher {
    pub fn new(notifiers: Vec<NotifierPluginBox>) -> Self {
        Self { notifiers }
    }

    /// Registers Slack and Discord for each configured webhook URL, sharing
    /// one HTTP client.
    pub fn from_config(config: &NotificationsConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let mut notifiers: Vec<NotifierPluginBox> = Vec::new();
        if let Some(url) = config.slack_webhook_url.as_deref().filter(|u| !u.is_empty()) {
            notifiers.push(Box::new(SlackNotifier::new(client.clone(), url)));
        }
        if let Some(url) = config.discord_webhook_url.as_deref().filter(|u| !u.is_empty()) {
            notifiers.push(Box::new(DiscordNotifier::new(client.clone(), url)));
        }
        Ok(Self::new(notifiers))
    }

    pub fn channels(&self) -> Vec<NotificationChannel> {
        self.notifiers.iter().map(|n| n.channel()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Tries every channel once. Failures are logged and reported, never returned.
    pub async fn dispatch(&self, message: &str) -> DispatchReport {
        let mut report = DispatchReport::default();
        if self.notifiers.is_empty() {
            warn!("No webhook configured; notification not sent");
            return report;
        }

        for notifier in &self.notifiers {
            let channel = notifier.channel();
            match notifier.notify(message).await {
                Ok(()) => {
                    info!(channel = %channel, "Notification sent");
                    report.delivered.push(channel);
                }
                Err(e) => {
                    warn!(channel = %channel, error = %e, "Notification failed");
                    report.failed.push((channel, e));
                }
            }
        }
        report
    }
}
