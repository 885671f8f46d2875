pub mod discord;
pub mod slack;

pub use discord::DiscordNotifier;
pub use slack::SlackNotifier;

use reqwest::Client;
use serde_json::json;

use crate::plugins::traits::NotificationChannel;
use crate::utils::error::AppError;

/// POSTs `{"<payload key>": message}` to a webhook. Any non-2xx status is a
/// delivery failure.
pub(crate) async fn post_webhook(
    client: &Client,
    channel: NotificationChannel,
    webhook_url: &str,
    message: &str,
) -> Result<(), AppError> {
    let mut payload = serde_json::Map::new();
    payload.insert(channel.payload_key().to_string(), json!(message));

    let delivery_error = |message: String| AppError::NotificationDelivery {
        channel: channel.to_string(),
        message,
    };

    client
        .post(webhook_url)
        .json(&payload)
        .send()
        .await
        .map_err(|e| delivery_error(e.to_string()))?
        .error_for_status()
        .map_err(|e| delivery_error(e.to_string()))?;
    Ok(())
}
