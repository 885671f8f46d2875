use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::utils::error::AppError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub scraper: ScraperConfig,
    pub notifications: NotificationsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub products_file: PathBuf,
    pub state_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            products_file: PathBuf::from("products.json"),
            state_file: PathBuf::from("state.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub chrome_binary: Option<String>,
    /// Kept for existing `.env` files; the DevTools backend does not need it.
    pub chromedriver_path: Option<String>,
    pub user_agent: String,
    pub wait_timeout_secs: u64,
    pub poll_interval_ms: u64,
    /// How long an idle browser may live before headless_chrome kills it.
    pub idle_timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            chrome_binary: None,
            chromedriver_path: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            wait_timeout_secs: 20,
            poll_interval_ms: 500,
            idle_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub slack_webhook_url: Option<String>,
    pub discord_webhook_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url: None,
            discord_webhook_url: None,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives. `RUST_LOG` wins when set.
    pub filter: String,
    /// When set, logs are also written to a daily rolling file here.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "price_watcher=info".to_string(),
            directory: None,
        }
    }
}

impl AppConfig {
    /// Loads defaults, `config/default`, then `config_file` (or the optional
    /// `config/local`), then `PRICE_WATCHER__SECTION__KEY` variables, then the
    /// legacy variables.
    pub fn load(config_file: Option<&Path>) -> Result<Self, AppError> {
        let mut config = Self::build(config_file, None)?;
        config.apply_legacy_env(|key| env::var(key).ok());
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    fn build(
        config_file: Option<&Path>,
        env_source: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder =
            Config::builder().add_source(File::with_name("config/default").required(false));

        builder = match config_file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("config/local").required(false)),
        };

        builder
            .add_source(
                Environment::with_prefix("PRICE_WATCHER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(env_source),
            )
            .build()?
            .try_deserialize()
    }

    /// Fills values still unset from `CHROME_BINARY`, `CHROMEDRIVER_PATH`,
    /// `SLACK_WEBHOOK_URL` and `DISCORD_WEBHOOK_URL`.
    pub fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn fill(slot: &mut Option<String>, value: Option<String>) {
            let unset = slot.as_deref().is_none_or(|s| s.trim().is_empty());
            if unset {
                if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                    *slot = Some(value);
                }
            }
        }

        fill(&mut self.scraper.chrome_binary, lookup("CHROME_BINARY"));
        fill(&mut self.scraper.chromedriver_path, lookup("CHROMEDRIVER_PATH"));
        fill(&mut self.notifications.slack_webhook_url, lookup("SLACK_WEBHOOK_URL"));
        fill(&mut self.notifications.discord_webhook_url, lookup("DISCORD_WEBHOOK_URL"));
    }

    /// Blank optional strings become `None`.
    pub fn normalize(&mut self) {
        for slot in [
            &mut self.scraper.chrome_binary,
            &mut self.scraper.chromedriver_path,
            &mut self.notifications.slack_webhook_url,
            &mut self.notifications.discord_webhook_url,
        ] {
            if let Some(value) = slot.take() {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    *slot = Some(trimmed.to_string());
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port must be greater than 0".into()));
        }

        if self.scraper.wait_timeout_secs == 0 {
            return Err(ConfigError::Message("scraper.wait_timeout_secs must be greater than 0".into()));
        }

        if self.scraper.poll_interval_ms == 0 {
            return Err(ConfigError::Message("scraper.poll_interval_ms must be greater than 0".into()));
        }

        if self.notifications.timeout_secs == 0 {
            return Err(ConfigError::Message("notifications.timeout_secs must be greater than 0".into()));
        }

        for (key, url) in [
            ("slack_webhook_url", &self.notifications.slack_webhook_url),
            ("discord_webhook_url", &self.notifications.discord_webhook_url),
        ] {
            if let Some(url) = url {
                if Url::parse(url).is_err() {
                    return Err(ConfigError::Message(format!("Invalid URL in notifications.{}", key)));
                }
            }
        }

        Ok(())
    }
}
