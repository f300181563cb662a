use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

/// Discord refuses messages carrying more embeds than this.
pub const DISCORD_MAX_EMBEDS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub scraper: ScraperConfig,
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub snapshot_path: String,
    pub sources_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub request_timeout: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub currency_symbol: String,
    pub discord: DiscordConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub api_base: String,
    pub channel_id: Option<String>,
    pub bot_token: Option<String>,
    pub content: Option<String>,
    pub max_embeds_per_message: usize,
    /// Seconds allowed for each message post.
    pub request_timeout: u64,
}

impl DiscordConfig {
    /// Channel and token, if both are set to something non-blank.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let channel = self.channel_id.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let token = self.bot_token.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((channel, token))
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Self::builder_with_defaults()?
            .add_source(File::with_name("config/default").required(false))
            // Add environment-specific config
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables, e.g. DISCWATCH__SCRAPER__REQUEST_TIMEOUT
            .add_source(Environment::with_prefix("DISCWATCH").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        // Plain variable names used by existing cron deployments
        if config.notifications.discord.channel_id.is_none() {
            config.notifications.discord.channel_id = env::var("DISCORD_CHANNEL").ok();
        }
        if config.notifications.discord.bot_token.is_none() {
            config.notifications.discord.bot_token = env::var("DISCORD_KEY").ok();
        }

        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults, before any file or environment layer.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder_with_defaults()?.build()?.try_deserialize()
    }

    fn builder_with_defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("storage.snapshot_path", "discs.json")?
            .set_default("storage.sources_path", "config/sources.toml")?
            .set_default("scraper.request_timeout", 30)?
            .set_default("scraper.user_agent", concat!("disc-watcher/", env!("CARGO_PKG_VERSION")))?
            .set_default("notifications.currency_symbol", "$")?
            .set_default("notifications.discord.api_base", "https://discord.com/api/v9")?
            .set_default("notifications.discord.content", "NEW DISCS IN STOCK")?
            .set_default("notifications.discord.max_embeds_per_message", DISCORD_MAX_EMBEDS as i64)?
            .set_default("notifications.discord.request_timeout", 30)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.snapshot_path.trim().is_empty() {
            return Err(ConfigError::Message("Storage snapshot_path must not be empty".into()));
        }

        if self.scraper.request_timeout == 0 {
            return Err(ConfigError::Message("Scraper request_timeout must be greater than 0".into()));
        }

        if self.scraper.user_agent.trim().is_empty() {
            return Err(ConfigError::Message("Scraper user_agent must not be empty".into()));
        }

        if Url::parse(&self.notifications.discord.api_base).is_err() {
            return Err(ConfigError::Message("Invalid Discord api_base URL format".into()));
        }

        if self.notifications.discord.request_timeout == 0 {
            return Err(ConfigError::Message("Discord request_timeout must be greater than 0".into()));
        }

        let max_embeds = self.notifications.discord.max_embeds_per_message;
        if max_embeds == 0 || max_embeds > DISCORD_MAX_EMBEDS {
            return Err(ConfigError::Message(format!(
                "Discord max_embeds_per_message must be between 1 and {}",
                DISCORD_MAX_EMBEDS
            )));
        }

        Ok(())
    }
}
