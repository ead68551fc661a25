// Configuration management with layered configuration (defaults, file, env)

use crate::errors::ValidationError;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token, sent as `Authorization: Bot <token>`
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub channel_id: String,
    /// Role mentioned at the start of every notification
    #[serde(default)]
    pub role_id: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub message_style: MessageStyle,
    /// First line of every notification
    #[serde(default = "default_headline")]
    pub headline: String,
}

/// Shape of the outbound notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStyle {
    /// Text content plus one rich embed
    #[default]
    Embed,
    /// Text content with the item link only
    Plain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    /// Template for the public item URL; `{id}` is replaced by the item id
    #[serde(default = "default_item_url_template")]
    pub item_url_template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_enabled")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default)]
    pub tracing_endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

fn default_api_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_headline() -> String {
    crate::message::DEFAULT_HEADLINE.to_string()
}

/// Upper bounds accepted by `validate`
pub const MAX_POLL_INTERVAL_SECONDS: u64 = 7 * 24 * 60 * 60;
pub const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 60 * 60;

fn default_poll_interval_seconds() -> u64 {
    300
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_item_url_template() -> String {
    "https://www.youtube.com/watch?v={id}".to_string()
}

fn default_server_enabled() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel_id: String::new(),
            role_id: None,
            api_base_url: default_api_base_url(),
            message_style: MessageStyle::default(),
            headline: default_headline(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            poll_interval_seconds: default_poll_interval_seconds(),
            request_timeout_seconds: default_request_timeout_seconds(),
            item_url_template: default_item_url_template(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: default_server_enabled(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            tracing_endpoint: None,
        }
    }
}

/// Flat environment variables accepted on top of the `APP__` layer.
/// Later entries win when two map to the same key.
const FLAT_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("DISCORD_TOKEN", "discord.token"),
    ("DISCORD_CHANNEL_ID", "discord.channel_id"),
    ("DISCORD_ROLE_ID", "discord.role_id"),
    ("FEED_URL", "feed.url"),
    ("YOUTUBE_RSS_URL", "feed.url"),
    ("PORT", "server.port"),
];

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let overrides = FLAT_ENV_OVERRIDES
            .iter()
            .filter_map(|(var, key)| {
                std::env::var(var)
                    .ok()
                    .filter(|value| !value.trim().is_empty())
                    .map(|value| (*key, value))
            })
            .collect::<Vec<_>>();

        Self::load_with_overrides(config_dir, &overrides)
    }

    /// Load configuration, applying explicit key overrides last
    pub fn load_with_overrides<P: AsRef<Path>>(
        config_dir: P,
        overrides: &[(&str, String)],
    ) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let mut builder = Config::builder()
            // Start with default configuration
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        for (key, value) in overrides {
            builder = builder.set_override(*key, value.as_str())?;
        }

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.discord.token.trim().is_empty() {
            return Err(ValidationError::MissingField("discord.token".to_string()));
        }
        if self.discord.channel_id.trim().is_empty() {
            return Err(ValidationError::MissingField(
                "discord.channel_id".to_string(),
            ));
        }
        if self.discord.api_base_url.trim().is_empty() {
            return Err(ValidationError::MissingField(
                "discord.api_base_url".to_string(),
            ));
        }
        if matches!(&self.discord.role_id, Some(role) if role.trim().is_empty()) {
            return Err(ValidationError::InvalidFieldValue {
                field: "discord.role_id".to_string(),
                reason: "must not be blank when set".to_string(),
            });
        }

        if self.feed.url.trim().is_empty() {
            return Err(ValidationError::MissingField("feed.url".to_string()));
        }
        if !(1..=MAX_POLL_INTERVAL_SECONDS).contains(&self.feed.poll_interval_seconds) {
            return Err(ValidationError::InvalidFieldValue {
                field: "feed.poll_interval_seconds".to_string(),
                reason: format!("must be between 1 and {}", MAX_POLL_INTERVAL_SECONDS),
            });
        }
        if !(1..=MAX_REQUEST_TIMEOUT_SECONDS).contains(&self.feed.request_timeout_seconds) {
            return Err(ValidationError::InvalidFieldValue {
                field: "feed.request_timeout_seconds".to_string(),
                reason: format!("must be between 1 and {}", MAX_REQUEST_TIMEOUT_SECONDS),
            });
        }
        if !self.feed.item_url_template.contains("{id}") {
            return Err(ValidationError::InvalidFieldValue {
                field: "feed.item_url_template".to_string(),
                reason: "must contain the {id} placeholder".to_string(),
            });
        }

        if self.server.enabled && self.server.port == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "server.port".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.discord.token = "token".to_string();
        settings.discord.channel_id = "123456789012345678".to_string();
        settings.feed.url = "https://www.youtube.com/feeds/videos.xml?channel_id=UC123".to_string();
        settings
    }

    #[test]
    fn test_default_settings_need_credentials() {
        let settings = Settings::default();
        assert!(matches!(
            settings.validate(),
            Err(ValidationError::MissingField(field)) if field == "discord.token"
        ));
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.feed.poll_interval_seconds, 300);
        assert_eq!(settings.discord.message_style, MessageStyle::Embed);
        assert!(settings.server.enabled);
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_validation_catches_empty_feed_url() {
        let mut settings = valid_settings();
        settings.feed.url = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_interval() {
        let mut settings = valid_settings();
        settings.feed.poll_interval_seconds = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_oversized_interval_and_timeout() {
        let mut settings = valid_settings();
        settings.feed.poll_interval_seconds = u64::MAX;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("feed.poll_interval_seconds"));

        settings.feed.poll_interval_seconds = MAX_POLL_INTERVAL_SECONDS;
        assert!(settings.validate().is_ok());

        settings.feed.request_timeout_seconds = u64::MAX;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("feed.request_timeout_seconds"));
    }

    #[test]
    fn test_validation_catches_template_without_placeholder() {
        let mut settings = valid_settings();
        settings.feed.item_url_template = "https://example.com/watch".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_ignores_port_when_server_disabled() {
        let mut settings = valid_settings();
        settings.server.port = 0;
        assert!(settings.validate().is_err());
        settings.server.enabled = false;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("default.toml")).unwrap();
        writeln!(
            file,
            r#"
[discord]
token = "from-file"
channel_id = "42"
message_style = "plain"

[feed]
url = "https://example.com/feed.xml"
poll_interval_seconds = 60
"#
        )
        .unwrap();

        let overrides = vec![("discord.token", "from-override".to_string())];
        let settings = Settings::load_with_overrides(dir.path(), &overrides).unwrap();

        assert_eq!(settings.discord.token, "from-override");
        assert_eq!(settings.discord.channel_id, "42");
        assert_eq!(settings.discord.message_style, MessageStyle::Plain);
        assert_eq!(settings.feed.poll_interval_seconds, 60);
        assert_eq!(settings.feed.request_timeout_seconds, 30);
        assert_eq!(settings.server.port, 3000);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_override_port_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = vec![("server.port", "8081".to_string())];
        let settings = Settings::load_with_overrides(dir.path(), &overrides).unwrap();
        assert_eq!(settings.server.port, 8081);
    }
}
