// Bootstrap utilities for binary initialization

use crate::config::Settings;
use crate::feed::{FeedSource, HttpFeedSource};
use crate::message::MessageFormatter;
use crate::notifier::{DiscordNotifier, Notifier};
use crate::watcher::{WatcherConfig, WatcherEngine};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Load `.env`, then layered settings, then validate them
///
/// # Errors
/// Returns error if configuration cannot be read or is invalid
pub fn load_settings() -> Result<Settings> {
    // A missing .env file is normal outside development
    let _ = dotenvy::dotenv();

    let settings = Settings::load().context("Failed to load configuration")?;
    settings.validate().context("Invalid configuration")?;
    Ok(settings)
}

/// Initialize the HTTP feed source
///
/// # Errors
/// Returns error if the HTTP client cannot be built
#[tracing::instrument(skip(settings))]
pub fn init_feed_source(settings: &Settings) -> Result<Arc<dyn FeedSource>> {
    let source = HttpFeedSource::new(&settings.feed.url, settings.feed.request_timeout_seconds)
        .context("Failed to initialize feed source")?;

    info!(url = %source.url(), "Feed source initialized");
    Ok(Arc::new(source))
}

/// Initialize the chat notifier
///
/// # Errors
/// Returns error if the HTTP client cannot be built
#[tracing::instrument(skip(settings))]
pub fn init_notifier(settings: &Settings) -> Result<Arc<dyn Notifier>> {
    let notifier =
        DiscordNotifier::new(&settings.discord, settings.feed.request_timeout_seconds)
            .context("Failed to initialize chat notifier")?;

    info!(
        channel_id = %settings.discord.channel_id,
        role_mention = settings.discord.role_id.is_some(),
        message_style = ?settings.discord.message_style,
        "Chat notifier initialized"
    );
    Ok(Arc::new(notifier))
}

/// Wire feed source, notifier and formatter into a watcher engine
///
/// # Errors
/// Returns error if any component fails to initialize
pub fn init_watcher(settings: &Settings) -> Result<Arc<WatcherEngine>> {
    let source = init_feed_source(settings)?;
    let notifier = init_notifier(settings)?;
    let formatter = MessageFormatter::from_settings(settings);

    let config = WatcherConfig {
        poll_interval_seconds: settings.feed.poll_interval_seconds,
    };

    Ok(Arc::new(WatcherEngine::new(
        config, source, notifier, formatter,
    )))
}
