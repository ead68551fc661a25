// Notifier module: delivery of formatted messages to the chat channel

pub mod discord;

pub use discord::DiscordNotifier;

use crate::errors::NotifyError;
use crate::models::{ChannelInfo, OutgoingMessage};
use async_trait::async_trait;

/// Notifier trait for the single downstream chat channel
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Look up the configured channel, failing when it is missing or not accessible
    async fn resolve_channel(&self) -> Result<ChannelInfo, NotifyError>;

    /// Post one message to the channel
    async fn send(&self, message: &OutgoingMessage) -> Result<(), NotifyError>;
}
