// Discord REST notifier

use crate::config::DiscordConfig;
use crate::errors::NotifyError;
use crate::models::{ChannelInfo, OutgoingMessage};
use crate::notifier::Notifier;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

/// DiscordNotifier posts to one channel through the bot REST API
pub struct DiscordNotifier {
    client: Client,
    api_base_url: String,
    token: String,
    channel_id: String,
}

impl DiscordNotifier {
    /// Create a new DiscordNotifier with the specified timeout
    pub fn new(config: &DiscordConfig, timeout_seconds: u64) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| NotifyError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            channel_id: config.channel_id.clone(),
        })
    }

    fn channel_url(&self) -> String {
        format!("{}/channels/{}", self.api_base_url, self.channel_id)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(
            reqwest::header::AUTHORIZATION,
            format!("Bot {}", self.token),
        )
    }

    async fn check_status(response: Response) -> Result<Response, NotifyError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    #[tracing::instrument(skip(self), fields(channel_id = %self.channel_id))]
    async fn resolve_channel(&self) -> Result<ChannelInfo, NotifyError> {
        let response = self
            .authorize(self.client.get(self.channel_url()))
            .send()
            .await?;

        let response = match Self::check_status(response).await {
            Ok(response) => response,
            // Unknown channel or no access: nothing to post to
            Err(NotifyError::Rejected { status: 403 | 404, body }) => {
                tracing::debug!(body = %body, "Channel lookup rejected");
                return Err(NotifyError::ChannelUnavailable);
            }
            Err(e) => return Err(e),
        };

        response
            .json::<ChannelInfo>()
            .await
            .map_err(|e| NotifyError::InvalidResponse(e.to_string()))
    }

    #[tracing::instrument(skip(self, message), fields(channel_id = %self.channel_id))]
    async fn send(&self, message: &OutgoingMessage) -> Result<(), NotifyError> {
        let url = format!("{}/messages", self.channel_url());
        let response = self
            .authorize(self.client.post(url))
            .json(message)
            .send()
            .await?;

        Self::check_status(response).await?;
        tracing::debug!("Message accepted by chat API");
        Ok(())
    }
}
