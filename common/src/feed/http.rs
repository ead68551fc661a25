// HTTP feed source

use crate::errors::FeedError;
use crate::feed::{parse_feed, FeedSource};
use crate::models::Feed;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = concat!("feed-relay/", env!("CARGO_PKG_VERSION"));

/// HttpFeedSource downloads the feed document with a plain GET
pub struct HttpFeedSource {
    client: Client,
    url: String,
}

impl HttpFeedSource {
    /// Create a new HttpFeedSource with the specified timeout
    pub fn new(url: impl Into<String>, timeout_seconds: u64) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FeedError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    #[tracing::instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Feed, FeedError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        tracing::debug!(bytes = body.len(), "Feed document downloaded");

        let feed = parse_feed(&body)?;
        tracing::debug!(items = feed.items.len(), "Feed parsed");
        Ok(feed)
    }
}
