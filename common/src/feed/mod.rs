// Feed module: where new items come from

pub mod http;
pub mod parser;

pub use http::HttpFeedSource;
pub use parser::parse_feed;

use crate::errors::FeedError;
use crate::models::Feed;
use async_trait::async_trait;

/// FeedSource trait defines the interface for retrieving the current feed
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse the feed; items are ordered newest first
    async fn fetch(&self) -> Result<Feed, FeedError>;
}
