// Data models for feed items and outbound chat messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A parsed content feed; items keep document order, head first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub title: Option<String>,
    pub items: Vec<FeedItem>,
}

impl Feed {
    /// The most recent item, i.e. the first one in the document
    pub fn head(&self) -> Option<&FeedItem> {
        self.items.first()
    }
}

/// One entry of the feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    /// Plain-text description snippet
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl FeedItem {
    /// Short identifier used in public URLs: the last `:` segment of the id
    ///
    /// `yt:video:dQw4w9WgXcQ` becomes `dQw4w9WgXcQ`; ids without a colon are
    /// returned unchanged.
    pub fn short_id(&self) -> &str {
        self.id.rsplit(':').next().unwrap_or(&self.id)
    }

    /// Public URL of the item
    ///
    /// Namespaced ids (`yt:video:<id>`) are substituted into `template`.
    /// Ids that are already absolute URLs, or bare ids such as RSS guids,
    /// use the item's own link instead; the template is the last resort.
    pub fn derived_url(&self, template: &str) -> String {
        if is_absolute_url(&self.id) {
            return self.link.clone().unwrap_or_else(|| self.id.clone());
        }
        if !self.id.contains(':') {
            if let Some(link) = &self.link {
                return link.clone();
            }
        }
        template.replace("{id}", self.short_id())
    }
}

fn is_absolute_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}

/// Resolved notification channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl ChannelInfo {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Message-create payload for the chat platform
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutgoingMessage {
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_mentions: Option<AllowedMentions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    pub url: String,
    pub description: String,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

/// Restricts which mentions in `content` actually ping
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AllowedMentions {
    pub parse: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> FeedItem {
        FeedItem {
            id: id.to_string(),
            title: "Title".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_short_id_strips_prefix() {
        assert_eq!(item("yt:video:dQw4w9WgXcQ").short_id(), "dQw4w9WgXcQ");
        assert_eq!(item("plain-id").short_id(), "plain-id");
        assert_eq!(item("trailing:").short_id(), "");
    }

    #[test]
    fn test_derived_url() {
        let url = item("yt:video:abc123").derived_url("https://www.youtube.com/watch?v={id}");
        assert_eq!(url, "https://www.youtube.com/watch?v=abc123");
    }

    #[test]
    fn test_derived_url_prefers_link_for_rss_items() {
        let template = "https://www.youtube.com/watch?v={id}";

        // guid that is itself a permalink
        let mut rss = item("https://example.com/posts/2");
        assert_eq!(rss.derived_url(template), "https://example.com/posts/2");
        rss.link = Some("https://example.com/posts/2?ref=feed".to_string());
        assert_eq!(rss.derived_url(template), "https://example.com/posts/2?ref=feed");

        // opaque guid with a link
        let mut opaque = item("post-2");
        opaque.link = Some("https://example.com/posts/2".to_string());
        assert_eq!(opaque.derived_url(template), "https://example.com/posts/2");

        // opaque id without a link falls back to the template
        assert_eq!(
            item("abc123").derived_url(template),
            "https://www.youtube.com/watch?v=abc123"
        );
    }

    #[test]
    fn test_feed_head_is_first_item() {
        let feed = Feed {
            title: None,
            items: vec![item("new"), item("old")],
        };
        assert_eq!(feed.head().map(|i| i.id.as_str()), Some("new"));
        assert!(Feed::default().head().is_none());
    }

    #[test]
    fn test_outgoing_message_skips_empty_fields() {
        let message = OutgoingMessage {
            content: "hello".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json, serde_json::json!({ "content": "hello" }));
    }
}
