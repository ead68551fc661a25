// Notification formatting: turns a new feed item into a chat message

use crate::config::{MessageStyle, Settings};
use crate::models::{
    AllowedMentions, Embed, EmbedAuthor, EmbedFooter, EmbedImage, Feed, FeedItem,
    OutgoingMessage,
};
use chrono::SecondsFormat;

pub const DEFAULT_HEADLINE: &str = "🎬 **New video uploaded!**";
pub const DEFAULT_AUTHOR_NAME: &str = "YouTube Channel";
pub const DEFAULT_AUTHOR_ICON_URL: &str =
    "https://www.youtube.com/s/desktop/d743f786/img/favicon_144x144.png";
pub const DEFAULT_FOOTER: &str = "New Video Uploaded";
pub const NO_DESCRIPTION: &str = "No description available";
/// #FF0000
pub const EMBED_COLOR: u32 = 0xFF0000;

// Chat platform embed limits
const MAX_TITLE_CHARS: usize = 256;
const MAX_DESCRIPTION_CHARS: usize = 4096;
const MAX_AUTHOR_CHARS: usize = 256;

#[derive(Debug, Clone)]
pub struct MessageFormatter {
    style: MessageStyle,
    role_id: Option<String>,
    item_url_template: String,
    headline: String,
}

impl MessageFormatter {
    pub fn new(style: MessageStyle, role_id: Option<String>, item_url_template: String) -> Self {
        Self {
            style,
            role_id: role_id.filter(|role| !role.trim().is_empty()),
            item_url_template,
            headline: DEFAULT_HEADLINE.to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.discord.message_style,
            settings.discord.role_id.clone(),
            settings.feed.item_url_template.clone(),
        )
        .with_headline(settings.discord.headline.clone())
    }

    pub fn with_headline(mut self, headline: impl Into<String>) -> Self {
        self.headline = headline.into();
        self
    }

    /// Public URL of the item
    pub fn item_url(&self, item: &FeedItem) -> String {
        item.derived_url(&self.item_url_template)
    }

    /// Build the outbound message for a newly observed item
    pub fn format(&self, item: &FeedItem, feed: &Feed) -> OutgoingMessage {
        let url = self.item_url(item);

        let content = match &self.role_id {
            Some(role) => format!("<@&{}> {}\n{}", role, self.headline, url),
            None => format!("{}\n{}", self.headline, url),
        };

        let embeds = match self.style {
            MessageStyle::Embed => vec![self.embed(item, feed, url)],
            MessageStyle::Plain => Vec::new(),
        };

        let allowed_mentions = Some(AllowedMentions {
            parse: Vec::new(),
            roles: self.role_id.iter().cloned().collect(),
        });

        OutgoingMessage {
            content,
            embeds,
            allowed_mentions,
        }
    }

    fn embed(&self, item: &FeedItem, feed: &Feed, url: String) -> Embed {
        let author_name = feed
            .title
            .as_deref()
            .filter(|title| !title.is_empty())
            .unwrap_or(DEFAULT_AUTHOR_NAME);

        Embed {
            title: truncate(&item.title, MAX_TITLE_CHARS),
            url,
            description: truncate(
                item.description.as_deref().unwrap_or(NO_DESCRIPTION),
                MAX_DESCRIPTION_CHARS,
            ),
            color: EMBED_COLOR,
            author: Some(EmbedAuthor {
                name: truncate(author_name, MAX_AUTHOR_CHARS),
                icon_url: Some(DEFAULT_AUTHOR_ICON_URL.to_string()),
            }),
            timestamp: item
                .published
                .map(|date| date.to_rfc3339_opts(SecondsFormat::Millis, true)),
            footer: Some(EmbedFooter {
                text: DEFAULT_FOOTER.to_string(),
            }),
            image: item
                .thumbnail_url
                .as_ref()
                .map(|url| EmbedImage { url: url.clone() }),
        }
    }
}

/// Cut `text` to at most `max_chars` characters, ending with an ellipsis when cut
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
