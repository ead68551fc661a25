// Streaming Atom / RSS 2.0 parser
//
// Accepts the YouTube channel feed (Atom with `yt:` and `media:` extensions)
// as well as plain RSS 2.0 documents. Elements are matched by local name so
// namespace prefixes do not matter.

use crate::errors::FeedError;
use crate::models::{Feed, FeedItem};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

lazy_static::lazy_static! {
    static ref LINE_BREAK: Regex =
        Regex::new(r"(?i)<br\s*/?>|</p>|</div>|</li>").expect("Invalid regex pattern");
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").expect("Invalid regex pattern");
    static ref BLANK_LINES: Regex = Regex::new(r"\n{3,}").expect("Invalid regex pattern");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedFormat {
    Atom,
    Rss,
}

impl FeedFormat {
    fn from_root(name: &str) -> Option<Self> {
        match name {
            "feed" => Some(Self::Atom),
            "rss" | "RDF" => Some(Self::Rss),
            _ => None,
        }
    }

    fn item_element(self) -> &'static str {
        match self {
            Self::Atom => "entry",
            Self::Rss => "item",
        }
    }

    fn container_element(self) -> &'static str {
        match self {
            Self::Atom => "feed",
            Self::Rss => "channel",
        }
    }
}

/// Fields collected while inside one entry / item
#[derive(Debug, Default)]
struct ItemBuilder {
    id: Option<String>,
    title: Option<String>,
    link: Option<String>,
    published: Option<DateTime<Utc>>,
    updated: Option<DateTime<Utc>>,
    media_description: Option<String>,
    summary: Option<String>,
    thumbnail_url: Option<String>,
    enclosure_image: Option<String>,
}

impl ItemBuilder {
    fn on_element(&mut self, name: &str, element: &BytesStart<'_>) -> Result<(), FeedError> {
        match name {
            "link" => {
                let rel = attribute(element, b"rel")?;
                if self.link.is_none() && matches!(rel.as_deref(), None | Some("alternate")) {
                    self.link = attribute(element, b"href")?;
                }
            }
            "thumbnail" if self.thumbnail_url.is_none() => {
                self.thumbnail_url = attribute(element, b"url")?;
            }
            "enclosure" if self.enclosure_image.is_none() => {
                let is_image = attribute(element, b"type")?
                    .is_some_and(|kind| kind.starts_with("image/"));
                if is_image {
                    self.enclosure_image = attribute(element, b"url")?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn on_text(&mut self, name: &str, parent: Option<&str>, item_element: &str, value: String) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let direct_child = parent == Some(item_element);

        match name {
            "id" | "guid" if direct_child => set_once(&mut self.id, value),
            "title" if direct_child => set_once(&mut self.title, value),
            "link" if direct_child => set_once(&mut self.link, value),
            "published" | "pubDate" | "date" if direct_child => {
                if self.published.is_none() {
                    self.published = parse_date(value);
                }
            }
            "updated" if direct_child => {
                if self.updated.is_none() {
                    self.updated = parse_date(value);
                }
            }
            "description" if parent == Some("group") => {
                set_once(&mut self.media_description, value)
            }
            "description" | "summary" | "content" | "encoded" if direct_child => {
                set_once(&mut self.summary, value)
            }
            _ => {}
        }
    }

    fn build(self) -> Option<FeedItem> {
        let id = self.id.or_else(|| self.link.clone())?;

        Some(FeedItem {
            id,
            title: self.title.unwrap_or_default(),
            link: self.link,
            published: self.published.or(self.updated),
            description: self
                .media_description
                .or(self.summary)
                .map(|text| snippet(&text))
                .filter(|text| !text.is_empty()),
            thumbnail_url: self.thumbnail_url.or(self.enclosure_image),
        })
    }
}

/// Parse an Atom or RSS document into a [`Feed`]
///
/// Items without any usable identifier (no id, guid or link) are dropped.
pub fn parse_feed(xml: &str) -> Result<Feed, FeedError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut feed = Feed::default();
    let mut format: Option<FeedFormat> = None;
    let mut path: Vec<String> = Vec::new();
    let mut current: Option<ItemBuilder> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                let name = local_name(&element);
                if path.is_empty() {
                    format = FeedFormat::from_root(&name);
                    if format.is_none() {
                        return Err(FeedError::Parse(format!(
                            "unsupported root element <{}>",
                            name
                        )));
                    }
                }

                if let Some(kind) = format {
                    if name == kind.item_element() && current.is_none() {
                        current = Some(ItemBuilder::default());
                    } else if let Some(item) = current.as_mut() {
                        item.on_element(&name, &element)?;
                    }
                }

                path.push(name);
                text.clear();
            }
            Event::Empty(element) => {
                if let Some(item) = current.as_mut() {
                    item.on_element(&local_name(&element), &element)?;
                }
            }
            Event::Text(content) => text.push_str(&content.unescape()?),
            Event::CData(content) => {
                text.push_str(&String::from_utf8_lossy(&content.into_inner()));
            }
            Event::End(_) => {
                let Some(name) = path.pop() else {
                    continue;
                };
                let Some(kind) = format else {
                    continue;
                };
                let parent = path.last().map(String::as_str);
                let value = std::mem::take(&mut text);

                if name == kind.item_element() {
                    if let Some(item) = current.take().and_then(ItemBuilder::build) {
                        feed.items.push(item);
                    }
                } else if let Some(item) = current.as_mut() {
                    item.on_text(&name, parent, kind.item_element(), value);
                } else if name == "title" && parent == Some(kind.container_element()) {
                    let title = value.trim();
                    if feed.title.is_none() && !title.is_empty() {
                        feed.title = Some(title.to_string());
                    }
                }
            }
            Event::Eof => {
                if let Some(open) = path.last() {
                    return Err(FeedError::Parse(format!(
                        "unexpected end of document inside <{}>",
                        open
                    )));
                }
                break;
            }
            _ => {}
        }
    }

    if format.is_none() {
        return Err(FeedError::Parse("document has no root element".to_string()));
    }

    Ok(feed)
}

/// Reduce HTML or plain text to a readable plain-text snippet
pub fn snippet(text: &str) -> String {
    let with_breaks = LINE_BREAK.replace_all(text, "\n");
    let stripped = HTML_TAG.replace_all(&with_breaks, "");
    let lines = stripped
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    BLANK_LINES.replace_all(lines.trim(), "\n\n").into_owned()
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, FeedError> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| FeedError::Parse(e.to_string()))?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn set_once(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const YOUTUBE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns:media="http://search.yahoo.com/mrss/" xmlns="http://www.w3.org/2005/Atom">
 <link rel="self" href="http://www.youtube.com/feeds/videos.xml?channel_id=UC123"/>
 <id>yt:channel:UC123</id>
 <yt:channelId>UC123</yt:channelId>
 <title>Rust &amp; Friends</title>
 <link rel="alternate" href="https://www.youtube.com/channel/UC123"/>
 <author>
  <name>Rust &amp; Friends</name>
  <uri>https://www.youtube.com/channel/UC123</uri>
 </author>
 <published>2019-01-01T00:00:00+00:00</published>
 <entry>
  <id>yt:video:newVideo01</id>
  <yt:videoId>newVideo01</yt:videoId>
  <yt:channelId>UC123</yt:channelId>
  <title>Ownership explained</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=newVideo01"/>
  <author>
   <name>Rust &amp; Friends</name>
   <uri>https://www.youtube.com/channel/UC123</uri>
  </author>
  <published>2024-03-01T12:00:00+00:00</published>
  <updated>2024-03-02T08:00:00+00:00</updated>
  <media:group>
   <media:title>Ownership explained (media)</media:title>
   <media:content url="https://www.youtube.com/v/newVideo01?version=3" type="application/x-shockwave-flash" width="640" height="390"/>
   <media:thumbnail url="https://i1.ytimg.com/vi/newVideo01/hqdefault.jpg" width="480" height="360"/>
   <media:description>Borrowing, moving and lifetimes.

Links below.</media:description>
   <media:community>
    <media:starRating count="10" average="5.00" min="1" max="5"/>
   </media:community>
  </media:group>
 </entry>
 <entry>
  <id>yt:video:oldVideo01</id>
  <title>Hello world</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=oldVideo01"/>
  <published>2024-02-01T12:00:00+00:00</published>
 </entry>
</feed>"#;

    const RSS_FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
 <channel>
  <title>Example Blog</title>
  <link>https://example.com</link>
  <item>
   <title>Second post</title>
   <link>https://example.com/posts/2</link>
   <guid isPermaLink="false">post-2</guid>
   <pubDate>Tue, 05 Mar 2024 10:00:00 GMT</pubDate>
   <description><![CDATA[<p>Hello <b>there</b></p><p>Bye</p>]]></description>
   <enclosure url="https://example.com/cover.png" type="image/png" length="100"/>
  </item>
  <item>
   <title>First post</title>
   <link>https://example.com/posts/1</link>
  </item>
 </channel>
</rss>"#;

    #[test]
    fn test_parse_youtube_atom_feed() {
        let feed = parse_feed(YOUTUBE_FEED).unwrap();

        assert_eq!(feed.title.as_deref(), Some("Rust & Friends"));
        assert_eq!(feed.items.len(), 2);

        let head = &feed.items[0];
        assert_eq!(head.id, "yt:video:newVideo01");
        assert_eq!(head.title, "Ownership explained");
        assert_eq!(
            head.link.as_deref(),
            Some("https://www.youtube.com/watch?v=newVideo01")
        );
        assert_eq!(
            head.published,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(
            head.description.as_deref(),
            Some("Borrowing, moving and lifetimes.\n\nLinks below.")
        );
        assert_eq!(
            head.thumbnail_url.as_deref(),
            Some("https://i1.ytimg.com/vi/newVideo01/hqdefault.jpg")
        );

        let older = &feed.items[1];
        assert_eq!(older.id, "yt:video:oldVideo01");
        assert!(older.description.is_none());
        assert!(older.thumbnail_url.is_none());
    }

    #[test]
    fn test_parse_rss_feed() {
        let feed = parse_feed(RSS_FEED).unwrap();

        assert_eq!(feed.title.as_deref(), Some("Example Blog"));
        assert_eq!(feed.items.len(), 2);

        let head = &feed.items[0];
        assert_eq!(head.id, "post-2");
        assert_eq!(
            head.published,
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap())
        );
        assert_eq!(head.description.as_deref(), Some("Hello there\nBye"));
        assert_eq!(
            head.thumbnail_url.as_deref(),
            Some("https://example.com/cover.png")
        );

        // no guid: link is the identifier
        assert_eq!(feed.items[1].id, "https://example.com/posts/1");
    }

    #[test]
    fn test_parse_empty_feed() {
        let feed = parse_feed(r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>Empty</title></feed>"#)
            .unwrap();
        assert_eq!(feed.title.as_deref(), Some("Empty"));
        assert!(feed.items.is_empty());
    }

    #[test]
    fn test_updated_used_when_published_missing() {
        let xml = r#"<feed><entry><id>a</id><title>t</title><updated>2024-01-01T00:00:00Z</updated></entry></feed>"#;
        let feed = parse_feed(xml).unwrap();
        assert_eq!(
            feed.items[0].published,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_rejects_non_feed_document() {
        let err = parse_feed("<html><body>Not found</body></html>").unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
    }

    #[test]
    fn test_rejects_malformed_xml() {
        assert!(parse_feed("<feed><entry><id>a</id></feed>").is_err());
        assert!(parse_feed("").is_err());
    }

    #[test]
    fn test_rejects_truncated_document() {
        // Cut inside the first entry's text
        let err = parse_feed(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>T</title><entry><id>yt:vid"#,
        )
        .unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));

        // Cut after one complete entry
        let err = parse_feed(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>T</title><entry><id>yt:video:a</id></entry><entry><id>yt:video:b</id>"#,
        )
        .unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
    }

    #[test]
    fn test_snippet_strips_markup() {
        assert_eq!(snippet("<p>One</p><p>Two<br/>Three</p>"), "One\nTwo\nThree");
        assert_eq!(snippet("  plain text  "), "plain text");
        assert_eq!(snippet("a\n\n\n\nb"), "a\n\nb");
    }
}
