//! RSS feed ingestion and episode indexing.
//!
//! Parses a podcast feed into an ordered, 1-indexed list of episodes,
//! most recent first. Entries without a usable title or media URL are
//! skipped rather than failing the whole feed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::debug;

use crate::error::{PodtextError, Result};

/// Timeout for fetching a feed over HTTP.
const FEED_TIMEOUT: Duration = Duration::from_secs(30);

/// A single episode from a podcast feed listing.
#[derive(Debug, Clone)]
pub struct Episode {
    /// 1-based position in the current listing, most recent first.
    pub index: usize,
    pub title: String,
    pub pub_date: DateTime<Utc>,
    pub media_url: String,
    /// Duration in seconds, when the feed provides one.
    pub duration: Option<u32>,
    /// Raw long-form description, potentially HTML.
    pub show_notes: String,
    /// Feed URL this episode was listed from, byte-exact.
    pub feed_url: String,
}

/// A parsed feed listing: the podcast title plus its indexed episodes.
#[derive(Debug, Clone)]
pub struct FeedListing {
    pub podcast_title: String,
    pub episodes: Vec<Episode>,
}

impl FeedListing {
    /// Look up an episode by its 1-based listing index.
    pub fn episode(&self, index: usize) -> Result<&Episode> {
        self.episodes
            .iter()
            .find(|e| e.index == index)
            .ok_or(PodtextError::IndexOutOfRange {
                index,
                available: self.episodes.len(),
            })
    }
}

/// Source of feed listings. Implemented by [`FeedIngester`] for production
/// and by in-memory fakes in tests.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// List up to `limit` episodes from the feed, most recent first.
    async fn list(&self, feed_url: &str, limit: usize) -> Result<FeedListing>;
}

/// Production feed ingester backed by HTTP + feed-rs.
pub struct FeedIngester {
    client: reqwest::Client,
}

impl FeedIngester {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FEED_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Parse feed bytes into a listing. Pure; used directly by tests.
    pub fn parse(feed_url: &str, bytes: &[u8], limit: usize) -> Result<FeedListing> {
        let limit = limit.max(1);

        let feed = feed_rs::parser::parse(bytes)
            .map_err(|e| PodtextError::FeedUnparseable(e.to_string()))?;

        let podcast_title = feed.title.map(|t| t.content).unwrap_or_default();

        let mut episodes: Vec<Episode> = feed
            .entries
            .into_iter()
            .filter_map(|entry| parse_entry(entry, feed_url))
            .collect();

        if episodes.is_empty() {
            return Err(PodtextError::FeedUnparseable(
                "feed contains no usable entries".to_string(),
            ));
        }

        // Most recent first. Stable, so ties keep document order.
        episodes.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
        episodes.truncate(limit);
        for (i, episode) in episodes.iter_mut().enumerate() {
            episode.index = i + 1;
        }

        debug!("Parsed {} episode(s) from {}", episodes.len(), feed_url);

        Ok(FeedListing {
            podcast_title,
            episodes,
        })
    }
}

impl Default for FeedIngester {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedSource for FeedIngester {
    async fn list(&self, feed_url: &str, limit: usize) -> Result<FeedListing> {
        let response = self
            .client
            .get(feed_url)
            .send()
            .await
            .map_err(|e| PodtextError::FeedUnreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PodtextError::FeedUnreachable(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PodtextError::FeedUnreachable(e.to_string()))?;

        Self::parse(feed_url, &bytes, limit)
    }
}

/// Parse a single feed entry; `None` when a required field is missing.
fn parse_entry(entry: feed_rs::model::Entry, feed_url: &str) -> Option<Episode> {
    let title = entry.title.as_ref().map(|t| t.content.clone())?;
    if title.is_empty() {
        return None;
    }

    let media_url = extract_media_url(&entry)?;

    let pub_date = entry
        .published
        .or(entry.updated)
        .unwrap_or_else(Utc::now);

    // Enclosure duration first, then the itunes:duration on the media object.
    let duration = entry
        .media
        .first()
        .and_then(|m| m.content.first().and_then(|c| c.duration).or(m.duration))
        .map(|d| d.as_secs() as u32);

    let show_notes = extract_show_notes(&entry);

    Some(Episode {
        index: 0, // assigned after sorting
        title,
        pub_date,
        media_url,
        duration,
        show_notes,
        feed_url: feed_url.to_string(),
    })
}

/// First enclosure with a non-empty URL, falling back to audio links.
fn extract_media_url(entry: &feed_rs::model::Entry) -> Option<String> {
    for media in &entry.media {
        for content in &media.content {
            if let Some(url) = &content.url {
                let url = url.to_string();
                if !url.is_empty() {
                    return Some(url);
                }
            }
        }
    }

    entry
        .links
        .iter()
        .find(|l| {
            l.rel.as_deref() == Some("enclosure")
                || l.media_type
                    .as_deref()
                    .is_some_and(|t| t.starts_with("audio/"))
        })
        .map(|l| l.href.clone())
}

/// Show notes: full content body first, then the summary/description.
fn extract_show_notes(entry: &feed_rs::model::Entry) -> String {
    if let Some(body) = entry.content.as_ref().and_then(|c| c.body.as_ref()) {
        if !body.is_empty() {
            return body.clone();
        }
    }

    if let Some(summary) = &entry.summary {
        if !summary.content.is_empty() {
            return summary.content.clone();
        }
    }

    entry
        .media
        .first()
        .and_then(|m| m.description.as_ref())
        .map(|d| d.content.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED_URL: &str = "https://example.com/feed.xml";

    fn rss(items: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
<channel>
<title>My Podcast</title>
<link>https://example.com</link>
{items}
</channel>
</rss>"#
        )
    }

    fn item(title: &str, date: &str, url: &str) -> String {
        format!(
            r#"<item>
<title>{title}</title>
<pubDate>{date}</pubDate>
<enclosure url="{url}" type="audio/mpeg" length="1"/>
</item>"#
        )
    }

    #[test]
    fn test_indices_are_monotonic_from_one() {
        let feed = rss(&format!(
            "{}{}{}",
            item("Third", "Wed, 03 Jan 2024 10:00:00 GMT", "https://example.com/3.mp3"),
            item("Second", "Tue, 02 Jan 2024 10:00:00 GMT", "https://example.com/2.mp3"),
            item("First", "Mon, 01 Jan 2024 10:00:00 GMT", "https://example.com/1.mp3"),
        ));

        let listing = FeedIngester::parse(FEED_URL, feed.as_bytes(), 10).unwrap();
        assert_eq!(listing.podcast_title, "My Podcast");
        assert_eq!(listing.episodes.len(), 3);

        let indices: Vec<usize> = listing.episodes.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(listing.episodes[0].title, "Third");
        assert_eq!(listing.episodes[2].title, "First");
    }

    #[test]
    fn test_most_recent_first_regardless_of_document_order() {
        let feed = rss(&format!(
            "{}{}",
            item("Older", "Mon, 01 Jan 2024 10:00:00 GMT", "https://example.com/old.mp3"),
            item("Newer", "Fri, 05 Jan 2024 10:00:00 GMT", "https://example.com/new.mp3"),
        ));

        let listing = FeedIngester::parse(FEED_URL, feed.as_bytes(), 10).unwrap();
        assert_eq!(listing.episodes[0].title, "Newer");
        assert_eq!(listing.episodes[0].index, 1);
    }

    #[test]
    fn test_limit_caps_results() {
        let dates = [
            "Mon, 01 Jan 2024 10:00:00 GMT",
            "Tue, 02 Jan 2024 10:00:00 GMT",
            "Wed, 03 Jan 2024 10:00:00 GMT",
            "Thu, 04 Jan 2024 10:00:00 GMT",
            "Fri, 05 Jan 2024 10:00:00 GMT",
        ];
        let items: String = dates
            .iter()
            .enumerate()
            .map(|(i, date)| {
                item(
                    &format!("Episode {}", i + 1),
                    date,
                    &format!("https://example.com/{}.mp3", i + 1),
                )
            })
            .collect();

        let listing = FeedIngester::parse(FEED_URL, rss(&items).as_bytes(), 2).unwrap();
        assert_eq!(listing.episodes.len(), 2);
        assert_eq!(
            listing.episodes.iter().map(|e| e.index).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn test_entries_without_enclosure_are_skipped() {
        let feed = rss(&format!(
            r#"{}<item><title>No media here</title><pubDate>Tue, 02 Jan 2024 10:00:00 GMT</pubDate></item>"#,
            item("Has media", "Mon, 01 Jan 2024 10:00:00 GMT", "https://example.com/1.mp3"),
        ));

        let listing = FeedIngester::parse(FEED_URL, feed.as_bytes(), 10).unwrap();
        assert_eq!(listing.episodes.len(), 1);
        assert_eq!(listing.episodes[0].title, "Has media");
    }

    #[test]
    fn test_show_notes_prefers_content_over_description() {
        let feed = rss(
            r#"<item>
<title>Ep</title>
<pubDate>Mon, 01 Jan 2024 10:00:00 GMT</pubDate>
<description>D</description>
<content:encoded><![CDATA[<p>C</p>]]></content:encoded>
<enclosure url="https://example.com/1.mp3" type="audio/mpeg" length="1"/>
</item>"#,
        );

        let listing = FeedIngester::parse(FEED_URL, feed.as_bytes(), 10).unwrap();
        assert_eq!(listing.episodes[0].show_notes, "<p>C</p>");
    }

    #[test]
    fn test_show_notes_falls_back_to_description() {
        let feed = rss(
            r#"<item>
<title>Ep</title>
<pubDate>Mon, 01 Jan 2024 10:00:00 GMT</pubDate>
<description>Plain description</description>
<enclosure url="https://example.com/1.mp3" type="audio/mpeg" length="1"/>
</item>"#,
        );

        let listing = FeedIngester::parse(FEED_URL, feed.as_bytes(), 10).unwrap();
        assert_eq!(listing.episodes[0].show_notes, "Plain description");
    }

    #[test]
    fn test_feed_url_propagated() {
        let feed = rss(&item(
            "Ep",
            "Mon, 01 Jan 2024 10:00:00 GMT",
            "https://example.com/1.mp3",
        ));
        let listing = FeedIngester::parse(FEED_URL, feed.as_bytes(), 10).unwrap();
        assert_eq!(listing.episodes[0].feed_url, FEED_URL);
    }

    #[test]
    fn test_no_usable_entries_is_unparseable() {
        let feed = rss(r#"<item><title>Only text</title></item>"#);
        let err = FeedIngester::parse(FEED_URL, feed.as_bytes(), 10).unwrap_err();
        assert!(matches!(err, PodtextError::FeedUnparseable(_)));
    }

    #[test]
    fn test_garbage_bytes_is_unparseable() {
        let err = FeedIngester::parse(FEED_URL, b"this is not xml", 10).unwrap_err();
        assert!(matches!(err, PodtextError::FeedUnparseable(_)));
    }

    #[test]
    fn test_episode_lookup_out_of_range() {
        let feed = rss(&item(
            "Ep",
            "Mon, 01 Jan 2024 10:00:00 GMT",
            "https://example.com/1.mp3",
        ));
        let listing = FeedIngester::parse(FEED_URL, feed.as_bytes(), 10).unwrap();

        assert!(listing.episode(1).is_ok());
        let err = listing.episode(9999).unwrap_err();
        assert!(matches!(
            err,
            PodtextError::IndexOutOfRange {
                index: 9999,
                available: 1
            }
        ));
    }
}
