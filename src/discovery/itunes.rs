//! iTunes Search API client for podcast discovery.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{PodtextError, Result};

const ITUNES_SEARCH_URL: &str = "https://itunes.apple.com/search";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// A podcast from iTunes search results.
#[derive(Debug, Clone)]
pub struct PodcastSearchResult {
    pub title: String,
    pub feed_url: String,
    pub author: String,
    pub artwork_url: String,
    pub genre: String,
}

/// Client for the iTunes Search API.
pub struct ItunesClient {
    client: reqwest::Client,
}

impl ItunesClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Search for podcasts matching `term`.
    pub async fn search_podcasts(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<PodcastSearchResult>> {
        let response = self
            .client
            .get(ITUNES_SEARCH_URL)
            .query(&[
                ("term", term),
                ("media", "podcast"),
                ("entity", "podcast"),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| PodtextError::Search(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PodtextError::Search(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| PodtextError::Search(e.to_string()))?;

        Ok(parse_results(parsed))
    }
}

impl Default for ItunesClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResult {
    collection_name: Option<String>,
    feed_url: Option<String>,
    artist_name: Option<String>,
    artwork_url600: Option<String>,
    artwork_url100: Option<String>,
    primary_genre_name: Option<String>,
}

/// Results without a feed URL are unusable and skipped.
fn parse_results(response: SearchResponse) -> Vec<PodcastSearchResult> {
    response
        .results
        .into_iter()
        .filter_map(|raw| {
            let feed_url = raw.feed_url.filter(|url| !url.is_empty())?;
            Some(PodcastSearchResult {
                title: raw.collection_name.unwrap_or_else(|| "Unknown".to_string()),
                feed_url,
                author: raw.artist_name.unwrap_or_default(),
                artwork_url: raw
                    .artwork_url600
                    .or(raw.artwork_url100)
                    .unwrap_or_default(),
                genre: raw.primary_genre_name.unwrap_or_default(),
            })
        })
        .collect()
}
