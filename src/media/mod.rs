//! Media download for podcast episodes.
//!
//! Defines the [`MediaFetcher`] port plus the production HTTP
//! implementation, which streams the response body to disk and removes
//! partial files on failure.

use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{PodtextError, Result};
use crate::paths::sanitize;

/// Connect timeout for media downloads.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Total timeout for a single media download.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Maximum length for a derived media filename, in characters.
const MEDIA_NAME_MAX_LENGTH: usize = 60;

/// Port for retrieving episode media into a local file.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download `url` to `dest`, creating parent directories as needed.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Production media fetcher streaming over HTTP.
pub struct HttpMediaFetcher {
    client: reqwest::Client,
}

impl HttpMediaFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpMediaFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!("Downloading {} to {}", url, dest.display());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PodtextError::Download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PodtextError::Download(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let content_length = response.content_length();

        let result = write_stream(response, dest).await;
        if let Err(e) = result {
            // Don't leave a partial file behind.
            let _ = tokio::fs::remove_file(dest).await;
            return Err(e);
        }

        if let Some(expected) = content_length {
            let actual = tokio::fs::metadata(dest).await?.len();
            if actual != expected {
                let _ = tokio::fs::remove_file(dest).await;
                return Err(PodtextError::Download(format!(
                    "incomplete download: got {actual} bytes, expected {expected}"
                )));
            }
        }

        debug!("Download complete: {}", dest.display());
        Ok(())
    }
}

async fn write_stream(response: reqwest::Response, dest: &Path) -> Result<()> {
    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| PodtextError::Download(e.to_string()))?;
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    Ok(())
}

/// Derive a safe local filename from a media URL.
///
/// Uses the last segment of the URL path, sanitized; falls back to
/// `episode.mp3` when the URL has no usable basename.
pub fn media_filename(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let basename = without_query.rsplit('/').next().unwrap_or("");
    sanitize(basename, MEDIA_NAME_MAX_LENGTH, "episode.mp3")
}

/// Pick a destination path in `dir` that does not collide with an
/// existing file, appending `_N` before the extension if needed.
pub fn unique_destination(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let stem = candidate
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("episode");
    let ext = candidate.extension().and_then(|s| s.to_str());

    let mut counter = 1;
    loop {
        let name = match ext {
            Some(ext) => format!("{stem}_{counter}.{ext}"),
            None => format!("{stem}_{counter}"),
        };
        let next = dir.join(name);
        if !next.exists() {
            return next;
        }
        counter += 1;
    }
}
