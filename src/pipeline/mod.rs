//! Transcription pipeline orchestration.
//!
//! Threads one episode through resolve → download → transcribe → analyze
//! → render → persist → cleanup, and drives batches strictly
//! sequentially with per-episode isolation. Analysis failures degrade
//! gracefully; download, transcription, and write failures are fatal for
//! the episode but never for the batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::analysis::{apply_ad_excision, AnalysisEngine, AnalysisResult, ClaudeClient};
use crate::config::{AnalysisPrompts, Config};
use crate::error::Result;
use crate::feed::{Episode, FeedIngester, FeedListing, FeedSource};
use crate::media::{media_filename, unique_destination, HttpMediaFetcher, MediaFetcher};
use crate::output::{output_path, render_document, write_document, FrontMatter};
use crate::transcription::{Transcriber, WhisperTranscriber, DEFAULT_PARAGRAPH_GAP_SECONDS};

/// Per-invocation options for the transcribe pipeline.
#[derive(Debug, Clone, Default)]
pub struct TranscribeOptions {
    /// Skip the language-detection pass before transcription.
    pub skip_language_check: bool,
    /// Replace an existing output file instead of failing.
    pub overwrite: bool,
}

/// Result of a successfully processed episode.
#[derive(Debug, Clone)]
pub struct EpisodeOutput {
    pub path: PathBuf,
    pub title: String,
    /// Analysis summary, empty when analysis was skipped or degraded.
    pub summary: String,
    pub keywords: Vec<String>,
}

/// Outcome of one batch entry: the episode output on success, or a
/// single-sentence cause on failure.
#[derive(Debug)]
pub struct BatchResult {
    pub index: usize,
    pub outcome: std::result::Result<EpisodeOutput, String>,
}

impl BatchResult {
    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// The main pipeline orchestrator.
pub struct Orchestrator {
    config: Config,
    feed: Arc<dyn FeedSource>,
    fetcher: Arc<dyn MediaFetcher>,
    transcriber: Arc<dyn Transcriber>,
    /// Absent when no API key is configured; the pipeline then produces
    /// unenriched output.
    analysis: Option<AnalysisEngine>,
}

impl Orchestrator {
    /// Create an orchestrator with the production ports.
    pub fn new(config: Config) -> Self {
        let prompts_path = Config::prompts_path();
        if let Err(e) = AnalysisPrompts::ensure_file_exists(&prompts_path) {
            warn!(
                "Could not create default prompts file {}: {}",
                prompts_path.display(),
                e
            );
        }
        let prompts = AnalysisPrompts::load(&prompts_path);

        let analysis = config.api_key().map(|key| {
            AnalysisEngine::new(
                Arc::new(ClaudeClient::new(key, &config.analysis.claude_model)),
                prompts,
            )
        });

        Self {
            config,
            feed: Arc::new(FeedIngester::new()),
            fetcher: Arc::new(HttpMediaFetcher::new()),
            transcriber: Arc::new(WhisperTranscriber::new()),
            analysis,
        }
    }

    /// Create an orchestrator with custom ports.
    pub fn with_components(
        config: Config,
        feed: Arc<dyn FeedSource>,
        fetcher: Arc<dyn MediaFetcher>,
        transcriber: Arc<dyn Transcriber>,
        analysis: Option<AnalysisEngine>,
    ) -> Self {
        Self {
            config,
            feed,
            fetcher,
            transcriber,
            analysis,
        }
    }

    /// Process a batch of episode indices strictly in order.
    ///
    /// Duplicate indices are dropped, keeping the first occurrence. A
    /// failing entry never prevents later entries from running.
    pub async fn transcribe_batch(
        &self,
        feed_url: &str,
        indices: &[usize],
        opts: &TranscribeOptions,
    ) -> Vec<BatchResult> {
        let deduped = dedup_indices(indices);
        let total = deduped.len();
        let mut results = Vec::with_capacity(total);

        for (i, index) in deduped.into_iter().enumerate() {
            eprintln!("[{}/{}] Episode {}", i + 1, total, index);

            let outcome = self
                .transcribe_episode(feed_url, index, opts)
                .await
                .map_err(|e| e.to_string());
            results.push(BatchResult { index, outcome });
        }

        results
    }

    /// Run the full pipeline for a single episode.
    #[instrument(skip(self, opts), fields(feed_url = %feed_url, index = index))]
    pub async fn transcribe_episode(
        &self,
        feed_url: &str,
        index: usize,
        opts: &TranscribeOptions,
    ) -> Result<EpisodeOutput> {
        // Resolve the episode from the feed listing.
        let limit = index.max(self.config.defaults.episode_limit);
        let listing = self.feed.list(feed_url, limit).await?;
        let episode = listing.episode(index)?.clone();

        info!("Resolved episode {}: {}", episode.index, episode.title);
        eprintln!("  Episode: {}", episode.title);

        // Download media.
        eprintln!("  Downloading media...");
        let media_path =
            unique_destination(&self.config.media_dir(), &media_filename(&episode.media_url));
        self.fetcher.fetch(&episode.media_url, &media_path).await?;

        let result = self
            .process_downloaded(&listing, &episode, &media_path, opts)
            .await;

        // Cleanup failures are recovered: log and move on.
        if self.config.storage.temp_storage {
            if let Err(e) = std::fs::remove_file(&media_path) {
                warn!(
                    "Failed to clean up media file {}: {}",
                    media_path.display(),
                    e
                );
            }
        }

        result
    }

    /// The pipeline stages after the media file is on disk.
    async fn process_downloaded(
        &self,
        listing: &FeedListing,
        episode: &Episode,
        media_path: &Path,
        opts: &TranscribeOptions,
    ) -> Result<EpisodeOutput> {
        if !opts.skip_language_check {
            match self.transcriber.detect_language(media_path).await {
                Ok(lang) if lang != "en" => {
                    warn!(
                        "Detected language '{}' is not English; transcription quality may vary",
                        lang
                    );
                }
                Ok(_) => {}
                Err(e) => warn!("Language detection failed: {e}"),
            }
        }

        eprintln!("  Transcribing (this may take a while)...");
        let transcript = self
            .transcriber
            .transcribe(media_path, &self.config.whisper.model)
            .await?;
        info!("Transcription complete: {} words", transcript.word_count());

        let body_text = transcript.paragraph_text(DEFAULT_PARAGRAPH_GAP_SECONDS);

        let analysis = match &self.analysis {
            Some(engine) => {
                eprintln!("  Analyzing transcript...");
                engine.analyze(&body_text).await
            }
            None => {
                warn!("No Claude API key configured; producing transcript without analysis");
                AnalysisResult::default()
            }
        };

        let edited = apply_ad_excision(
            &body_text,
            &analysis.ad_spans,
            self.config.analysis.ad_confidence_threshold,
        );

        let summary = analysis.summary.clone();
        let keywords = analysis.keywords.clone();

        let front_matter = FrontMatter {
            title: episode.title.clone(),
            pub_date: episode.pub_date.format("%Y-%m-%d").to_string(),
            podcast: listing.podcast_title.clone(),
            feed_url: episode.feed_url.clone(),
            media_url: episode.media_url.clone(),
            summary: analysis.summary,
            topics: analysis.topics,
            keywords: analysis.keywords,
        };

        let path = output_path(
            &self.config.output_dir(),
            &listing.podcast_title,
            &episode.title,
            episode.index,
        );
        let content = render_document(&front_matter, &edited, &episode.show_notes)?;
        write_document(&path, &content, opts.overwrite)?;

        info!("Wrote transcript to {}", path.display());
        Ok(EpisodeOutput {
            path,
            title: episode.title.clone(),
            summary,
            keywords,
        })
    }
}

/// Drop duplicate indices, preserving the first occurrence of each.
fn dedup_indices(indices: &[usize]) -> Vec<usize> {
    let mut seen = std::collections::HashSet::new();
    indices
        .iter()
        .copied()
        .filter(|index| seen.insert(*index))
        .collect()
}
