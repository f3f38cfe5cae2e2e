//! Error types for podtext.

use thiserror::Error;

/// Library-level error type for podtext operations.
#[derive(Error, Debug)]
pub enum PodtextError {
    #[error("Configuration error: {0}")]
    ConfigInvalid(String),

    #[error("Failed to fetch feed: {0}")]
    FeedUnreachable(String),

    #[error("Invalid feed: {0}")]
    FeedUnparseable(String),

    #[error("Episode index {index} out of range (1-{available})")]
    IndexOutOfRange { index: usize, available: usize },

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Analysis unavailable: {0}")]
    AnalysisUnavailable(String),

    #[error("Podcast search failed: {0}")]
    Search(String),

    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl PodtextError {
    /// Whether this error indicates bad user input rather than a runtime failure.
    ///
    /// Used by the CLI to pick the exit code (2 for usage errors, 1 otherwise).
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            PodtextError::ConfigInvalid(_) | PodtextError::InvalidInput(_)
        )
    }
}

/// Result type alias for podtext operations.
pub type Result<T> = std::result::Result<T, PodtextError>;
