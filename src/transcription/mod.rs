//! Speech-to-text transcription.
//!
//! Defines the [`Transcriber`] port together with the transcript data
//! model and the paragraph derivation used by the renderer.

mod whisper;

pub use whisper::WhisperTranscriber;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Default silence gap (seconds) that starts a new paragraph.
pub const DEFAULT_PARAGRAPH_GAP_SECONDS: f64 = 2.0;

/// A complete transcript with timestamped segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Full transcript text.
    pub text: String,
    /// Individual segments in non-decreasing start order.
    pub segments: Vec<TranscriptSegment>,
    /// ISO-639-1 language code, lowercase.
    pub language: String,
}

impl Transcript {
    /// Build a transcript from segments, deriving the full text.
    pub fn from_segments(segments: Vec<TranscriptSegment>, language: &str) -> Self {
        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            text,
            segments,
            language: language.to_lowercase(),
        }
    }

    /// Approximate word count of the full text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// The transcript text grouped into paragraphs.
    ///
    /// A new paragraph begins when the gap between consecutive segments
    /// exceeds `gap_seconds`. Falls back to the raw text when the
    /// transcriber produced no segments.
    pub fn paragraph_text(&self, gap_seconds: f64) -> String {
        let paragraphs = paragraphs_from_segments(&self.segments, gap_seconds);
        if paragraphs.is_empty() {
            self.text.trim().to_string()
        } else {
            paragraphs.join("\n\n")
        }
    }
}

/// A single transcript segment with timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Transcribed text content.
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start_seconds: f64, end_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text: text.into(),
        }
    }
}

/// Port for speech-to-text backends.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file with the given model identifier.
    async fn transcribe(&self, audio_path: &Path, model: &str) -> Result<Transcript>;

    /// Detect the spoken language of an audio file (ISO-639-1, lowercase).
    async fn detect_language(&self, audio_path: &Path) -> Result<String>;
}

/// Group segments into paragraphs based on silence gaps.
pub fn paragraphs_from_segments(segments: &[TranscriptSegment], gap_seconds: f64) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut last_end = 0.0_f64;

    for segment in segments {
        let text = segment.text.trim();
        if text.is_empty() {
            continue;
        }

        if !current.is_empty() && segment.start_seconds - last_end > gap_seconds {
            paragraphs.push(current.join(" "));
            current = Vec::new();
        }

        current.push(text);
        last_end = segment.end_seconds;
    }

    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment::new(start, end, text)
    }

    #[test]
    fn test_from_segments_joins_text() {
        let t = Transcript::from_segments(
            vec![seg(0.0, 5.0, "Hello world."), seg(5.0, 10.0, "Second part.")],
            "EN",
        );
        assert_eq!(t.text, "Hello world. Second part.");
        assert_eq!(t.language, "en");
        assert_eq!(t.word_count(), 4);
    }

    #[test]
    fn test_paragraph_break_on_long_gap() {
        let segments = vec![
            seg(0.0, 5.0, "First sentence."),
            seg(5.5, 10.0, "Still first paragraph."),
            seg(13.0, 18.0, "Second paragraph."),
        ];

        let paragraphs = paragraphs_from_segments(&segments, DEFAULT_PARAGRAPH_GAP_SECONDS);
        assert_eq!(
            paragraphs,
            vec![
                "First sentence. Still first paragraph.".to_string(),
                "Second paragraph.".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_break_at_exact_threshold() {
        let segments = vec![seg(0.0, 5.0, "A."), seg(7.0, 9.0, "B.")];
        let paragraphs = paragraphs_from_segments(&segments, 2.0);
        assert_eq!(paragraphs, vec!["A. B.".to_string()]);
    }

    #[test]
    fn test_empty_segments_skipped() {
        let segments = vec![seg(0.0, 5.0, "A."), seg(5.0, 6.0, "  "), seg(6.0, 7.0, "B.")];
        let paragraphs = paragraphs_from_segments(&segments, 2.0);
        assert_eq!(paragraphs, vec!["A. B.".to_string()]);
    }

    #[test]
    fn test_paragraph_text_falls_back_to_raw_text() {
        let t = Transcript {
            text: "raw text only".to_string(),
            segments: Vec::new(),
            language: "en".to_string(),
        };
        assert_eq!(t.paragraph_text(2.0), "raw text only");
    }
}
