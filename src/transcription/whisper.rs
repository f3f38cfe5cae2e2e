//! Whisper CLI transcription implementation.
//!
//! Shells out to the `whisper` command-line tool with JSON output and
//! parses the result into the transcript model.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use super::{Transcriber, Transcript, TranscriptSegment};
use crate::error::{PodtextError, Result};

/// Model used for the quick language-detection pass.
const LANGUAGE_DETECT_MODEL: &str = "tiny";

/// Transcriber backed by the `whisper` CLI.
pub struct WhisperTranscriber {
    binary: String,
}

impl WhisperTranscriber {
    pub fn new() -> Self {
        Self {
            binary: "whisper".to_string(),
        }
    }

    /// Use a specific binary name or path instead of `whisper`.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run whisper on `audio_path` and return the parsed JSON output.
    async fn run(&self, audio_path: &Path, model: &str) -> Result<WhisperOutput> {
        if !audio_path.exists() {
            return Err(PodtextError::Transcription(format!(
                "audio file not found: {}",
                audio_path.display()
            )));
        }

        let output_dir = tempfile::tempdir()?;

        info!(
            "Transcribing {} with whisper model '{}'",
            audio_path.display(),
            model
        );

        let result = Command::new(&self.binary)
            .arg(audio_path)
            .arg("--model").arg(model)
            .arg("--output_format").arg("json")
            .arg("--output_dir").arg(output_dir.path())
            .arg("--verbose").arg("False")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PodtextError::ToolNotFound(self.binary.clone()));
            }
            Err(e) => {
                return Err(PodtextError::Transcription(format!(
                    "failed to run {}: {e}",
                    self.binary
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PodtextError::Transcription(format!(
                "{} failed: {}",
                self.binary,
                stderr.trim()
            )));
        }

        let stem = audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        let json_path = output_dir.path().join(format!("{stem}.json"));

        let json = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            PodtextError::Transcription(format!("missing whisper output: {e}"))
        })?;

        let parsed = parse_whisper_json(&json)?;
        debug!("Transcribed {} segment(s)", parsed.segments.len());
        Ok(parsed)
    }
}

impl Default for WhisperTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path, model: &str) -> Result<Transcript> {
        let output = self.run(audio_path, model).await?;
        Ok(output.into_transcript())
    }

    async fn detect_language(&self, audio_path: &Path) -> Result<String> {
        let output = self.run(audio_path, LANGUAGE_DETECT_MODEL).await?;
        Ok(output.language.to_lowercase())
    }
}

/// Shape of the whisper CLI JSON output.
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
    #[serde(default = "default_language")]
    language: String,
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    #[serde(default)]
    text: String,
}

impl WhisperOutput {
    fn into_transcript(self) -> Transcript {
        let segments = self
            .segments
            .into_iter()
            .map(|s| TranscriptSegment::new(s.start, s.end, s.text.trim().to_string()))
            .collect();

        Transcript {
            text: self.text.trim().to_string(),
            segments,
            language: self.language.to_lowercase(),
        }
    }
}

fn parse_whisper_json(json: &str) -> Result<WhisperOutput> {
    serde_json::from_str(json)
        .map_err(|e| PodtextError::Transcription(format!("invalid whisper output: {e}")))
}
