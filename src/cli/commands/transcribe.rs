//! Transcribe command implementation.

use crate::cli::Output;
use crate::config::Config;
use crate::error::PodtextError;
use crate::pipeline::{Orchestrator, TranscribeOptions};
use anyhow::Result;

/// Run the transcribe command over one or more episode indices.
///
/// Returns an error when any episode fails, so the process exits
/// non-zero; every valid entry still runs to completion first.
#[allow(clippy::too_many_arguments)]
pub async fn run_transcribe(
    feed_url: &str,
    indices: &[usize],
    model: Option<String>,
    output_dir: Option<String>,
    skip_language_check: bool,
    overwrite: bool,
    mut config: Config,
) -> Result<()> {
    if indices.iter().any(|&i| i == 0) {
        return Err(PodtextError::InvalidInput(
            "episode indices are 1-based and must be positive".to_string(),
        )
        .into());
    }

    // Command-line flags take priority over every config source.
    if let Some(model) = model {
        config.whisper.model = model;
    }
    if let Some(output_dir) = output_dir {
        config.storage.output_dir = output_dir;
    }

    for warning in config.validate() {
        Output::warning(&warning);
    }

    let orchestrator = Orchestrator::new(config);
    let opts = TranscribeOptions {
        skip_language_check,
        overwrite,
    };

    let results = orchestrator.transcribe_batch(feed_url, indices, &opts).await;

    println!();
    let mut failures = 0;
    for result in &results {
        match &result.outcome {
            Ok(output) => {
                Output::success(&format!(
                    "Episode {}: {}",
                    result.index,
                    output.path.display()
                ));
                if !output.summary.is_empty() {
                    Output::kv("Summary", &preview(&output.summary, 200));
                }
                if !output.keywords.is_empty() {
                    let keywords: Vec<&str> = output
                        .keywords
                        .iter()
                        .take(10)
                        .map(String::as_str)
                        .collect();
                    Output::kv("Keywords", &keywords.join(", "));
                }
            }
            Err(cause) => {
                failures += 1;
                Output::error(&format!("Episode {}: {}", result.index, cause));
            }
        }
    }

    let successes = results.len() - failures;
    println!();
    Output::info(&format!(
        "Batch complete: {successes} succeeded, {failures} failed"
    ));

    if failures > 0 {
        return Err(anyhow::anyhow!("{failures} episode(s) failed"));
    }

    Ok(())
}

/// Truncate a string to `max_chars`, appending an ellipsis if cut.
fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncation() {
        assert_eq!(preview("short", 200), "short");
        let long = "a".repeat(250);
        let out = preview(&long, 200);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
    }
}
