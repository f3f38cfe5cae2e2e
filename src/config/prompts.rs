//! Prompt templates for transcript analysis.
//!
//! Prompts live in a user-editable markdown file whose top-level headings
//! name the four analysis operations. A missing or malformed file falls
//! back to the built-in defaults with a warning; edits take effect on the
//! next process start.

use regex::Regex;
use std::path::Path;
use tracing::warn;

/// Container for the four analysis prompt templates.
///
/// Templates reference the transcript with the `{{transcript}}` placeholder.
#[derive(Debug, Clone)]
pub struct AnalysisPrompts {
    pub advertisement_detection: String,
    pub content_summary: String,
    pub topic_extraction: String,
    pub keyword_extraction: String,
}

impl Default for AnalysisPrompts {
    fn default() -> Self {
        Self {
            advertisement_detection: r#"Analyze the following podcast transcript and identify advertising sections.

For each advertisement section, provide:
1. The start position (character index) in the text
2. The end position (character index) in the text
3. A confidence score between 0.0 and 1.0

Only mark sections you are confident are advertisements. These include:
- Explicit sponsor reads ("This episode is brought to you by...")
- Product promotions with promo codes
- Service endorsements with special offers

Return the results as JSON in this format:
{"advertisements": [{"start": 0, "end": 100, "confidence": 0.95}]}

If no advertisements are found, return: {"advertisements": []}

Transcript:
{{transcript}}"#
                .to_string(),

            content_summary: r#"Summarize the following podcast transcript in 2-3 sentences.
Focus on the main topic and key takeaways.

Transcript:
{{transcript}}"#
                .to_string(),

            topic_extraction: r#"List the main topics covered in this podcast transcript.
For each topic, provide a single sentence description.
Return as a JSON array of strings.

Format: ["Topic 1: Brief description", "Topic 2: Brief description"]

Transcript:
{{transcript}}"#
                .to_string(),

            keyword_extraction: r#"Extract relevant keywords from this podcast transcript.
Include names, concepts, technologies, and important terms.
Return as a JSON array of strings, maximum 20 keywords.

Format: ["keyword1", "keyword2", "keyword3"]

Transcript:
{{transcript}}"#
                .to_string(),
        }
    }
}

impl AnalysisPrompts {
    /// Load prompts from the markdown file at `path`.
    ///
    /// Falls back to the built-in defaults (with a warning) when the file
    /// is missing, unreadable, or does not contain all four sections.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            warn!(
                "Prompts file not found at {}. Using default prompts.",
                path.display()
            );
            return Self::default();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Failed to read prompts file {}: {}. Using default prompts.",
                    path.display(),
                    e
                );
                return Self::default();
            }
        };

        match Self::parse_markdown(&content) {
            Some(prompts) => prompts,
            None => {
                warn!(
                    "Prompts file {} is malformed. Using default prompts.",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Parse the prompt file: `# Heading` lines delimit sections, and all
    /// four known headings must be present with non-empty bodies.
    fn parse_markdown(content: &str) -> Option<Self> {
        let heading = Regex::new(r"(?m)^#\s+(.+?)\s*$").expect("valid regex");

        // (lowercased title, heading start, body start) per section.
        let sections: Vec<(String, usize, usize)> = heading
            .captures_iter(content)
            .map(|caps| {
                let whole = caps.get(0).expect("match");
                let title = caps.get(1).expect("group").as_str().to_lowercase();
                (title, whole.start(), whole.end())
            })
            .collect();

        let lookup = |name: &str| -> Option<String> {
            let pos = sections.iter().position(|(title, _, _)| title == name)?;
            let body_start = sections[pos].2;
            let body_end = sections
                .get(pos + 1)
                .map(|(_, next_heading, _)| *next_heading)
                .unwrap_or(content.len());
            let body = content[body_start..body_end].trim();
            if body.is_empty() {
                None
            } else {
                Some(body.to_string())
            }
        };

        Some(Self {
            advertisement_detection: lookup("advertisement detection")?,
            content_summary: lookup("content summary")?,
            topic_extraction: lookup("topic extraction")?,
            keyword_extraction: lookup("keyword extraction")?,
        })
    }

    /// Render the default prompt file content for bootstrapping.
    pub fn default_file_content() -> String {
        let defaults = Self::default();
        format!(
            "# Advertisement Detection\n\n{}\n\n# Content Summary\n\n{}\n\n\
             # Topic Extraction\n\n{}\n\n# Keyword Extraction\n\n{}\n",
            defaults.advertisement_detection,
            defaults.content_summary,
            defaults.topic_extraction,
            defaults.keyword_extraction,
        )
    }

    /// Write the default prompt file if it does not already exist.
    pub fn ensure_file_exists(path: &Path) -> std::io::Result<()> {
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::default_file_content())
    }
}

/// Substitute the transcript into a prompt template.
pub fn render_prompt(template: &str, transcript: &str) -> String {
    template.replace("{{transcript}}", transcript)
}
