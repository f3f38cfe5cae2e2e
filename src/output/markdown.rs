//! Markdown document rendering and persistence.
//!
//! Builds the output document: ordered YAML front matter between `---`
//! fences, the (possibly ad-excised) transcript body, and an optional
//! Show Notes section converted from the feed's HTML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::markup::html_to_markdown;
use crate::error::{PodtextError, Result};
use crate::paths::{sanitize, DEFAULT_MAX_LENGTH};

/// Maximum length of the rendered show notes, in characters.
const SHOW_NOTES_LIMIT: usize = 50_000;
/// Appended when show notes are cut at [`SHOW_NOTES_LIMIT`].
const TRUNCATION_NOTICE: &str = "[Content truncated]";

/// YAML front matter. Field order here is the serialization order;
/// optional fields are omitted when empty.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FrontMatter {
    pub title: String,
    /// Publication date, formatted `YYYY-MM-DD`.
    pub pub_date: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub podcast: String,
    pub feed_url: String,
    pub media_url: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub summary: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub topics: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub keywords: Vec<String>,
}

/// Render the complete markdown document.
///
/// `body` is the edited transcript text (paragraphs separated by blank
/// lines); `show_notes_html` is the raw episode description, converted
/// and truncated here.
pub fn render_document(
    front_matter: &FrontMatter,
    body: &str,
    show_notes_html: &str,
) -> Result<String> {
    let yaml = serde_yaml::to_string(front_matter)
        .map_err(|e| PodtextError::Write(format!("front matter serialization: {e}")))?;

    let mut content = format!("---\n{yaml}---\n\n{}\n", body.trim_end());

    if !show_notes_html.trim().is_empty() {
        let converted = html_to_markdown(show_notes_html);
        let converted = converted.trim();
        if !converted.is_empty() {
            content.push_str("\n## Show Notes\n\n");
            content.push_str(&truncate_show_notes(converted));
            content.push('\n');
        }
    }

    Ok(content)
}

fn truncate_show_notes(notes: &str) -> String {
    if notes.chars().count() <= SHOW_NOTES_LIMIT {
        return notes.to_string();
    }
    let cut: String = notes.chars().take(SHOW_NOTES_LIMIT).collect();
    format!("{}\n\n{TRUNCATION_NOTICE}", cut.trim_end())
}

/// Compute the output path for an episode:
/// `<output_dir>/<sanitized podcast>/<sanitized title>.md`.
pub fn output_path(
    output_dir: &Path,
    podcast_name: &str,
    episode_title: &str,
    episode_index: usize,
) -> PathBuf {
    let podcast_dir = sanitize(podcast_name, DEFAULT_MAX_LENGTH, "unknown-podcast");
    let file_stem = sanitize(
        episode_title,
        DEFAULT_MAX_LENGTH,
        &format!("episode_{episode_index}"),
    );
    output_dir.join(podcast_dir).join(format!("{file_stem}.md"))
}

/// Write the document to `path`, creating parent directories.
///
/// Refuses to overwrite an existing file unless `overwrite` is set; a
/// failed write removes the partial file.
pub fn write_document(path: &Path, content: &str, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        return Err(PodtextError::Write(format!(
            "{} already exists (use --overwrite to replace it)",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| PodtextError::Write(format!("{}: {e}", parent.display())))?;
    }

    if let Err(e) = std::fs::write(path, content) {
        let _ = std::fs::remove_file(path);
        return Err(PodtextError::Write(format!("{}: {e}", path.display())));
    }

    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn front_matter() -> FrontMatter {
        FrontMatter {
            title: "Episode 42: The Answer".to_string(),
            pub_date: "2024-01-15".to_string(),
            podcast: "My Podcast".to_string(),
            feed_url: "https://example.com/feed.xml".to_string(),
            media_url: "https://example.com/ep42.mp3".to_string(),
            summary: "What it all means.".to_string(),
            topics: vec!["Philosophy".to_string(), "Science".to_string()],
            keywords: vec!["meaning".to_string(), "universe".to_string()],
        }
    }

    #[test]
    fn test_field_order_in_yaml() {
        let yaml = serde_yaml::to_string(&front_matter()).unwrap();
        let positions: Vec<usize> = [
            "title:", "pub_date:", "podcast:", "feed_url:", "media_url:", "summary:",
            "topics:", "keywords:",
        ]
        .iter()
        .map(|key| yaml.find(key).unwrap_or_else(|| panic!("missing {key}")))
        .collect();

        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted, "front matter keys out of order:\n{yaml}");
    }

    #[test]
    fn test_empty_fields_omitted() {
        let fm = FrontMatter {
            title: "T".to_string(),
            pub_date: "2024-01-01".to_string(),
            feed_url: "https://example.com/feed".to_string(),
            media_url: "https://example.com/1.mp3".to_string(),
            ..FrontMatter::default()
        };

        let yaml = serde_yaml::to_string(&fm).unwrap();
        assert!(!yaml.contains("podcast:"));
        assert!(!yaml.contains("summary:"));
        assert!(!yaml.contains("topics:"));
        assert!(!yaml.contains("keywords:"));
    }

    #[test]
    fn test_front_matter_round_trip() {
        let original = FrontMatter {
            title: "Quotes \"inside\" and: colons #yes".to_string(),
            summary: "Multi\nline\nsummary".to_string(),
            podcast: "Ünïcødé 🎧".to_string(),
            ..front_matter()
        };

        let yaml = serde_yaml::to_string(&original).unwrap();
        let parsed: FrontMatter = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_render_document_structure() {
        let doc = render_document(&front_matter(), "Paragraph one.\n\nParagraph two.", "").unwrap();

        assert!(doc.starts_with("---\n"));
        let parts: Vec<&str> = doc.splitn(3, "---\n").collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[2].contains("Paragraph one.\n\nParagraph two."));
        assert!(!doc.contains("## Show Notes"));
    }

    #[test]
    fn test_render_document_front_matter_parses_back() {
        let doc = render_document(&front_matter(), "Body.", "").unwrap();
        let parts: Vec<&str> = doc.splitn(3, "---\n").collect();
        let parsed: FrontMatter = serde_yaml::from_str(parts[1]).unwrap();
        assert_eq!(parsed, front_matter());
    }

    #[test]
    fn test_render_document_show_notes() {
        let doc = render_document(&front_matter(), "Body.", "<p>C</p>").unwrap();
        assert!(doc.ends_with("## Show Notes\n\nC\n"));
    }

    #[test]
    fn test_show_notes_truncation() {
        let long = "x".repeat(SHOW_NOTES_LIMIT + 100);
        let out = truncate_show_notes(&long);
        assert!(out.ends_with(&format!("\n\n{TRUNCATION_NOTICE}")));
        assert!(out.chars().count() <= SHOW_NOTES_LIMIT + TRUNCATION_NOTICE.len() + 2);

        let short = "short notes";
        assert_eq!(truncate_show_notes(short), short);
    }

    #[test]
    fn test_output_path_layout() {
        let path = output_path(
            Path::new("/out"),
            "My Podcast: Extended",
            "Episode 1: Origins",
            1,
        );
        assert_eq!(
            path,
            Path::new("/out/My Podcast_ Extended/Episode 1_ Origins.md")
        );
    }

    #[test]
    fn test_output_path_fallbacks() {
        let path = output_path(Path::new("/out"), "", "///", 7);
        assert_eq!(path, Path::new("/out/unknown-podcast/episode_7.md"));
    }

    #[test]
    fn test_write_document_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pod").join("ep.md");

        write_document(&path, "first", false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");

        let err = write_document(&path, "second", false).unwrap_err();
        assert!(matches!(err, PodtextError::Write(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");

        write_document(&path, "third", true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "third");
    }
}
