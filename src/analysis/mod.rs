//! AI-powered transcript analysis.
//!
//! The [`AnalysisEngine`] drives the LLM port through four prompts
//! (summary, topics, keywords, advertisement detection). Each sub-call is
//! independent: a failure leaves that field empty and records a warning,
//! so an unreachable backend never fails the pipeline.

mod claude;

pub use claude::{ClaudeClient, LLMClient};

use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use crate::config::{render_prompt, AnalysisPrompts};

/// Marker inserted in place of an excised advertisement.
pub const AD_REMOVED_MARKER: &str = "[ADVERTISEMENT WAS REMOVED]";

const SUMMARY_MAX_TOKENS: u32 = 1024;
const TOPICS_MAX_TOKENS: u32 = 2048;
const KEYWORDS_MAX_TOKENS: u32 = 1024;
const ADS_MAX_TOKENS: u32 = 4096;

/// A detected advertisement span: character indices into the analyzed
/// text, half-open, with a confidence score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AdSpan {
    pub start_char: usize,
    pub end_char: usize,
    pub confidence: f64,
}

/// Result of analyzing one transcript. Any field may be empty when the
/// corresponding sub-call failed.
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    pub summary: String,
    pub topics: Vec<String>,
    pub keywords: Vec<String>,
    /// Detected ad spans, ordered by start position.
    pub ad_spans: Vec<AdSpan>,
}

/// Drives the LLM port through the four analysis prompts.
pub struct AnalysisEngine {
    client: Arc<dyn LLMClient>,
    prompts: AnalysisPrompts,
}

impl AnalysisEngine {
    pub fn new(client: Arc<dyn LLMClient>, prompts: AnalysisPrompts) -> Self {
        Self { client, prompts }
    }

    /// Analyze a transcript. Never fails: sub-call errors degrade to
    /// empty fields with a warning.
    pub async fn analyze(&self, transcript_text: &str) -> AnalysisResult {
        let summary = match self
            .client
            .complete(
                &render_prompt(&self.prompts.content_summary, transcript_text),
                SUMMARY_MAX_TOKENS,
            )
            .await
        {
            Ok(response) => response.trim().to_string(),
            Err(e) => {
                warn!("Summary generation failed: {e}");
                String::new()
            }
        };

        let topics = match self
            .client
            .complete(
                &render_prompt(&self.prompts.topic_extraction, transcript_text),
                TOPICS_MAX_TOKENS,
            )
            .await
        {
            Ok(response) => extract_string_array(&response),
            Err(e) => {
                warn!("Topic extraction failed: {e}");
                Vec::new()
            }
        };

        let keywords = match self
            .client
            .complete(
                &render_prompt(&self.prompts.keyword_extraction, transcript_text),
                KEYWORDS_MAX_TOKENS,
            )
            .await
        {
            Ok(response) => dedup_preserving_order(extract_string_array(&response)),
            Err(e) => {
                warn!("Keyword extraction failed: {e}");
                Vec::new()
            }
        };

        let ad_spans = match self
            .client
            .complete(
                &render_prompt(&self.prompts.advertisement_detection, transcript_text),
                ADS_MAX_TOKENS,
            )
            .await
        {
            Ok(response) => parse_ad_spans(&response, transcript_text.chars().count()),
            Err(e) => {
                warn!("Advertisement detection failed: {e}");
                Vec::new()
            }
        };

        AnalysisResult {
            summary,
            topics,
            keywords,
            ad_spans,
        }
    }
}

/// Remove ad spans at or above `threshold` from `text`, replacing each
/// surviving (overlap-merged) span with [`AD_REMOVED_MARKER`].
///
/// Span positions are character indices into `text`; replacement walks
/// from the end so earlier positions stay valid.
pub fn apply_ad_excision(text: &str, spans: &[AdSpan], threshold: f64) -> String {
    let char_count = text.chars().count();

    let mut surviving: Vec<(usize, usize)> = spans
        .iter()
        .filter(|s| s.confidence >= threshold)
        .map(|s| (s.start_char, s.end_char.min(char_count)))
        .filter(|&(start, end)| start < end)
        .collect();

    if surviving.is_empty() {
        return text.to_string();
    }

    surviving.sort_unstable();

    let mut merged: Vec<(usize, usize)> = Vec::new();
    for (start, end) in surviving {
        match merged.last_mut() {
            Some((_, last_end)) if start < *last_end => {
                *last_end = (*last_end).max(end);
            }
            _ => merged.push((start, end)),
        }
    }

    // Byte offset of every char position, plus the end of the string.
    let byte_offsets: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();

    let mut result = text.to_string();
    for &(start, end) in merged.iter().rev() {
        result.replace_range(byte_offsets[start]..byte_offsets[end], AD_REMOVED_MARKER);
    }

    result
}

/// Pull a JSON array of strings out of an LLM response, tolerating
/// surrounding prose. Non-strings and empty strings are dropped.
fn extract_string_array(response: &str) -> Vec<String> {
    let start = match response.find('[') {
        Some(pos) => pos,
        None => return Vec::new(),
    };
    let end = match response.rfind(']') {
        Some(pos) if pos > start => pos + 1,
        _ => return Vec::new(),
    };

    let items: Vec<serde_json::Value> = match serde_json::from_str(&response[start..end]) {
        Ok(items) => items,
        Err(_) => return Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => {
                let s = s.trim().to_string();
                if s.is_empty() {
                    None
                } else {
                    Some(s)
                }
            }
            _ => None,
        })
        .collect()
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[derive(Deserialize)]
struct RawAdList {
    #[serde(default)]
    advertisements: Vec<RawAdSpan>,
}

#[derive(Deserialize)]
struct RawAdSpan {
    start: i64,
    end: i64,
    #[serde(default)]
    confidence: f64,
}

/// Parse the advertisement-detection response into validated spans.
///
/// Accepts either the documented `{"advertisements": [...]}` object or a
/// bare JSON array. Spans outside the text or with inverted bounds are
/// dropped with a warning.
fn parse_ad_spans(response: &str, text_char_count: usize) -> Vec<AdSpan> {
    let raw = extract_raw_spans(response);

    let mut spans: Vec<AdSpan> = raw
        .into_iter()
        .filter_map(|r| {
            if r.start < 0 || r.end <= r.start || r.end as usize > text_char_count {
                warn!(
                    "Ignoring invalid ad span [{}, {}) for text of length {}",
                    r.start, r.end, text_char_count
                );
                return None;
            }
            Some(AdSpan {
                start_char: r.start as usize,
                end_char: r.end as usize,
                confidence: r.confidence.clamp(0.0, 1.0),
            })
        })
        .collect();

    spans.sort_by_key(|s| s.start_char);
    spans
}

fn extract_raw_spans(response: &str) -> Vec<RawAdSpan> {
    if let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) {
        if end > start {
            if let Ok(list) = serde_json::from_str::<RawAdList>(&response[start..=end]) {
                return list.advertisements;
            }
        }
    }

    if let (Some(start), Some(end)) = (response.find('['), response.rfind(']')) {
        if end > start {
            if let Ok(list) = serde_json::from_str::<Vec<RawAdSpan>>(&response[start..=end]) {
                return list;
            }
        }
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PodtextError, Result};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// LLM stub answering from a fixed queue, one entry per call.
    struct ScriptedClient {
        responses: Mutex<VecDeque<Result<String>>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(VecDeque::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LLMClient for ScriptedClient {
        async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(PodtextError::AnalysisUnavailable("backend down".into()))
                })
        }
    }

    fn engine(client: Arc<dyn LLMClient>) -> AnalysisEngine {
        AnalysisEngine::new(client, AnalysisPrompts::default())
    }

    #[tokio::test]
    async fn test_analyze_full_success() {
        let client = ScriptedClient::new(vec![
            Ok("A concise summary.".to_string()),
            Ok(r#"["Topic one: intro", "Topic two: outro"]"#.to_string()),
            Ok(r#"Here are the keywords: ["rust", "podcasts", "rust"]"#.to_string()),
            Ok(r#"{"advertisements": [{"start": 0, "end": 5, "confidence": 0.95}]}"#.to_string()),
        ]);

        let result = engine(client).analyze("some transcript text").await;
        assert_eq!(result.summary, "A concise summary.");
        assert_eq!(result.topics, vec!["Topic one: intro", "Topic two: outro"]);
        assert_eq!(result.keywords, vec!["rust", "podcasts"]);
        assert_eq!(
            result.ad_spans,
            vec![AdSpan {
                start_char: 0,
                end_char: 5,
                confidence: 0.95
            }]
        );
    }

    #[tokio::test]
    async fn test_analyze_all_failures_yields_empty_result() {
        let result = engine(ScriptedClient::failing()).analyze("text").await;
        assert!(result.summary.is_empty());
        assert!(result.topics.is_empty());
        assert!(result.keywords.is_empty());
        assert!(result.ad_spans.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_partial_failure_keeps_other_fields() {
        let client = ScriptedClient::new(vec![
            Ok("Summary text.".to_string()),
            Err(PodtextError::AnalysisUnavailable("rate limited".into())),
            Ok(r#"["keyword"]"#.to_string()),
            Ok(r#"{"advertisements": []}"#.to_string()),
        ]);

        let result = engine(client).analyze("text").await;
        assert_eq!(result.summary, "Summary text.");
        assert!(result.topics.is_empty());
        assert_eq!(result.keywords, vec!["keyword"]);
    }

    #[tokio::test]
    async fn test_analyze_unparsable_json_yields_empty_fields() {
        let client = ScriptedClient::new(vec![
            Ok("Summary.".to_string()),
            Ok("I could not find any topics, sorry!".to_string()),
            Ok("no json here either".to_string()),
            Ok("nothing".to_string()),
        ]);

        let result = engine(client).analyze("text").await;
        assert_eq!(result.summary, "Summary.");
        assert!(result.topics.is_empty());
        assert!(result.keywords.is_empty());
        assert!(result.ad_spans.is_empty());
    }

    #[test]
    fn test_extract_string_array_filters_empty() {
        let items = extract_string_array(r#"["a", "", "  ", "b", 42]"#);
        assert_eq!(items, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_ad_spans_bare_array() {
        let spans = parse_ad_spans(r#"[{"start": 2, "end": 4, "confidence": 1.5}]"#, 10);
        assert_eq!(
            spans,
            vec![AdSpan {
                start_char: 2,
                end_char: 4,
                confidence: 1.0
            }]
        );
    }

    #[test]
    fn test_parse_ad_spans_drops_invalid() {
        let response = r#"{"advertisements": [
            {"start": 5, "end": 3, "confidence": 0.9},
            {"start": -1, "end": 3, "confidence": 0.9},
            {"start": 0, "end": 99, "confidence": 0.9},
            {"start": 6, "end": 8, "confidence": 0.9},
            {"start": 1, "end": 4, "confidence": 0.9}
        ]}"#;

        let spans = parse_ad_spans(response, 10);
        assert_eq!(spans.len(), 2);
        // Sorted by start.
        assert_eq!(spans[0].start_char, 1);
        assert_eq!(spans[1].start_char, 6);
    }

    #[test]
    fn test_excision_threshold() {
        // S4: "A B C D E", spans [0,3)@0.95 and [6,9)@0.80, threshold 0.9.
        let text = "A B C D E";
        let spans = vec![
            AdSpan {
                start_char: 0,
                end_char: 3,
                confidence: 0.95,
            },
            AdSpan {
                start_char: 6,
                end_char: 9,
                confidence: 0.80,
            },
        ];

        let edited = apply_ad_excision(text, &spans, 0.9);
        assert_eq!(edited, format!("{AD_REMOVED_MARKER} C D E"));
        assert_eq!(edited.matches(AD_REMOVED_MARKER).count(), 1);
    }

    #[test]
    fn test_excision_at_threshold_survives() {
        let spans = vec![AdSpan {
            start_char: 0,
            end_char: 3,
            confidence: 0.9,
        }];
        let edited = apply_ad_excision("abc def", &spans, 0.9);
        assert_eq!(edited, format!("{AD_REMOVED_MARKER} def"));
    }

    #[test]
    fn test_excision_merges_overlaps() {
        let text = "0123456789";
        let spans = vec![
            AdSpan {
                start_char: 4,
                end_char: 8,
                confidence: 0.95,
            },
            AdSpan {
                start_char: 2,
                end_char: 6,
                confidence: 0.95,
            },
        ];

        let edited = apply_ad_excision(text, &spans, 0.9);
        assert_eq!(edited, format!("01{AD_REMOVED_MARKER}89"));
        assert_eq!(edited.matches(AD_REMOVED_MARKER).count(), 1);
    }

    #[test]
    fn test_excision_adjacent_spans_stay_separate() {
        let text = "0123456789";
        let spans = vec![
            AdSpan {
                start_char: 0,
                end_char: 3,
                confidence: 0.95,
            },
            AdSpan {
                start_char: 3,
                end_char: 6,
                confidence: 0.95,
            },
        ];

        let edited = apply_ad_excision(text, &spans, 0.9);
        assert_eq!(edited.matches(AD_REMOVED_MARKER).count(), 2);
        assert_eq!(edited, format!("{AD_REMOVED_MARKER}{AD_REMOVED_MARKER}6789"));
    }

    #[test]
    fn test_excision_removes_original_bytes() {
        let text = "keep SPONSORED SEGMENT keep";
        let spans = vec![AdSpan {
            start_char: 5,
            end_char: 22,
            confidence: 0.99,
        }];

        let edited = apply_ad_excision(text, &spans, 0.9);
        assert!(!edited.contains("SPONSORED SEGMENT"));
        assert!(edited.starts_with("keep "));
        assert!(edited.ends_with(" keep"));
    }

    #[test]
    fn test_excision_multibyte_text() {
        // Char indices, not byte indices.
        let text = "æøå reklame her æøå";
        let spans = vec![AdSpan {
            start_char: 4,
            end_char: 15,
            confidence: 0.95,
        }];

        let edited = apply_ad_excision(text, &spans, 0.9);
        assert_eq!(edited, format!("æøå {AD_REMOVED_MARKER} æøå"));
    }

    #[test]
    fn test_excision_clamps_end_to_text() {
        let spans = vec![AdSpan {
            start_char: 4,
            end_char: 500,
            confidence: 0.95,
        }];
        let edited = apply_ad_excision("0123456789", &spans, 0.9);
        assert_eq!(edited, format!("0123{AD_REMOVED_MARKER}"));
    }

    #[test]
    fn test_excision_no_spans_is_identity() {
        assert_eq!(apply_ad_excision("unchanged", &[], 0.9), "unchanged");
    }
}
