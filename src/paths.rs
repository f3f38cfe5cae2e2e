//! Filesystem-safe name construction.

/// Characters that are never allowed in a path component.
const FORBIDDEN: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Default maximum length for a sanitized path component, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 30;

/// Turn an arbitrary string into a filesystem-safe path component.
///
/// Forbidden characters and ASCII control characters become `_`, runs of
/// underscores collapse, and the result is trimmed and bounded to
/// `max_length` characters, preferring to cut at a word boundary. An empty
/// result yields `fallback` instead.
///
/// The function is idempotent: `sanitize(sanitize(s)) == sanitize(s)`.
pub fn sanitize(name: &str, max_length: usize, fallback: &str) -> String {
    let mut collapsed = String::with_capacity(name.len());
    let mut prev_underscore = false;
    for c in name.chars() {
        let c = if FORBIDDEN.contains(&c) || c.is_ascii_control() {
            '_'
        } else {
            c
        };
        if c == '_' {
            if !prev_underscore {
                collapsed.push(c);
            }
            prev_underscore = true;
        } else {
            collapsed.push(c);
            prev_underscore = false;
        }
    }

    let trimmed = collapsed.trim_matches(|c: char| c.is_whitespace() || c == '_');

    let chars: Vec<char> = trimmed.chars().collect();
    let truncated: String = if chars.len() > max_length {
        // Prefer cutting at a space or underscore in the upper half of the
        // allowed range, nearest to the limit.
        let lower = max_length / 2;
        let cut = (lower..=max_length)
            .rev()
            .find(|&p| chars[p] == ' ' || chars[p] == '_')
            .unwrap_or(max_length);
        chars[..cut].iter().collect()
    } else {
        trimmed.to_string()
    };

    let result = truncated.trim_end_matches(|c: char| c.is_whitespace() || c == '_');

    if result.is_empty() {
        fallback.to_string()
    } else {
        result.to_string()
    }
}
