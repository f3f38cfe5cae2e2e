//! HTML to Markdown conversion for show notes.
//!
//! A small streaming scanner feeds a stack-based emitter. The supported
//! grammar is the subset podcast feeds actually use (links, paragraphs,
//! emphasis, headings, lists, inline code); unknown tags are stripped
//! with their inner text preserved. Malformed input never fails: stray
//! `<` are literal text and unclosed tags flatten at end of input.

use std::sync::OnceLock;

use regex::Regex;

/// Convert an HTML-bearing string to Markdown.
///
/// Input containing no `<` is returned verbatim.
pub fn html_to_markdown(input: &str) -> String {
    if !input.contains('<') {
        return input.to_string();
    }

    let mut converter = Converter::new();
    converter.run(input);
    converter.finish()
}

#[derive(Debug, PartialEq)]
enum FrameKind {
    Root,
    Anchor(String),
    Strong,
    Em,
    Code,
    Heading(usize),
    ListItem,
}

struct Frame {
    kind: FrameKind,
    buf: String,
}

struct ListCtx {
    ordered: bool,
    counter: usize,
}

struct Converter {
    frames: Vec<Frame>,
    lists: Vec<ListCtx>,
}

impl Converter {
    fn new() -> Self {
        Self {
            frames: vec![Frame {
                kind: FrameKind::Root,
                buf: String::new(),
            }],
            lists: Vec::new(),
        }
    }

    fn run(&mut self, input: &str) {
        let mut i = 0;
        while i < input.len() {
            let rest = &input[i..];
            let Some(lt) = rest.find('<') else {
                self.text(rest);
                break;
            };

            if lt > 0 {
                self.text(&rest[..lt]);
            }

            let tag_rest = &rest[lt..];

            // Only a letter, '/', '!', or '?' after '<' starts markup; a
            // bare '<' (as in "5 < 6") is literal text.
            let starts_tag = matches!(
                tag_rest[1..].chars().next(),
                Some(c) if c.is_ascii_alphabetic() || c == '/' || c == '!' || c == '?'
            );
            if !starts_tag {
                self.text("<");
                i += lt + 1;
                continue;
            }

            if tag_rest.starts_with("<!--") {
                match tag_rest.find("-->") {
                    Some(end) => i += lt + end + 3,
                    None => break,
                }
                continue;
            }

            match tag_rest.find('>') {
                Some(gt) => {
                    self.tag(&tag_rest[1..gt]);
                    i += lt + gt + 1;
                }
                None => {
                    // No closing '>': treat the '<' as literal text.
                    self.text("<");
                    i += lt + 1;
                }
            }
        }
    }

    fn finish(mut self) -> String {
        // Flatten anything left open, innermost first, unwrapped.
        while self.frames.len() > 1 {
            let frame = self.frames.pop().expect("frame");
            self.top().push_str(&frame.buf);
        }

        let out = self.frames.pop().expect("root").buf;
        collapse_newlines(&out)
            .trim_start_matches('\n')
            .trim_end()
            .to_string()
    }

    fn top(&mut self) -> &mut String {
        &mut self.frames.last_mut().expect("frame").buf
    }

    fn text(&mut self, raw: &str) {
        // Indentation between list tags is layout, not content.
        if !self.lists.is_empty()
            && self.frames.len() == 1
            && raw.trim().is_empty()
        {
            return;
        }
        let decoded = decode_entities(raw);
        self.top().push_str(&decoded);
    }

    fn tag(&mut self, inner: &str) {
        let inner = inner.trim();
        if inner.is_empty() || inner.starts_with('!') || inner.starts_with('?') {
            return;
        }

        if let Some(rest) = inner.strip_prefix('/') {
            let name = rest
                .split_whitespace()
                .next()
                .unwrap_or("")
                .to_lowercase();
            self.close_tag(&name);
        } else {
            let self_closing = inner.ends_with('/');
            let inner = inner.strip_suffix('/').unwrap_or(inner).trim_end();
            let mut parts = inner.splitn(2, char::is_whitespace);
            let name = parts.next().unwrap_or("").to_lowercase();
            let attrs = parts.next().unwrap_or("");
            self.open_tag(&name, attrs, self_closing);
        }
    }

    fn open_tag(&mut self, name: &str, attrs: &str, self_closing: bool) {
        if name == "br" {
            self.top().push('\n');
            return;
        }
        if self_closing {
            return;
        }

        match name {
            "p" => self.paragraph_break(),
            "strong" | "b" => self.push_frame(FrameKind::Strong),
            "em" | "i" => self.push_frame(FrameKind::Em),
            "code" => self.push_frame(FrameKind::Code),
            "a" => self.push_frame(FrameKind::Anchor(extract_href(attrs))),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse().unwrap_or(1);
                self.push_frame(FrameKind::Heading(level));
            }
            "ul" => self.lists.push(ListCtx {
                ordered: false,
                counter: 0,
            }),
            "ol" => self.lists.push(ListCtx {
                ordered: true,
                counter: 0,
            }),
            "li" => self.push_frame(FrameKind::ListItem),
            _ => {}
        }
    }

    fn close_tag(&mut self, name: &str) {
        match name {
            "p" => self.paragraph_break(),
            "strong" | "b" => self.close_kind(|k| *k == FrameKind::Strong),
            "em" | "i" => self.close_kind(|k| *k == FrameKind::Em),
            "code" => self.close_kind(|k| *k == FrameKind::Code),
            "a" => self.close_kind(|k| matches!(k, FrameKind::Anchor(_))),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.close_kind(|k| matches!(k, FrameKind::Heading(_)))
            }
            "li" => self.close_kind(|k| *k == FrameKind::ListItem),
            "ul" | "ol" => {
                // An unclosed <li> closes with its list.
                if self
                    .frames
                    .last()
                    .is_some_and(|f| f.kind == FrameKind::ListItem)
                {
                    self.close_frame();
                }
                self.lists.pop();
            }
            _ => {}
        }
    }

    fn push_frame(&mut self, kind: FrameKind) {
        self.frames.push(Frame {
            kind,
            buf: String::new(),
        });
    }

    /// Close the topmost frame matching `pred`, flattening any frames
    /// left open above it. A close with no matching open is ignored.
    fn close_kind(&mut self, pred: impl Fn(&FrameKind) -> bool) {
        let Some(target) = self
            .frames
            .iter()
            .rposition(|f| pred(&f.kind) && f.kind != FrameKind::Root)
        else {
            return;
        };

        while self.frames.len() > target + 1 {
            let frame = self.frames.pop().expect("frame");
            self.top().push_str(&frame.buf);
        }
        self.close_frame();
    }

    /// Pop the top frame and append its wrapped content to the parent.
    fn close_frame(&mut self) {
        let frame = self.frames.pop().expect("frame");
        let rendered = match frame.kind {
            FrameKind::Root => frame.buf,
            FrameKind::Strong => wrap_inline(&frame.buf, "**"),
            FrameKind::Em => wrap_inline(&frame.buf, "*"),
            FrameKind::Code => wrap_inline(&frame.buf, "`"),
            FrameKind::Anchor(href) => {
                if href.is_empty() {
                    frame.buf
                } else if frame.buf.is_empty() {
                    String::new()
                } else {
                    format!("[{}]({})", frame.buf, href)
                }
            }
            FrameKind::Heading(level) => {
                let content = frame.buf.trim();
                if content.is_empty() {
                    String::new()
                } else {
                    self.paragraph_break();
                    format!("{} {}\n\n", "#".repeat(level), content)
                }
            }
            FrameKind::ListItem => {
                let content = frame.buf.trim();
                let prefix = match self.lists.last_mut() {
                    Some(ctx) if ctx.ordered => {
                        ctx.counter += 1;
                        format!("{}. ", ctx.counter)
                    }
                    _ => "- ".to_string(),
                };
                format!("{prefix}{content}\n")
            }
        };
        self.top().push_str(&rendered);
    }

    /// Ensure the current buffer ends a block (`\n\n`), unless empty.
    fn paragraph_break(&mut self) {
        let buf = self.top();
        if buf.is_empty() || buf.ends_with("\n\n") {
            return;
        }
        if buf.ends_with('\n') {
            buf.push('\n');
        } else {
            buf.push_str("\n\n");
        }
    }
}

fn wrap_inline(content: &str, marker: &str) -> String {
    if content.is_empty() {
        String::new()
    } else {
        format!("{marker}{content}{marker}")
    }
}

/// Extract the href attribute value, if any.
fn extract_href(attrs: &str) -> String {
    static HREF: OnceLock<Regex> = OnceLock::new();
    let re = HREF.get_or_init(|| {
        Regex::new(r#"(?i)href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).expect("valid regex")
    });

    re.captures(attrs)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Decode the HTML entities the grammar recognizes; unknown entities
/// pass through literally.
fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];

        let decoded = after[1..]
            .find(';')
            .filter(|&semi| semi > 0 && semi <= 31)
            .and_then(|semi| {
                decode_entity_name(&after[1..1 + semi]).map(|text| (text, semi))
            });

        match decoded {
            Some((text, semi)) => {
                out.push_str(&text);
                rest = &after[semi + 2..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity_name(name: &str) -> Option<String> {
    match name {
        "amp" => Some("&".to_string()),
        "lt" => Some("<".to_string()),
        "gt" => Some(">".to_string()),
        "quot" => Some("\"".to_string()),
        "apos" => Some("'".to_string()),
        "nbsp" => Some(" ".to_string()),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = if let Some(hex) = num.strip_prefix(['x', 'X']) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                num.parse::<u32>().ok()?
            };
            char::from_u32(code).map(String::from)
        }
    }
}

/// Collapse runs of three or more newlines down to two.
fn collapse_newlines(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut run = 0;
    for c in input.chars() {
        if c == '\n' {
            run += 1;
            if run <= 2 {
                out.push(c);
            }
        } else {
            run = 0;
            out.push(c);
        }
    }
    out
}
