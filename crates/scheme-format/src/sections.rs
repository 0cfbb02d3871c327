use serde::Serialize;

use crate::registry::{emoji_len, SectionKind};
use crate::render::{escape_html, render_markdown};

const MAX_TITLE_CHARS: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemeSection {
    pub kind: SectionKind,
    pub title: String,
    /// Raw (unrendered) text between this header and the next.
    pub content: String,
}

/// Result of splitting a scheme body.
///
/// `sections` is empty when no header was recognized; `leading` then holds
/// the whole body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionSplit {
    pub leading: Option<String>,
    pub sections: Vec<SchemeSection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderToken {
    kind: SectionKind,
    title: String,
    start: usize,
    end: usize,
}

/// Single left-to-right scan for `<emoji> **Title**` headers; each section
/// runs up to the next header.
pub fn split_sections(body: &str) -> SectionSplit {
    let headers = scan_headers(body);
    let Some(first) = headers.first() else {
        return SectionSplit {
            leading: non_blank(body),
            sections: Vec::new(),
        };
    };

    let leading = non_blank(&body[..first.start]);
    let sections = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let end = headers.get(i + 1).map_or(body.len(), |next| next.start);
            SchemeSection {
                kind: header.kind.clone(),
                title: header.title.clone(),
                content: body[header.end..end].trim().to_string(),
            }
        })
        .collect();

    SectionSplit { leading, sections }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn scan_headers(body: &str) -> Vec<HeaderToken> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < body.len() {
        let rest = &body[pos..];
        if let Some(token) = header_at(rest, pos) {
            pos = token.end;
            tokens.push(token);
            continue;
        }
        pos += rest.chars().next().map_or(1, char::len_utf8);
    }
    tokens
}

/// Try to read `emoji **title**[:]` at the start of `s`; `base` is the offset
/// of `s` inside the body.
fn header_at(s: &str, base: usize) -> Option<HeaderToken> {
    let emoji_end = emoji_len(s)?;
    let emoji = &s[..emoji_end];

    let after_emoji = &s[emoji_end..];
    let gap = after_emoji.len() - after_emoji.trim_start_matches([' ', '\t']).len();
    let open = emoji_end + gap;
    let title_start = open + s[open..].strip_prefix("**").map(|_| 2)?;

    let close_rel = s[title_start..].find("**")?;
    let raw_title = &s[title_start..title_start + close_rel];
    if raw_title.is_empty()
        || raw_title.contains(['*', '\n'])
        || raw_title.chars().count() > MAX_TITLE_CHARS
    {
        return None;
    }

    let mut end = title_start + close_rel + 2;
    let tail = &s[end..];
    let tail_gap = tail.len() - tail.trim_start_matches([' ', '\t']).len();
    if tail[tail_gap..].starts_with(':') {
        end += tail_gap + 1;
    }

    let title = raw_title.trim().trim_end_matches(':').trim_end().to_string();
    if title.is_empty() {
        return None;
    }

    Some(HeaderToken {
        kind: SectionKind::from_emoji(emoji),
        title,
        start: base,
        end: base + end,
    })
}

/// Render a split body: each section becomes a titled block, text before the
/// first header an untitled intro block. A body without headers is rendered
/// whole as a single untitled block.
pub fn render_split(split: &SectionSplit) -> String {
    let mut blocks = Vec::new();

    if let Some(leading) = &split.leading {
        let class = if split.sections.is_empty() {
            "scheme-section"
        } else {
            "scheme-section section-intro"
        };
        blocks.push(format!(
            r#"<div class="{class}"><div class="section-content">{}</div></div>"#,
            render_markdown(leading)
        ));
    }

    for section in &split.sections {
        blocks.push(format!(
            concat!(
                r#"<div class="scheme-section section-{class}">"#,
                r#"<div class="section-title"><span class="section-icon">{icon}</span> {title}</div>"#,
                r#"<div class="section-content">{content}</div>"#,
                "</div>"
            ),
            class = section.kind.css_class(),
            icon = section.kind.emoji(),
            title = escape_html(&section.title),
            content = render_markdown(&section.content),
        ));
    }

    blocks.join("\n")
}
