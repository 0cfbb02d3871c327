use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::render::{escape_html, render_markdown};
use crate::score::{take_match_score, ScoreBand};
use crate::sections::{render_split, split_sections, SchemeSection, SectionSplit};

const BUILDING: char = '🏛';

static SCHEME_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^##[ \t]+(?:🏛\x{FE0F}?|\d+\.)").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedScheme {
    pub name: String,
    pub match_score: Option<u8>,
    #[serde(flatten)]
    pub body: SectionSplit,
}

impl ParsedScheme {
    pub fn sections(&self) -> &[SchemeSection] {
        &self.body.sections
    }

    pub fn score_band(&self) -> Option<ScoreBand> {
        self.match_score.map(ScoreBand::from_score)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParsedResponse {
    /// No scheme structure detected; the text is rendered as-is.
    Unstructured { text: String },
    Schemes {
        intro: Option<String>,
        schemes: Vec<ParsedScheme>,
    },
}

impl ParsedResponse {
    pub fn to_html(&self) -> String {
        match self {
            Self::Unstructured { text } => render_markdown(text),
            Self::Schemes { intro, schemes } => render_accordion(intro.as_deref(), schemes),
        }
    }
}

/// Schemes start at lines beginning `##` plus the building emoji or `N.`.
/// Fewer than two such headings and no building emoji anywhere means a
/// conversational reply, kept as plain text.
pub fn parse_response(text: &str) -> ParsedResponse {
    let starts: Vec<usize> = SCHEME_HEADING_RE
        .find_iter(text)
        .map(|m| m.start())
        .collect();

    if starts.len() < 2 && !text.contains(BUILDING) {
        debug!(
            headings = starts.len(),
            "no scheme structure in response, rendering as plain text"
        );
        return ParsedResponse::Unstructured {
            text: text.to_string(),
        };
    }

    let (intro, chunks) = match starts.first() {
        None => (None, vec![text]),
        Some(&first) => {
            let chunks: Vec<&str> = starts
                .iter()
                .enumerate()
                .map(|(i, &start)| {
                    let end = starts.get(i + 1).copied().unwrap_or(text.len());
                    &text[start..end]
                })
                .collect();
            (non_blank(&text[..first]), chunks)
        }
    };

    let schemes: Vec<ParsedScheme> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| parse_chunk(chunk, i))
        .collect();
    debug!(schemes = schemes.len(), "parsed scheme response");

    ParsedResponse::Schemes { intro, schemes }
}

fn parse_chunk(chunk: &str, index: usize) -> ParsedScheme {
    let (heading, rest) = chunk.split_once('\n').unwrap_or((chunk, ""));
    let body = strip_rules(rest);

    let (mut match_score, body) = take_match_score(&body);
    let mut heading = heading.to_string();
    if match_score.is_none() {
        let (score, stripped) = take_match_score(&heading);
        match_score = score;
        heading = stripped;
    }

    let name = display_name(&heading).unwrap_or_else(|| format!("Scheme {}", index + 1));
    ParsedScheme {
        name,
        match_score,
        body: split_sections(&body),
    }
}

fn strip_rules(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let t = line.trim();
            !(t.len() >= 3 && t.bytes().all(|b| b == b'-'))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Heading line without its `#` marker, building emoji and emphasis.
fn display_name(heading: &str) -> Option<String> {
    let name = heading.trim().trim_start_matches('#').trim_start();
    let name = name
        .strip_prefix(BUILDING)
        .map(|n| n.trim_start_matches('\u{FE0F}'))
        .unwrap_or(name);
    let name = name.replace("**", "").replace("__", "").replace('*', "");
    let name = name.trim().trim_end_matches([' ', '-', '|', ':', '–']).trim();
    non_blank(name)
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Render a response: an accordion when scheme structure is detected,
/// otherwise the plain formatted text.
pub fn build_accordion(text: &str) -> String {
    parse_response(text).to_html()
}

pub fn render_accordion(intro: Option<&str>, schemes: &[ParsedScheme]) -> String {
    let mut out = String::new();
    if let Some(intro) = intro {
        out.push_str(&format!(
            r#"<div class="response-intro">{}</div>"#,
            render_markdown(intro)
        ));
        out.push('\n');
    }
    out.push_str(r#"<div class="scheme-accordion">"#);
    for (index, scheme) in schemes.iter().enumerate() {
        out.push('\n');
        out.push_str(&render_item(index, scheme));
    }
    out.push_str("\n</div>");
    out
}

fn render_item(index: usize, scheme: &ParsedScheme) -> String {
    let id = format!("scheme-{index}");
    let badge = match (scheme.match_score, scheme.score_band()) {
        (Some(score), Some(band)) => format!(
            r#"<span class="match-score match-{}">{score}% Match</span>"#,
            band.css_class()
        ),
        _ => String::new(),
    };
    format!(
        concat!(
            r#"<div class="scheme-item" id="{id}">"#,
            r#"<button class="scheme-header" type="button" aria-expanded="false" aria-controls="{id}-body">"#,
            r#"<span class="scheme-name">{name}</span>{badge}"#,
            r#"<span class="scheme-toggle" aria-hidden="true">▾</span>"#,
            "</button>",
            r#"<div class="scheme-body" id="{id}-body" hidden>"#,
            "\n{body}\n",
            "</div>",
            "</div>"
        ),
        id = id,
        name = escape_html(&scheme.name),
        badge = badge,
        body = render_split(&scheme.body),
    )
}
