use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static MATCH_SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:🎯\x{FE0F}?[ \t]*)?\*{0,2}[ \t]*match[ \t]*score[ \t]*\*{0,2}[ \t]*:[ \t]*\*{0,2}[ \t]*(\d{1,3})[ \t]*%[ \t]*\*{0,2}",
    )
    .expect("valid regex")
});

/// Display band for a match score. Purely presentational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => Self::High,
            50..=79 => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// A `Match Score: N%` marker located in scheme text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchScore {
    /// Percentage, clamped to 100.
    pub value: u8,
    /// Byte range of the whole marker, emphasis included.
    pub span: Range<usize>,
}

/// Find the first match-score marker in `text`.
pub fn find_match_score(text: &str) -> Option<MatchScore> {
    let caps = MATCH_SCORE_RE.captures(text)?;
    let whole = caps.get(0)?;
    let digits: u16 = caps.get(1)?.as_str().parse().ok()?;
    Some(MatchScore {
        value: digits.min(100) as u8,
        span: whole.range(),
    })
}

/// Remove the first match-score marker from `text`, returning the score and
/// the remaining text.
pub fn take_match_score(text: &str) -> (Option<u8>, String) {
    match find_match_score(text) {
        Some(score) => {
            let mut rest = String::with_capacity(text.len());
            rest.push_str(&text[..score.span.start]);
            rest.push_str(&text[score.span.end..]);
            (Some(score.value), rest)
        }
        None => (None, text.to_string()),
    }
}
