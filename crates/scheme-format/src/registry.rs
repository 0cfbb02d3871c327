use serde::Serialize;

const VARIATION_SELECTOR: char = '\u{FE0F}';

/// Identity of an emoji-tagged section inside a scheme body.
///
/// Known markers map to a fixed css class; any other pictographic
/// emoji becomes `Other`, rendered with the generic `info` class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "emoji", rename_all = "snake_case")]
pub enum SectionKind {
    About,
    Eligibility,
    Benefits,
    Documents,
    Apply,
    Links,
    Contact,
    Note,
    Tip,
    Other(String),
}

impl SectionKind {
    pub fn from_emoji(emoji: &str) -> Self {
        let bare: String = emoji.chars().filter(|&c| c != VARIATION_SELECTOR).collect();
        match bare.as_str() {
            "📝" => Self::About,
            "✅" => Self::Eligibility,
            "💰" => Self::Benefits,
            "📄" => Self::Documents,
            "📋" => Self::Apply,
            "🔗" => Self::Links,
            "📞" => Self::Contact,
            "⚠" => Self::Note,
            "💡" => Self::Tip,
            _ => Self::Other(emoji.to_string()),
        }
    }

    pub fn emoji(&self) -> &str {
        match self {
            Self::About => "📝",
            Self::Eligibility => "✅",
            Self::Benefits => "💰",
            Self::Documents => "📄",
            Self::Apply => "📋",
            Self::Links => "🔗",
            Self::Contact => "📞",
            Self::Note => "⚠️",
            Self::Tip => "💡",
            Self::Other(emoji) => emoji,
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Self::About => "description",
            Self::Eligibility => "eligibility",
            Self::Benefits => "benefits",
            Self::Documents => "documents",
            Self::Apply => "apply",
            Self::Links => "links",
            Self::Contact => "contact",
            Self::Note => "note",
            Self::Tip => "tip",
            Self::Other(_) => "info",
        }
    }
}

/// Whether `c` starts an emoji that can tag a section header.
pub(crate) fn is_pictographic(c: char) -> bool {
    matches!(
        c as u32,
        0x1F000..=0x1FAFF | 0x2600..=0x27BF | 0x2B00..=0x2BFF | 0x2300..=0x23FF
    )
}

/// Byte length of the emoji starting at `s`, including a trailing variation
/// selector.
pub(crate) fn emoji_len(s: &str) -> Option<usize> {
    let mut chars = s.chars();
    let first = chars.next().filter(|&c| is_pictographic(c))?;
    let mut len = first.len_utf8();
    if chars.next() == Some(VARIATION_SELECTOR) {
        len += VARIATION_SELECTOR.len_utf8();
    }
    Some(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_markers_resolve_with_or_without_selector() {
        assert_eq!(SectionKind::from_emoji("✅"), SectionKind::Eligibility);
        assert_eq!(SectionKind::from_emoji("⚠️"), SectionKind::Note);
        assert_eq!(SectionKind::from_emoji("⚠"), SectionKind::Note);
        assert_eq!(SectionKind::from_emoji("💰").css_class(), "benefits");
    }

    #[test]
    fn unknown_marker_is_info() {
        let kind = SectionKind::from_emoji("🌾");
        assert_eq!(kind, SectionKind::Other("🌾".to_string()));
        assert_eq!(kind.css_class(), "info");
        assert_eq!(kind.emoji(), "🌾");
    }

    #[test]
    fn emoji_len_includes_variation_selector() {
        assert_eq!(emoji_len("⚠️ **Note**"), Some(6));
        assert_eq!(emoji_len("✅ **x**"), Some(3));
        assert_eq!(emoji_len("**x**"), None);
        assert_eq!(emoji_len(""), None);
    }
}
