/// Escape the three characters that could open markup in model output.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Heading(u8),
    Bullet,
    Numbered,
    Blank,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineToken {
    kind: LineKind,
    /// Byte range of the line's content, marker excluded.
    start: usize,
    end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

/// Render arbitrary text into an HTML fragment. Never fails; blank input
/// yields an empty string.
pub fn render_markdown(text: &str) -> String {
    let escaped = escape_html(text);
    let tokens = scan_lines(&escaped);
    assemble(&escaped, &tokens)
}

fn scan_lines(text: &str) -> Vec<LineToken> {
    let mut tokens = Vec::new();
    let mut offset = 0;
    for raw in text.split('\n') {
        let line_start = offset;
        offset += raw.len() + 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        tokens.push(classify_line(line, line_start));
    }
    tokens
}

fn classify_line(line: &str, base: usize) -> LineToken {
    let blank = LineToken {
        kind: LineKind::Blank,
        start: base,
        end: base,
    };
    let trimmed = line.trim();
    if trimmed.is_empty() || is_rule(trimmed) {
        return blank;
    }

    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if (1..=3).contains(&hashes) && line[hashes..].starts_with(' ') {
        let content = line[hashes..].trim();
        if content.is_empty() {
            return blank;
        }
        let start = base + line.len() - line[hashes..].trim_start().len();
        return LineToken {
            kind: LineKind::Heading(hashes as u8),
            start,
            end: start + content.len(),
        };
    }

    let indent = line.len() - line.trim_start().len();
    let body = line.trim_start();
    if let Some(marker_len) = list_marker(body) {
        let kind = if body.starts_with(|c: char| c.is_ascii_digit()) {
            LineKind::Numbered
        } else {
            LineKind::Bullet
        };
        let rest = &body[marker_len..];
        let content = rest.trim();
        let start = base + indent + marker_len + (rest.len() - rest.trim_start().len());
        return LineToken {
            kind,
            start,
            end: start + content.len(),
        };
    }

    let start = base + indent;
    LineToken {
        kind: LineKind::Text,
        start,
        end: start + body.trim_end().len(),
    }
}

fn is_rule(trimmed: &str) -> bool {
    trimmed.len() >= 3 && trimmed.bytes().all(|b| b == b'-')
}

/// Byte length of a list marker at the start of `body`, including the
/// whitespace that must follow it.
fn list_marker(body: &str) -> Option<usize> {
    let mut chars = body.char_indices();
    let (_, first) = chars.next()?;
    let after = match first {
        '-' | '*' | '•' => first.len_utf8(),
        '0'..='9' => {
            let digits = body.bytes().take_while(u8::is_ascii_digit).count();
            if body[digits..].starts_with('.') {
                digits + 1
            } else {
                return None;
            }
        }
        _ => return None,
    };
    let rest = &body[after..];
    if rest.starts_with([' ', '\t']) && !rest.trim().is_empty() {
        Some(after + 1)
    } else {
        None
    }
}

fn assemble(text: &str, tokens: &[LineToken]) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut list: Option<(ListKind, Vec<String>)> = None;

    fn flush_paragraph(blocks: &mut Vec<String>, paragraph: &mut Vec<String>) {
        if !paragraph.is_empty() {
            blocks.push(format!("<p>{}</p>", paragraph.join("<br>")));
            paragraph.clear();
        }
    }

    fn flush_list(blocks: &mut Vec<String>, list: &mut Option<(ListKind, Vec<String>)>) {
        if let Some((kind, items)) = list.take() {
            let tag = kind.tag();
            blocks.push(format!("<{tag}>{}</{tag}>", items.concat()));
        }
    }

    for token in tokens {
        let content = &text[token.start..token.end];
        match token.kind {
            LineKind::Blank => {
                flush_paragraph(&mut blocks, &mut paragraph);
                flush_list(&mut blocks, &mut list);
            }
            LineKind::Heading(level) => {
                flush_paragraph(&mut blocks, &mut paragraph);
                flush_list(&mut blocks, &mut list);
                blocks.push(format!("<h{level}>{}</h{level}>", render_inline(content)));
            }
            LineKind::Bullet | LineKind::Numbered => {
                flush_paragraph(&mut blocks, &mut paragraph);
                let kind = if token.kind == LineKind::Numbered {
                    ListKind::Ordered
                } else {
                    ListKind::Unordered
                };
                if list.as_ref().is_some_and(|(open, _)| *open != kind) {
                    flush_list(&mut blocks, &mut list);
                }
                let item = format!("<li>{}</li>", render_inline(content));
                list.get_or_insert_with(|| (kind, Vec::new())).1.push(item);
            }
            LineKind::Text => {
                flush_list(&mut blocks, &mut list);
                paragraph.push(render_inline(content));
            }
        }
    }
    flush_paragraph(&mut blocks, &mut paragraph);
    flush_list(&mut blocks, &mut list);

    blocks.join("\n")
}

/// Links are cut out first and held behind a placeholder character, so
/// emphasis only ever sees plain text and never reaches into an `href`.
/// Bold must run before italic.
pub(crate) fn render_inline(escaped: &str) -> String {
    let marker = placeholder_for(escaped);
    let (text, anchors) = extract_links(escaped, marker);
    let mut anchors = anchors.into_iter();
    let mut out = String::with_capacity(text.len());
    for c in emphasize(&text).chars() {
        if c == marker {
            if let Some(anchor) = anchors.next() {
                out.push_str(&anchor);
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn emphasize(s: &str) -> String {
    let bold = replace_delimited(s, "**", "strong");
    replace_delimited(&bold, "*", "em")
}

/// A private-use character absent from `s`.
fn placeholder_for(s: &str) -> char {
    ('\u{E000}'..='\u{F8FF}')
        .find(|c| !s.contains(*c))
        .unwrap_or('\u{FFFC}')
}

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Swap every `[label](url)` in `s` for `marker`, returning the rewritten
/// text and the anchors in order.
fn extract_links(s: &str, marker: char) -> (String, Vec<String>) {
    let mut out = String::with_capacity(s.len());
    let mut anchors = Vec::new();
    let mut rest = s;
    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let candidate = &rest[open..];
        match parse_link(candidate) {
            Some((label, url, consumed)) => {
                let href = url.replace('"', "&quot;");
                anchors.push(format!(
                    r#"<a href="{href}" target="_blank" rel="noopener noreferrer">{}</a>"#,
                    emphasize(label)
                ));
                out.push(marker);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('[');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    (out, anchors)
}

/// Parse `[label](url)` at the start of `s`, returning the label, the url and
/// the number of bytes consumed.
fn parse_link(s: &str) -> Option<(&str, &str, usize)> {
    let close = s.find(']')?;
    let label = &s[1..close];
    if label.is_empty() || label.contains('[') {
        return None;
    }
    let after = &s[close + 1..];
    let inner = after.strip_prefix('(')?;
    let end = inner.find(')')?;
    let url = &inner[..end];
    if !is_safe_url(url) {
        return None;
    }
    Some((label, url, close + 2 + end + 1))
}

/// Only `http`, `https`, `mailto` and scheme-less relative URLs are linked.
/// Whitespace and control characters are refused outright, since browsers
/// drop them while parsing and could reveal a scheme hidden behind them.
fn is_safe_url(url: &str) -> bool {
    if url.is_empty() || url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    let scheme_end = url.find(|c: char| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(i) if url[i..].starts_with(':') => {
            let scheme = url[..i].to_ascii_lowercase();
            ALLOWED_SCHEMES.contains(&scheme.as_str())
        }
        _ => true,
    }
}

/// Replace `delim content delim` pairs with `<tag>content</tag>`, matching the
/// nearest closing delimiter after at least one character of content.
fn replace_delimited(s: &str, delim: &str, tag: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(open) = rest.find(delim) {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + delim.len()..];
        let first_len = after_open.chars().next().map_or(0, char::len_utf8);
        let close = if first_len == 0 {
            None
        } else {
            after_open[first_len..].find(delim).map(|i| i + first_len)
        };
        match close {
            Some(close) => {
                out.push_str(&format!("<{tag}>{}</{tag}>", &after_open[..close]));
                rest = &after_open[close + delim.len()..];
            }
            None => {
                // Step one char so the remaining delimiters still get a chance.
                let step = rest[open..].chars().next().map_or(1, char::len_utf8);
                out.push_str(&rest[open..open + step]);
                rest = &rest[open + step..];
            }
        }
    }
    out.push_str(rest);
    out
}
