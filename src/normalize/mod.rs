//! Text normalizer: raw document text to canonical comparison form.
//!
//! [`normalize`] is pure and deterministic, performs no I/O and never fails. Malformed
//! markdown (unterminated fences, dangling brackets) passes through best-effort.
//!
//! Stages, in order:
//! 1. A leading `---` metadata block is folded into plain tokens (keys and values,
//!    punctuation dropped).
//! 2. Fenced code regions become a compact `code:<lang> <names...>` marker that keeps
//!    declared identifiers and discards the code body, so formatting-only differences in
//!    code do not affect similarity.
//! 3. Markdown decoration (headers, emphasis, links, quotes, bullets, tables, HTML tags)
//!    is reduced to its visible text.
//! 4. Whitespace runs collapse to one space, blank lines disappear, and the result is
//!    lower-cased.


use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:fn|def|function|func|class|struct|enum|trait|interface|type|impl|mod|module|let(?:\s+mut)?|const|var|static)\s+([A-Za-z_][A-Za-z0-9_]*)",
    )
    .expect("declaration pattern is valid")
});

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{0,3}#{1,6}(?:\s+|$)").expect("header pattern is valid"));
static HEADER_TRAILER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+#+\s*$").expect("header trailer pattern is valid"));
static BLOCKQUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:>\s?)+").expect("blockquote pattern is valid"));
static BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*+]|\d{1,9}[.)])\s+(?:\[[ xX]\]\s+)?").expect("bullet pattern is valid")
});
static LINK_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s{0,3}\[[^\]]+\]:\s+\S+.*$").expect("link definition pattern is valid")
});
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").expect("image pattern is valid"));
static INLINE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").expect("link pattern is valid"));
static REFERENCE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\[[^\]]*\]").expect("reference pattern is valid"));
static AUTOLINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<((?:https?|mailto):[^>\s]+)>").expect("autolink pattern is valid"));
static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--.*?-->").expect("comment pattern is valid"));
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][A-Za-z0-9-]*[^>]*>").expect("tag pattern is valid"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`+([^`]+)`+").expect("inline code pattern is valid"));
static STRONG_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("strong pattern is valid"));
static STRONG_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([^_]+)__").expect("strong pattern is valid"));
static EMPHASIS_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s][^*]*)\*").expect("emphasis pattern is valid"));
static EMPHASIS_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^A-Za-z0-9_])_([^_]+)_([^A-Za-z0-9_]|$)").expect("emphasis pattern is valid")
});
static STRIKETHROUGH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~([^~]+)~~").expect("strikethrough pattern is valid"));

/// Returns the canonical comparison form of `raw`.
pub fn normalize(raw: &str) -> String {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let (metadata, body) = split_front_matter(raw);

    let mut lines: Vec<String> = Vec::new();
    if let Some(metadata) = metadata {
        lines.push(fold_metadata(metadata));
    }

    let mut fence: Option<OpenFence> = None;
    for line in body.lines() {
        let trimmed = line.trim_start();

        if let Some(open) = fence.as_mut() {
            if open.closes(trimmed) {
                if let Some(open) = fence.take() {
                    lines.push(open.into_marker());
                }
            } else {
                open.body.push_str(line);
                open.body.push('\n');
            }
            continue;
        }

        if let Some(open) = OpenFence::parse(trimmed) {
            fence = Some(open);
            continue;
        }

        lines.push(strip_markdown(line));
    }

    // Unterminated fence: keep its marker rather than dropping the code.
    if let Some(open) = fence {
        lines.push(open.into_marker());
    }

    collapse(&lines)
}

/// Splits a leading `---` metadata block from the body, if one is present and closed.
fn split_front_matter(raw: &str) -> (Option<&str>, &str) {
    let Some(rest) = raw
        .strip_prefix("---\n")
        .or_else(|| raw.strip_prefix("---\r\n"))
    else {
        return (None, raw);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let marker = line.trim_end();
        if marker == "---" || marker == "..." {
            let metadata = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(metadata), body);
        }
        offset += line.len();
    }

    (None, raw)
}

/// Folds `key: value` metadata into plain tokens, dropping punctuation.
fn fold_metadata(metadata: &str) -> String {
    metadata
        .lines()
        .map(|line| {
            line.chars()
                .map(|c| if c.is_alphanumeric() { c } else { ' ' })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

struct OpenFence {
    marker: char,
    len: usize,
    lang: String,
    body: String,
}

impl OpenFence {
    fn parse(trimmed: &str) -> Option<Self> {
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = trimmed.chars().take_while(|c| *c == marker).count();
        if len < 3 {
            return None;
        }
        let info = trimmed[len..].trim();
        if marker == '`' && info.contains('`') {
            return None;
        }
        let lang = info
            .split(|c: char| c.is_whitespace() || c == '{' || c == ',')
            .next()
            .unwrap_or_default()
            .to_string();

        Some(Self {
            marker,
            len,
            lang,
            body: String::new(),
        })
    }

    fn closes(&self, trimmed: &str) -> bool {
        let run = trimmed.chars().take_while(|c| *c == self.marker).count();
        run >= self.len && trimmed[run * self.marker.len_utf8()..].trim().is_empty()
    }

    fn into_marker(self) -> String {
        let mut names: Vec<&str> = Vec::new();
        for capture in DECLARATION.captures_iter(&self.body) {
            if let Some(name) = capture.get(1).map(|m| m.as_str()) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        let mut marker = if self.lang.is_empty() {
            "code".to_string()
        } else {
            format!("code:{}", self.lang)
        };
        for name in names {
            marker.push(' ');
            marker.push_str(name);
        }
        marker
    }
}

/// Reduces one markdown line to its visible text.
fn strip_markdown(line: &str) -> String {
    if LINK_DEFINITION.is_match(line) || is_rule_or_table_separator(line) {
        return String::new();
    }

    let mut text = line.to_string();
    for (pattern, replacement) in [
        (&*HEADER, ""),
        (&*BLOCKQUOTE, ""),
        (&*BULLET, ""),
        (&*HEADER_TRAILER, ""),
        (&*HTML_COMMENT, " "),
        (&*IMAGE, "$1"),
        (&*INLINE_LINK, "$1"),
        (&*REFERENCE_LINK, "$1"),
        (&*AUTOLINK, "$1"),
        (&*HTML_TAG, " "),
        (&*INLINE_CODE, "$1"),
        (&*STRONG_STAR, "$1"),
        (&*STRONG_UNDERSCORE, "$1"),
        (&*EMPHASIS_STAR, "$1"),
        (&*EMPHASIS_UNDERSCORE, "$1$2$3"),
        (&*STRIKETHROUGH, "$1"),
    ] {
        replace_in_place(&mut text, pattern, replacement);
    }

    text.replace('|', " ")
}

fn replace_in_place(text: &mut String, pattern: &Regex, replacement: &str) {
    let replaced = match pattern.replace_all(text, replacement) {
        Cow::Owned(s) => s,
        Cow::Borrowed(_) => return,
    };
    *text = replaced;
}

/// Horizontal rules (`---`, `***`, `___`) and table separator rows (`|---|:--:|`).
fn is_rule_or_table_separator(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.len() < 3 {
        return false;
    }
    let only_rule_chars = trimmed
        .chars()
        .all(|c| matches!(c, '-' | '*' | '_' | ':' | '|' | ' ' | '\t'));
    let has_dashes = trimmed.chars().filter(|c| matches!(c, '-' | '*' | '_')).count() >= 3;
    only_rule_chars && has_dashes
}

fn collapse(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase()
}
