//! Plain-text sanitization for frontmatter fields.
//!
//! Titles and descriptions must carry no markdown or HTML syntax, since they
//! end up quoted inside frontmatter values. Each pass is a function
//! `&str -> String` applied in sequence.

use std::sync::LazyLock;

use regex::Regex;

/// Strip markdown emphasis, links, images, inline code, and HTML tags,
/// keeping the readable text.
pub(crate) fn sanitize_inline(s: &str) -> String {
    static IMAGE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").expect("valid regex"));
    static INLINE_LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").expect("valid regex"));
    static REF_LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\[[^\]]*\]").expect("valid regex"));
    static BARE_LABEL_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").expect("valid regex"));
    static CODE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"`([^`]*)`").expect("valid regex"));
    static HTML_TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"</?[A-Za-z][^>]*>").expect("valid regex"));
    static BOLD_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid regex"));
    static EMPHASIS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("valid regex"));
    static UNDERSCORE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\b__?([^_]+)__?\b").expect("valid regex"));

    // Images before links so the leading `!` form is not half-matched.
    let mut out = IMAGE_RE.replace_all(s, "$1").to_string();
    out = INLINE_LINK_RE.replace_all(&out, "$1").to_string();
    out = REF_LINK_RE.replace_all(&out, "$1").to_string();
    out = BARE_LABEL_RE.replace_all(&out, "$1").to_string();
    out = CODE_RE.replace_all(&out, "$1").to_string();
    out = HTML_TAG_RE.replace_all(&out, "").to_string();
    out = BOLD_RE.replace_all(&out, "$1").to_string();
    out = EMPHASIS_RE.replace_all(&out, "$1").to_string();
    out = UNDERSCORE_RE.replace_all(&out, "$1").to_string();

    // Pathological nesting can leave stray syntax characters behind.
    out.chars()
        .filter(|c| !matches!(c, '*' | '`' | '[' | ']' | '<' | '>'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Collapse all whitespace runs (including newlines) to single spaces.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters plus a `...` ellipsis.
/// Cuts on character boundaries, never bytes.
pub(crate) fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }

    let prefix: String = s.chars().take(max_chars).collect();
    format!("{}...", prefix.trim_end())
}
