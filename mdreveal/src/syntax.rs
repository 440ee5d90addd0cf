//! Line-level classifiers shared by the transformer.
//!
//! Everything here is a pure predicate over a single line (or a fence body) and is exported so
//! hosts can mirror the transformer's decisions, e.g. to style a pending line differently.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMarker<'a> {
    pub kind: ListKind,
    /// Literal digits of an ordered marker (`"05"` for `05. x`). Empty for unordered markers.
    pub number: &'a str,
    /// Item content after the marker and its separating whitespace.
    pub content: &'a str,
}

fn is_space_or_tab(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

fn skip_leading_whitespace(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() && is_space_or_tab(bytes[i]) {
        i += 1;
    }
    &line[i..]
}

/// Recognise `- x`, `* x`, `+ x` and `12. x`.
///
/// Leading indentation is accepted and ignored (nested lists are flattened). The marker must be
/// followed by at least one space or tab; the content may be empty.
pub fn parse_list_marker(line: &str) -> Option<ListMarker<'_>> {
    let s = skip_leading_whitespace(line);
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return None;
    }

    let (kind, number, rest) = match bytes[0] {
        b'-' | b'*' | b'+' => (ListKind::Unordered, "", &s[1..]),
        b'0'..=b'9' => {
            let mut i = 0usize;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i >= bytes.len() || bytes[i] != b'.' {
                return None;
            }
            (ListKind::Ordered, &s[..i], &s[i + 1..])
        }
        _ => return None,
    };

    let rest_bytes = rest.as_bytes();
    if rest_bytes.is_empty() || !is_space_or_tab(rest_bytes[0]) {
        return None;
    }
    Some(ListMarker {
        kind,
        number,
        content: skip_leading_whitespace(rest).trim_end(),
    })
}

/// `# x` through `###### x`. Returns the level and the trimmed heading text.
///
/// The hash run must be followed by whitespace or end the line; seven or more hashes is text.
pub fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let bytes = line.as_bytes();
    let mut level = 0usize;
    while level < bytes.len() && bytes[level] == b'#' {
        level += 1;
    }
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &line[level..];
    if !rest.is_empty() && !is_space_or_tab(rest.as_bytes()[0]) {
        return None;
    }
    Some((level as u8, rest.trim()))
}

/// A line that is exactly `---` or `***` once surrounding whitespace is removed.
pub fn is_thematic_break(line: &str) -> bool {
    matches!(line.trim(), "---" | "***")
}

/// Body of a blockquote line given the (possibly escaped) quote marker.
///
/// `> text` yields `text`; a bare marker yields an empty body.
pub fn parse_blockquote<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(marker)?;
    if rest.is_empty() {
        return Some("");
    }
    rest.strip_prefix(' ').map(str::trim_end)
}

/// Split a fenced code body into an optional language tag and the code itself.
///
/// Only a multi-line body can carry a tag: its first line must be empty or a single token.
pub fn split_fence_body(body: &str) -> (Option<&str>, &str) {
    let Some(nl) = body.find('\n') else {
        return (None, body);
    };
    let info = body[..nl].trim();
    if info.split_whitespace().nth(1).is_some() {
        return (None, body);
    }
    let language = if info.is_empty() { None } else { Some(info) };
    (language, &body[nl + 1..])
}

/// True if `text` ends inside a multi-line code fence that has not been closed yet.
pub fn has_open_fence(text: &str) -> bool {
    text.contains('\n') && text.match_indices("```").count() % 2 == 1
}
