//! Line-local inline rules: emphasis, strikethrough and links.

use super::spans::SpanStore;

struct Delimiter {
    marker: &'static [u8],
    tag: &'static str,
    /// Underscore markers only count at word boundaries (`snake_case` stays literal).
    word_bound: bool,
}

const EMPHASIS: &[Delimiter] = &[
    Delimiter {
        marker: b"**",
        tag: "strong",
        word_bound: false,
    },
    Delimiter {
        marker: b"__",
        tag: "strong",
        word_bound: true,
    },
    Delimiter {
        marker: b"*",
        tag: "em",
        word_bound: false,
    },
    Delimiter {
        marker: b"_",
        tag: "em",
        word_bound: true,
    },
    Delimiter {
        marker: b"~~",
        tag: "del",
        word_bound: false,
    },
];

const UNSAFE_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

pub(super) fn emphasize(line: &str) -> String {
    let mut text = line.to_string();
    for delim in EMPHASIS {
        if text.as_bytes().windows(delim.marker.len()).any(|w| w == delim.marker) {
            text = wrap_delimited(&text, delim);
        }
    }
    text
}

fn is_ws(b: u8) -> bool {
    b.is_ascii_whitespace()
}

fn wrap_delimited(line: &str, delim: &Delimiter) -> String {
    let bytes = line.as_bytes();
    let len = delim.marker.len();
    let mut out = String::with_capacity(line.len() + 16);
    let mut last = 0usize;
    let mut i = 0usize;

    while i + len <= bytes.len() {
        if &bytes[i..i + len] == delim.marker && can_open(bytes, i, delim) {
            if let Some(close) = find_closer(line, i, delim) {
                out.push_str(&line[last..i]);
                out.push('<');
                out.push_str(delim.tag);
                out.push('>');
                out.push_str(&line[i + len..close]);
                out.push_str("</");
                out.push_str(delim.tag);
                out.push('>');
                i = close + len;
                last = i;
                continue;
            }
        }
        i += 1;
    }
    out.push_str(&line[last..]);
    out
}

fn can_open(bytes: &[u8], at: usize, delim: &Delimiter) -> bool {
    let after = at + delim.marker.len();
    if after >= bytes.len() || is_ws(bytes[after]) {
        return false;
    }
    // A single-character marker opens with the last character of its run.
    if delim.marker.len() == 1 && bytes[after] == delim.marker[0] {
        return false;
    }
    !(delim.word_bound && at > 0 && bytes[at - 1].is_ascii_alphanumeric())
}

/// Lazily find the closing marker for an opener at `open`.
///
/// The closer must follow non-whitespace, and when it sits in a longer run of the marker
/// character the last characters of the run close the span. A span never straddles a tag
/// emitted by an earlier pass.
fn find_closer(line: &str, open: usize, delim: &Delimiter) -> Option<usize> {
    let bytes = line.as_bytes();
    let len = delim.marker.len();
    let marker_byte = delim.marker[0];
    let content_start = open + len;
    let mut j = content_start + 1;

    while j + len <= bytes.len() {
        if &bytes[j..j + len] != delim.marker || is_ws(bytes[j - 1]) {
            j += 1;
            continue;
        }
        let mut close = j;
        while close + len < bytes.len() && bytes[close + len] == marker_byte {
            close += 1;
        }
        let has_content = bytes[content_start..close].iter().any(|&b| b != marker_byte);
        let bounded = !delim.word_bound
            || bytes
                .get(close + len)
                .is_none_or(|b| !b.is_ascii_alphanumeric());
        if has_content && bounded && tags_balanced(&line[content_start..close]) {
            return Some(close);
        }
        j = close + 1;
    }
    None
}

const INLINE_TAGS: &[&str] = &["strong", "em", "del"];

/// True if every emphasis tag in `segment` is closed inside it, in order.
fn tags_balanced(segment: &str) -> bool {
    if !segment.contains('<') {
        return true;
    }
    let mut stack: Vec<&str> = Vec::new();
    let mut rest = segment;
    while let Some(lt) = rest.find('<') {
        rest = &rest[lt + 1..];
        let (closing, name_start) = match rest.strip_prefix('/') {
            Some(after) => (true, after),
            None => (false, rest),
        };
        let Some(tag) = INLINE_TAGS
            .iter()
            .find(|tag| name_start.strip_prefix(**tag).is_some_and(|r| r.starts_with('>')))
        else {
            continue;
        };
        if !closing {
            stack.push(*tag);
        } else if stack.pop() != Some(*tag) {
            return false;
        }
    }
    stack.is_empty()
}

/// Render every `[label](url)` on the line as an anchor that opens in a new browsing context
/// and park it, so later rules never touch the destination. Labels get emphasis of their own.
pub(super) fn park_links(line: &str, escaped: bool, store: &mut SpanStore) -> String {
    if !line.contains("](") {
        return line.to_string();
    }

    let bytes = line.as_bytes();
    let mut out = String::with_capacity(line.len());
    let mut last = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] != b'[' {
            i += 1;
            continue;
        }
        match parse_link(line, i) {
            Some(link) => {
                out.push_str(&line[last..i]);
                let mut html = String::with_capacity(link.label.len() + link.url.len() + 64);
                push_anchor(&mut html, &emphasize(link.label), link.url, escaped);
                out.push_str(&store.park(html, false));
                i = link.end;
                last = i;
            }
            None => i += 1,
        }
    }
    out.push_str(&line[last..]);
    out
}

struct Link<'a> {
    label: &'a str,
    url: &'a str,
    end: usize,
}

fn parse_link(line: &str, open: usize) -> Option<Link<'_>> {
    let bytes = line.as_bytes();
    let mut j = open + 1;
    while j < bytes.len() && bytes[j] != b']' {
        if bytes[j] == b'[' {
            // A later bracket owns the label.
            return None;
        }
        j += 1;
    }
    if j + 1 >= bytes.len() || bytes[j + 1] != b'(' || j == open + 1 {
        return None;
    }
    let url_start = j + 2;
    let url_len = destination_len(&line[url_start..])?;
    let url = line[url_start..url_start + url_len].trim();
    if url.is_empty() || url.contains(super::spans::TOKEN_OPEN) {
        return None;
    }
    Some(Link {
        label: &line[open + 1..j],
        url,
        end: url_start + url_len + 1,
    })
}

/// Length of a link destination up to its closing `)`; nested parentheses must balance.
fn destination_len(rest: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in rest.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' if depth == 0 => return Some(i),
            b')' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn push_anchor(out: &mut String, label: &str, url: &str, escaped: bool) {
    let lower = url.to_ascii_lowercase();
    if UNSAFE_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        out.push_str(label);
        return;
    }
    let href = if escaped {
        url.to_string()
    } else {
        super::escape_attribute(url)
    };
    out.push_str("<a href=\"");
    out.push_str(&href);
    out.push_str("\" target=\"_blank\" rel=\"noopener noreferrer\">");
    out.push_str(label);
    out.push_str("</a>");
}
