use crate::syntax;

pub(super) const TOKEN_OPEN: char = '\u{E000}';
pub(super) const TOKEN_CLOSE: char = '\u{E001}';

const FENCE: &str = "```";

/// Rendered code spans parked behind private-use placeholders.
///
/// Code is rendered first and hidden from every later rule, so emphasis or list markers inside
/// code are never rewritten. Placeholders contain no Markdown punctuation.
#[derive(Debug, Default)]
pub(super) struct SpanStore {
    spans: Vec<Span>,
}

#[derive(Debug)]
struct Span {
    html: String,
    block: bool,
}

impl SpanStore {
    pub(super) fn park(&mut self, html: String, block: bool) -> String {
        let idx = self.spans.len();
        self.spans.push(Span { html, block });
        format!("{TOKEN_OPEN}{idx}{TOKEN_CLOSE}")
    }

    /// True if `s` is exactly one placeholder for a fenced block.
    pub(super) fn is_block_token(&self, s: &str) -> bool {
        let Some(inner) = s
            .strip_prefix(TOKEN_OPEN)
            .and_then(|rest| rest.strip_suffix(TOKEN_CLOSE))
        else {
            return false;
        };
        inner
            .parse::<usize>()
            .ok()
            .and_then(|idx| self.spans.get(idx))
            .is_some_and(|span| span.block)
    }

    /// Replace every closed ```` ``` ```` fence with a placeholder.
    ///
    /// An unclosed fence stays literal unless `close_open` is set and the fence already spans a
    /// line break, in which case it runs to the end of the text.
    pub(super) fn extract_fences(&mut self, text: &str, close_open: bool) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(open) = rest.find(FENCE) {
            let after_open = &rest[open + FENCE.len()..];
            let (body, consumed) = match after_open.find(FENCE) {
                Some(close) => (&after_open[..close], open + FENCE.len() + close + FENCE.len()),
                None if close_open && syntax::has_open_fence(&rest[open..]) => {
                    (after_open, rest.len())
                }
                None => break,
            };

            out.push_str(&rest[..open]);
            let token = self.park(render_fence(body), true);
            // Keep the block on its own line so line rules see it whole.
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&token);
            rest = &rest[consumed..];
            if !rest.is_empty() && !rest.starts_with('\n') {
                out.push('\n');
            }
        }
        out.push_str(rest);
        out
    }

    /// Replace single-backtick spans on one line with placeholders.
    pub(super) fn extract_inline_code(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        loop {
            let Some(open) = rest.find('`') else {
                break;
            };
            let after_open = &rest[open + 1..];
            let close = after_open.find(['`', '\n']);
            match close {
                Some(close) if close > 0 && after_open.as_bytes()[close] == b'`' => {
                    out.push_str(&rest[..open]);
                    let html = format!("<code>{}</code>", escape_html(&after_open[..close]));
                    out.push_str(&self.park(html, false));
                    rest = &after_open[close + 1..];
                }
                _ => {
                    // Not an opener: keep the backtick literally and move past it.
                    out.push_str(&rest[..open + 1]);
                    rest = after_open;
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Swap placeholders back for their rendered markup.
    pub(super) fn restore(&self, text: &str) -> String {
        if self.spans.is_empty() {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(open) = rest.find(TOKEN_OPEN) {
            out.push_str(&rest[..open]);
            let after = &rest[open + TOKEN_OPEN.len_utf8()..];
            let span = after.find(TOKEN_CLOSE).and_then(|close| {
                let idx = after[..close].parse::<usize>().ok()?;
                Some((self.spans.get(idx)?, close))
            });
            match span {
                Some((span, close)) => {
                    // Link labels may hold code spans parked before them.
                    if span.html.contains(TOKEN_OPEN) {
                        out.push_str(&self.restore(&span.html));
                    } else {
                        out.push_str(&span.html);
                    }
                    rest = &after[close + TOKEN_CLOSE.len_utf8()..];
                }
                None => {
                    out.push(TOKEN_OPEN);
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

fn render_fence(body: &str) -> String {
    let (language, code) = syntax::split_fence_body(body);
    let code = code.strip_suffix('\n').unwrap_or(code);
    match language {
        Some(lang) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>",
            escape_attribute(lang),
            escape_html(code)
        ),
        None => format!("<pre><code>{}</code></pre>", escape_html(code)),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape for a double-quoted attribute value, leaving existing entities alone.
pub fn escape_attribute(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
