//! Prefix-safe Markdown to HTML transformation.
//!
//! The dialect is deliberately small (what chat assistants actually emit) and every rule is
//! total: any prefix of a message renders without panicking, and a construct whose closing
//! marker has not arrived yet stays literal until a later call sees it.
//!
//! Rule order:
//!
//! 1. fenced code and inline code are rendered and parked behind placeholders,
//! 2. remaining text is HTML-escaped,
//! 3. per line: links are rendered and parked, then bold, italic, strikethrough, then headers,
//!    blockquotes and rules,
//! 4. consecutive list lines are folded into `<ul>`/`<ol>` blocks,
//! 5. blank lines are dropped and the rest is joined with the configured line break,
//! 6. placeholders are restored.

mod cleanup;
mod inline;
mod lists;
mod spans;

use crate::options::RenderOptions;
use crate::syntax;

pub use spans::{escape_attribute, escape_html};

/// Anything that can turn a message prefix into markup.
///
/// Implementations must be pure: the same input always yields the same output and no state is
/// carried between calls. Playback relies on this to re-render each growing prefix from scratch.
pub trait Markdown: Send + Sync {
    fn render(&self, text: &str) -> String;
}

/// The chat dialect described in the crate docs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatMarkdown {
    opts: RenderOptions,
}

impl ChatMarkdown {
    pub fn new(opts: RenderOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.opts
    }
}

impl Markdown for ChatMarkdown {
    fn render(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let text = normalize(text);
        let mut store = spans::SpanStore::default();
        let text = store.extract_fences(&text, self.opts.close_open_fence);
        let text = store.extract_inline_code(&text);
        let text = if self.opts.escape_html {
            escape_html(&text)
        } else {
            text
        };
        let quote_marker = if self.opts.escape_html { "&gt;" } else { ">" };

        let lines: Vec<Line> = text
            .split('\n')
            .map(|raw| classify_line(raw, quote_marker, &mut store, self.opts.escape_html))
            .collect();
        let lines = lists::fold_lists(lines);
        let joined = cleanup::join_lines(&lines, self.opts.line_breaks);
        store.restore(&joined)
    }
}

/// A transformer backed by a closure.
pub struct FnMarkdown<F>(pub F);

impl<F> Markdown for FnMarkdown<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn render(&self, text: &str) -> String {
        (self.0)(text)
    }
}

impl<M: Markdown + ?Sized> Markdown for &M {
    fn render(&self, text: &str) -> String {
        (**self).render(text)
    }
}

impl<M: Markdown + ?Sized> Markdown for Box<M> {
    fn render(&self, text: &str) -> String {
        (**self).render(text)
    }
}

/// Render `text` with the default [`RenderOptions`].
pub fn render(text: &str) -> String {
    ChatMarkdown::default().render(text)
}

/// One output line on its way to the final join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Line {
    pub(crate) text: String,
    /// Block-level markup never gets a line break next to it.
    pub(crate) block: bool,
}

impl Line {
    pub(crate) fn inline(text: String) -> Self {
        Self { text, block: false }
    }

    pub(crate) fn block(text: String) -> Self {
        Self { text, block: true }
    }
}

fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            spans::TOKEN_OPEN | spans::TOKEN_CLOSE => out.push('\u{FFFD}'),
            _ => out.push(c),
        }
    }
    out
}

fn classify_line(
    raw: &str,
    quote_marker: &str,
    store: &mut spans::SpanStore,
    escaped: bool,
) -> Line {
    if store.is_block_token(raw.trim()) {
        return Line::block(raw.trim().to_string());
    }

    let text = inline::park_links(raw, escaped, store);
    let text = inline::emphasize(&text);

    if let Some((level, body)) = syntax::parse_heading(&text) {
        Line::block(format!("<h{level}>{body}</h{level}>"))
    } else if let Some(body) = syntax::parse_blockquote(&text, quote_marker) {
        Line::block(format!("<blockquote>{body}</blockquote>"))
    } else if syntax::is_thematic_break(&text) {
        Line::block("<hr>".to_string())
    } else {
        Line::inline(text)
    }
}
