//! A CommonMark transformer backed by `pulldown-cmark`.
//!
//! Use this instead of [`ChatMarkdown`](crate::ChatMarkdown) when responses need full CommonMark
//! (tables, nested lists, real paragraphs). Links still open in a new browsing context, and raw
//! HTML is shown as text unless explicitly allowed.

use pulldown_cmark::{CowStr, Event, Options as PulldownOptions, Parser, Tag, TagEnd, html};

use crate::render::{Markdown, escape_attribute};

const UNSAFE_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

#[derive(Debug, Clone)]
pub struct PulldownMarkdownOptions {
    pub pulldown: PulldownOptions,
    /// Pass raw HTML through instead of escaping it.
    pub allow_raw_html: bool,
}

impl Default for PulldownMarkdownOptions {
    fn default() -> Self {
        Self {
            pulldown: PulldownOptions::ENABLE_STRIKETHROUGH | PulldownOptions::ENABLE_TABLES,
            allow_raw_html: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PulldownMarkdown {
    opts: PulldownMarkdownOptions,
}

impl PulldownMarkdown {
    pub fn new(opts: PulldownMarkdownOptions) -> Self {
        Self { opts }
    }
}

impl Markdown for PulldownMarkdown {
    fn render(&self, text: &str) -> String {
        let allow_raw_html = self.opts.allow_raw_html;
        let mut dropped_link = false;
        let events = Parser::new_ext(text, self.opts.pulldown).map(|event| match event {
            Event::Start(Tag::Link { dest_url, .. }) => {
                let lower = dest_url.to_ascii_lowercase();
                if UNSAFE_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
                    dropped_link = true;
                    return Event::InlineHtml(CowStr::Borrowed(""));
                }
                Event::InlineHtml(CowStr::from(format!(
                    "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">",
                    escape_attribute(&dest_url)
                )))
            }
            Event::End(TagEnd::Link) => {
                if std::mem::take(&mut dropped_link) {
                    Event::InlineHtml(CowStr::Borrowed(""))
                } else {
                    Event::InlineHtml(CowStr::Borrowed("</a>"))
                }
            }
            Event::Html(raw) | Event::InlineHtml(raw) if !allow_raw_html => Event::Text(raw),
            other => other,
        });

        let mut out = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut out, events);
        out
    }
}
