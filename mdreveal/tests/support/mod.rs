#![allow(dead_code)]

use mdreveal::{OutputRegion, RegionError};

/// A region that keeps every write, oldest first.
#[derive(Debug, Default)]
pub struct RecordingRegion {
    pub writes: Vec<String>,
}

impl RecordingRegion {
    pub fn last(&self) -> &str {
        self.writes.last().map(String::as_str).unwrap_or("")
    }
}

impl OutputRegion for RecordingRegion {
    fn set_markup(&mut self, markup: &str) -> Result<(), RegionError> {
        self.writes.push(markup.to_string());
        Ok(())
    }

    fn markup(&self) -> String {
        self.last().to_string()
    }
}

/// Every character-aligned prefix of `text`, shortest first, including `""` and `text`.
pub fn prefixes(text: &str) -> Vec<&str> {
    let mut out: Vec<&str> = text.char_indices().map(|(i, _)| &text[..i]).collect();
    out.push(text);
    out
}

fn fnv1a64(s: &str) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for &b in s.as_bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

fn xorshift64(state: &mut u64) -> u64 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    *state = x;
    x
}

const PIECES: &[&str] = &[
    "word", " ", "\n", "\n\n", "**", "__", "*", "_", "~~", "`", "```", "```rust\n", "# ", "### ",
    "> ", "- ", "* ", "+ ", "1. ", "42. ", "---", "***", "[", "]", "(", ")", "](", "http://x.y",
    "<b>", "&", "\"", "é", "日本", "\r\n", "\t", "#######", "\u{E000}", "0", "\u{E001}",
];

/// A deterministic pseudo-random soup of Markdown fragments.
pub fn markdown_soup(seed_label: &str, trial: u64, pieces: usize) -> String {
    let mut state = fnv1a64(seed_label) ^ (trial.wrapping_mul(0x9e3779b97f4a7c15)) | 1;
    let mut out = String::new();
    for _ in 0..pieces {
        let idx = xorshift64(&mut state) as usize % PIECES.len();
        out.push_str(PIECES[idx]);
    }
    out
}

/// Panics unless every non-void tag in `html` is closed in order.
pub fn assert_well_formed(html: &str, source: &str) {
    let mut stack: Vec<&str> = Vec::new();
    let mut rest = html;
    while let Some(lt) = rest.find('<') {
        rest = &rest[lt + 1..];
        let end = rest
            .find(|c: char| c == '>' || c == ' ')
            .unwrap_or_else(|| panic!("unterminated tag in {html:?} (source {source:?})"));
        let name = &rest[..end];
        if let Some(closing) = name.strip_prefix('/') {
            assert_eq!(
                stack.pop(),
                Some(closing),
                "misnested </{closing}> in {html:?} (source {source:?})"
            );
        } else if !matches!(name, "br" | "hr") {
            stack.push(name);
        }
    }
    assert!(stack.is_empty(), "unclosed {stack:?} in {html:?} (source {source:?})");
}
