use std::time::Duration;

#[cfg(feature = "serde")]
use serde::Deserialize;

/// How surviving line breaks are emitted once blank lines have been dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LineBreakMode {
    /// Emit an explicit `<br>` between adjacent inline lines.
    #[default]
    Break,
    /// Join adjacent inline lines with a single space.
    Space,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RenderOptions {
    pub line_breaks: LineBreakMode,
    /// Escape `&`, `<`, `>` and `"` in text outside of code.
    pub escape_html: bool,
    /// Render an unterminated multi-line code fence as an open code block instead of literal
    /// backticks.
    ///
    /// Off by default: partial constructs stay literal until the closing marker arrives.
    pub close_open_fence: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            line_breaks: LineBreakMode::Break,
            escape_html: true,
            close_open_fence: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScrollOptions {
    /// Throttled scroll requests inside this window after an executed scroll are dropped.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "throttle_window_ms", deserialize_with = "duration_ms::deserialize")
    )]
    pub throttle_window: Duration,
    /// Prefer smooth scrolling when the target supports it.
    pub smooth: bool,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            throttle_window: Duration::from_millis(120),
            smooth: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlaybackOptions {
    #[cfg_attr(
        feature = "serde",
        serde(rename = "tick_interval_ms", deserialize_with = "duration_ms::deserialize")
    )]
    pub tick_interval: Duration,
    /// Markup appended to every non-final frame.
    pub cursor_glyph: String,
    pub scroll: ScrollOptions,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(15),
            cursor_glyph: DEFAULT_CURSOR_GLYPH.to_string(),
            scroll: ScrollOptions::default(),
        }
    }
}

pub const DEFAULT_CURSOR_GLYPH: &str = "<span class=\"typing-cursor\">▋</span>";

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PresenterOptions {
    /// Assistant messages are played back; every other role renders in one write.
    pub animate_assistant: bool,
    /// Optional avatar attached to assistant regions.
    pub assistant_avatar: Option<String>,
    pub render: RenderOptions,
    pub playback: PlaybackOptions,
}

impl Default for PresenterOptions {
    fn default() -> Self {
        Self {
            animate_assistant: true,
            assistant_avatar: None,
            render: RenderOptions::default(),
            playback: PlaybackOptions::default(),
        }
    }
}

#[cfg(feature = "serde")]
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let opts = PlaybackOptions::default();
        assert_eq!(opts.tick_interval, Duration::from_millis(15));
        assert_eq!(opts.scroll.throttle_window, Duration::from_millis(120));
        assert!(opts.scroll.smooth);
        assert_eq!(opts.cursor_glyph, DEFAULT_CURSOR_GLYPH);

        let render = RenderOptions::default();
        assert_eq!(render.line_breaks, LineBreakMode::Break);
        assert!(render.escape_html);
        assert!(!render.close_open_fence);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn playback_options_deserialize_from_milliseconds() {
        let opts: PlaybackOptions = serde_json::from_str(
            r#"{ "tick_interval_ms": 8, "scroll": { "throttle_window_ms": 50, "smooth": false } }"#,
        )
        .unwrap();
        assert_eq!(opts.tick_interval, Duration::from_millis(8));
        assert_eq!(opts.scroll.throttle_window, Duration::from_millis(50));
        assert!(!opts.scroll.smooth);
        assert_eq!(opts.cursor_glyph, DEFAULT_CURSOR_GLYPH);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn render_options_accept_space_line_breaks() {
        let opts: RenderOptions = serde_json::from_str(r#"{ "line_breaks": "space" }"#).unwrap();
        assert_eq!(opts.line_breaks, LineBreakMode::Space);
        assert!(opts.escape_html);
    }
}
