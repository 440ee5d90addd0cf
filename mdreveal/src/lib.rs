//! Typewriter-style playback of chat responses.
//!
//! `mdreveal` takes a finished assistant response and reveals it one character per tick,
//! re-rendering the growing prefix to HTML each time so the page always shows well-formed markup.
//!
//! - [`render`] / [`ChatMarkdown`]: a small Markdown dialect that is safe on any prefix.
//! - [`PlaybackSession`]: the per-message reveal state machine (one call, one tick).
//! - [`ScrollCoordinator`]: throttled "keep the newest content visible".
//! - [`MessagePresenter`]: binds messages to output regions and decides what animates.
//!
//! The crate is runtime-agnostic; `mdreveal-tokio` drives sessions on a tokio timer.

pub mod activity;
pub mod adapters;
pub mod continuation;
pub mod message;
pub mod options;
pub mod playback;
pub mod region;
pub mod render;
pub mod scroll;
pub mod syntax;
pub mod types;

pub use activity::*;
pub use continuation::*;
pub use message::*;
pub use options::*;
pub use playback::*;
pub use region::*;
pub use render::{ChatMarkdown, FnMarkdown, Markdown, escape_attribute, escape_html, render};
pub use scroll::*;
pub use syntax::*;
pub use types::*;
