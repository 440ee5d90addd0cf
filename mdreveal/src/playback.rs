//! Typewriter-style playback of a finished response.
//!
//! A [`PlaybackSession`] reveals its source one character per tick. Every tick re-renders the
//! whole revealed prefix with the session's [`Markdown`] implementation and writes the result,
//! plus a transient cursor glyph, to a single output region. Nothing is patched incrementally, so
//! what the region shows after any tick is exactly `render(prefix) + cursor`.
//!
//! Sessions are runtime-agnostic: the host decides when ticks happen (a timer, an animation
//! frame callback, or `mdreveal-tokio`). Writes to one region are strictly ordered because a
//! session only advances inside `&mut self` calls.

use std::time::Instant;

use crate::continuation::Continuation;
use crate::options::PlaybackOptions;
use crate::region::{OutputRegion, RegionError, ScrollTarget};
use crate::render::{ChatMarkdown, Markdown};
use crate::scroll::{ScrollCoordinator, ScrollMode};
use crate::types::{Frame, SessionId, SessionState, Step, TickOutcome};

pub struct PlaybackSession<M = ChatMarkdown> {
    id: SessionId,
    source: String,
    /// Byte offset just past each character of `source`.
    char_ends: Vec<usize>,
    cursor: usize,
    opts: PlaybackOptions,
    renderer: M,
    scroll: ScrollCoordinator,
    state: SessionState,
}

impl<M: Markdown> PlaybackSession<M> {
    pub fn new(source: impl Into<String>, renderer: M, opts: PlaybackOptions) -> Self {
        let source = source.into();
        let char_ends = source.char_indices().map(|(i, c)| i + c.len_utf8()).collect();
        let scroll = ScrollCoordinator::new(opts.scroll);
        Self {
            id: SessionId::next(),
            source,
            char_ends,
            cursor: 0,
            opts,
            renderer,
            scroll,
            state: SessionState::Running,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Length of the source in characters.
    pub fn len(&self) -> usize {
        self.char_ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.char_ends.is_empty()
    }

    /// Number of characters revealed so far.
    pub fn revealed(&self) -> usize {
        self.cursor
    }

    pub fn revealed_text(&self) -> &str {
        match self.cursor {
            0 => "",
            n => &self.source[..self.char_ends[n - 1]],
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state != SessionState::Running
    }

    pub fn options(&self) -> &PlaybackOptions {
        &self.opts
    }

    pub fn renderer(&self) -> &M {
        &self.renderer
    }

    /// Decide and render the next frame without writing it anywhere.
    ///
    /// The continuation is only consulted while characters remain: a session whose text is
    /// exhausted always produces its final frame.
    pub fn next_step<C: Continuation + ?Sized>(&mut self, continuation: &C) -> Step {
        if self.state != SessionState::Running {
            return Step::Idle;
        }

        if self.cursor < self.len() && continuation.should_continue() {
            let end = self.char_ends[self.cursor];
            let mut markup = self.renderer.render(&self.source[..end]);
            markup.push_str(&self.opts.cursor_glyph);
            self.cursor += 1;
            Step::Frame(Frame {
                index: self.cursor,
                markup,
                is_final: false,
            })
        } else if self.cursor >= self.len() {
            self.state = SessionState::Completed;
            Step::Frame(Frame {
                index: self.cursor,
                markup: self.renderer.render(&self.source),
                is_final: true,
            })
        } else {
            self.state = SessionState::Cancelled;
            Step::Cancelled {
                revealed: self.cursor,
            }
        }
    }

    /// Frames until the final one, or until cancellation is observed.
    pub fn frames<'a, C: Continuation + ?Sized>(
        &'a mut self,
        continuation: &'a C,
    ) -> Frames<'a, M, C> {
        Frames {
            session: self,
            continuation,
        }
    }

    /// Run one tick: write the next frame to `region` and keep `viewport` pinned to it.
    ///
    /// Non-final frames request a throttled scroll; the final frame forces one. A failed write
    /// ends the session.
    pub fn tick<R, V, C>(
        &mut self,
        region: &mut R,
        viewport: &mut V,
        continuation: &C,
        now: Instant,
    ) -> Result<TickOutcome, RegionError>
    where
        R: OutputRegion + ?Sized,
        V: ScrollTarget + ?Sized,
        C: Continuation + ?Sized,
    {
        match self.next_step(continuation) {
            Step::Frame(frame) => {
                if let Err(err) = region.set_markup(&frame.markup) {
                    self.state = SessionState::Failed;
                    tracing::warn!(session = %self.id, index = frame.index, error = %err, "playback write failed");
                    return Err(err);
                }
                if frame.is_final {
                    self.scroll.request(viewport, ScrollMode::Forced, now);
                    tracing::debug!(session = %self.id, chars = frame.index, "playback completed");
                    Ok(TickOutcome::Completed)
                } else {
                    self.scroll.request(viewport, ScrollMode::Throttled, now);
                    tracing::trace!(session = %self.id, index = frame.index, "playback tick");
                    Ok(TickOutcome::Advanced { index: frame.index })
                }
            }
            Step::Cancelled { revealed } => {
                tracing::debug!(session = %self.id, revealed, "playback cancelled");
                Ok(TickOutcome::Cancelled { revealed })
            }
            Step::Idle => Ok(TickOutcome::Idle),
        }
    }

    /// Cleanup after cancellation: show the revealed prefix without the cursor glyph and force a
    /// scroll so it is visible.
    pub fn settle_cancelled<R, V>(
        &mut self,
        region: &mut R,
        viewport: &mut V,
        now: Instant,
    ) -> Result<(), RegionError>
    where
        R: OutputRegion + ?Sized,
        V: ScrollTarget + ?Sized,
    {
        let markup = self.renderer.render(self.revealed_text());
        region.set_markup(&markup)?;
        self.scroll.request(viewport, ScrollMode::Forced, now);
        Ok(())
    }
}

impl<M> std::fmt::Debug for PlaybackSession<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("id", &self.id)
            .field("cursor", &self.cursor)
            .field("len", &self.char_ends.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Cancellation-aware frame iterator returned by [`PlaybackSession::frames`].
pub struct Frames<'a, M, C: ?Sized> {
    session: &'a mut PlaybackSession<M>,
    continuation: &'a C,
}

impl<M: Markdown, C: Continuation + ?Sized> Iterator for Frames<'_, M, C> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        match self.session.next_step(self.continuation) {
            Step::Frame(frame) => Some(frame),
            Step::Cancelled { .. } | Step::Idle => None,
        }
    }
}

/// Remove a trailing cursor glyph from markup written by an interrupted session.
pub fn strip_cursor(markup: &str, glyph: &str) -> String {
    if glyph.is_empty() {
        return markup.to_string();
    }
    match markup.strip_suffix(glyph) {
        Some(stripped) => stripped.to_string(),
        None => markup.replace(glyph, ""),
    }
}
