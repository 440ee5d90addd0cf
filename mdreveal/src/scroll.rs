//! Keeps the viewport pinned to the newest content without scrolling on every tick.
//!
//! Playback asks for a scroll after each frame. Most of those requests are throttled: once a
//! scroll executes, throttled requests inside the window are dropped. Completion and cleanup
//! requests are forced and always execute, so the final state is visible even when the last
//! throttled request was dropped.
//!
//! Time is passed in by the caller, which keeps the coordinator a pure helper that can be unit
//! tested without a clock.

use std::time::Instant;

use crate::options::ScrollOptions;
use crate::region::{ScrollBehavior, ScrollTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    /// Subject to the throttle window.
    Throttled,
    /// Always executes.
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOutcome {
    Executed(ScrollBehavior),
    Dropped,
}

#[derive(Debug, Clone, Default)]
pub struct ScrollCoordinator {
    opts: ScrollOptions,
    last_executed_at: Option<Instant>,
}

impl ScrollCoordinator {
    pub fn new(opts: ScrollOptions) -> Self {
        Self {
            opts,
            last_executed_at: None,
        }
    }

    pub fn options(&self) -> ScrollOptions {
        self.opts
    }

    /// Scroll `target` to its end unless a throttled request falls inside the window.
    pub fn request<V: ScrollTarget + ?Sized>(
        &mut self,
        target: &mut V,
        mode: ScrollMode,
        now: Instant,
    ) -> ScrollOutcome {
        if mode == ScrollMode::Throttled && self.in_window(now) {
            tracing::trace!("scroll request dropped inside throttle window");
            return ScrollOutcome::Dropped;
        }

        let behavior = if self.opts.smooth && target.supports_smooth() {
            ScrollBehavior::Smooth
        } else {
            ScrollBehavior::Instant
        };
        let extent = target.scroll_extent();
        target.scroll_to(extent, behavior);
        self.last_executed_at = Some(now);
        ScrollOutcome::Executed(behavior)
    }

    /// Forget the last executed scroll so the next request runs regardless of the window.
    pub fn reset(&mut self) {
        self.last_executed_at = None;
    }

    fn in_window(&self, now: Instant) -> bool {
        let Some(last) = self.last_executed_at else {
            return false;
        };
        now.saturating_duration_since(last) < self.opts.throttle_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::MemoryViewport;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn two_requests_inside_window_scroll_once() {
        let t0 = Instant::now();
        let mut viewport = MemoryViewport::new();
        let mut scroll = ScrollCoordinator::default();

        assert_eq!(
            scroll.request(&mut viewport, ScrollMode::Throttled, t0),
            ScrollOutcome::Executed(ScrollBehavior::Smooth)
        );
        assert_eq!(
            scroll.request(&mut viewport, ScrollMode::Throttled, t0 + Duration::from_millis(50)),
            ScrollOutcome::Dropped
        );
        assert_eq!(viewport.scrolls().len(), 1);
    }

    #[test]
    fn window_reopens_after_throttle_interval() {
        let t0 = Instant::now();
        let mut viewport = MemoryViewport::new();
        let mut scroll = ScrollCoordinator::default();

        scroll.request(&mut viewport, ScrollMode::Throttled, t0);
        let later = t0 + Duration::from_millis(120);
        assert_eq!(
            scroll.request(&mut viewport, ScrollMode::Throttled, later),
            ScrollOutcome::Executed(ScrollBehavior::Smooth)
        );
    }

    #[test]
    fn forced_requests_ignore_the_window() {
        let t0 = Instant::now();
        let mut viewport = MemoryViewport::new();
        let mut scroll = ScrollCoordinator::default();

        scroll.request(&mut viewport, ScrollMode::Throttled, t0);
        assert_eq!(
            scroll.request(&mut viewport, ScrollMode::Forced, t0 + Duration::from_millis(1)),
            ScrollOutcome::Executed(ScrollBehavior::Smooth)
        );
        assert_eq!(viewport.scrolls().len(), 2);
    }

    #[test]
    fn falls_back_to_instant_without_smooth_support() {
        let mut viewport = MemoryViewport::without_smooth();
        viewport.set_extent(300);
        let mut scroll = ScrollCoordinator::default();

        assert_eq!(
            scroll.request(&mut viewport, ScrollMode::Forced, Instant::now()),
            ScrollOutcome::Executed(ScrollBehavior::Instant)
        );
        assert_eq!(viewport.offset(), 300);
    }

    #[test]
    fn reset_reopens_the_window() {
        let t0 = Instant::now();
        let mut viewport = MemoryViewport::new();
        let mut scroll = ScrollCoordinator::default();

        scroll.request(&mut viewport, ScrollMode::Throttled, t0);
        scroll.reset();
        assert!(matches!(
            scroll.request(&mut viewport, ScrollMode::Throttled, t0),
            ScrollOutcome::Executed(_)
        ));
    }
}
