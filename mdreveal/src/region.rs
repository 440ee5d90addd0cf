//! Output regions and scroll targets: the two surfaces playback writes to.

use std::sync::{Arc, Mutex, PoisonError};

use crate::message::RegionDescriptor;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionError {
    #[error("output region is no longer attached")]
    Detached,
    #[error("output region rejected the write: {0}")]
    Rejected(String),
}

/// A place markup for one chat message can be written to and read back from.
pub trait OutputRegion {
    /// Replace the region's markup.
    fn set_markup(&mut self, markup: &str) -> Result<(), RegionError>;

    fn markup(&self) -> String;
}

impl<R: OutputRegion + ?Sized> OutputRegion for &mut R {
    fn set_markup(&mut self, markup: &str) -> Result<(), RegionError> {
        (**self).set_markup(markup)
    }

    fn markup(&self) -> String {
        (**self).markup()
    }
}

/// Shared regions let a driver task write while the host keeps a handle for reading.
impl<R: OutputRegion + ?Sized> OutputRegion for Arc<Mutex<R>> {
    fn set_markup(&mut self, markup: &str) -> Result<(), RegionError> {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_markup(markup)
    }

    fn markup(&self) -> String {
        self.lock().unwrap_or_else(PoisonError::into_inner).markup()
    }
}

/// An in-memory region, useful for headless hosts and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryRegion {
    descriptor: Option<RegionDescriptor>,
    markup: String,
    writes: usize,
    detached: bool,
}

impl MemoryRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_descriptor(descriptor: RegionDescriptor) -> Self {
        Self {
            descriptor: Some(descriptor),
            ..Self::default()
        }
    }

    pub fn descriptor(&self) -> Option<&RegionDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn as_str(&self) -> &str {
        &self.markup
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Simulate the region being removed from the page; later writes fail.
    pub fn detach(&mut self) {
        self.detached = true;
    }
}

impl OutputRegion for MemoryRegion {
    fn set_markup(&mut self, markup: &str) -> Result<(), RegionError> {
        if self.detached {
            return Err(RegionError::Detached);
        }
        self.markup.clear();
        self.markup.push_str(markup);
        self.writes += 1;
        Ok(())
    }

    fn markup(&self) -> String {
        self.markup.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// The scrollable viewport that contains the output regions.
pub trait ScrollTarget {
    /// Current scrollable extent (the offset that shows the newest content).
    fn scroll_extent(&self) -> u64;

    fn scroll_to(&mut self, offset: u64, behavior: ScrollBehavior);

    fn supports_smooth(&self) -> bool {
        true
    }
}

impl<V: ScrollTarget + ?Sized> ScrollTarget for &mut V {
    fn scroll_extent(&self) -> u64 {
        (**self).scroll_extent()
    }

    fn scroll_to(&mut self, offset: u64, behavior: ScrollBehavior) {
        (**self).scroll_to(offset, behavior)
    }

    fn supports_smooth(&self) -> bool {
        (**self).supports_smooth()
    }
}

impl<V: ScrollTarget + ?Sized> ScrollTarget for Arc<Mutex<V>> {
    fn scroll_extent(&self) -> u64 {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .scroll_extent()
    }

    fn scroll_to(&mut self, offset: u64, behavior: ScrollBehavior) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .scroll_to(offset, behavior)
    }

    fn supports_smooth(&self) -> bool {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .supports_smooth()
    }
}

/// A viewport that never moves. For hosts without scrolling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoScroll;

impl ScrollTarget for NoScroll {
    fn scroll_extent(&self) -> u64 {
        0
    }

    fn scroll_to(&mut self, _offset: u64, _behavior: ScrollBehavior) {}
}

/// An in-memory viewport that records executed scrolls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryViewport {
    extent: u64,
    offset: u64,
    smooth: bool,
    scrolls: Vec<ScrollBehavior>,
}

impl Default for MemoryViewport {
    fn default() -> Self {
        Self {
            extent: 0,
            offset: 0,
            smooth: true,
            scrolls: Vec::new(),
        }
    }
}

impl MemoryViewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A viewport whose surface cannot animate scrolling.
    pub fn without_smooth() -> Self {
        Self {
            smooth: false,
            ..Self::default()
        }
    }

    pub fn set_extent(&mut self, extent: u64) {
        self.extent = extent;
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Behaviours of every executed scroll, oldest first.
    pub fn scrolls(&self) -> &[ScrollBehavior] {
        &self.scrolls
    }
}

impl ScrollTarget for MemoryViewport {
    fn scroll_extent(&self) -> u64 {
        self.extent
    }

    fn scroll_to(&mut self, offset: u64, behavior: ScrollBehavior) {
        self.offset = offset.min(self.extent);
        self.scrolls.push(behavior);
    }

    fn supports_smooth(&self) -> bool {
        self.smooth
    }
}
