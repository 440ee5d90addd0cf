use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Polled once per tick: playback keeps going only while this returns `true`.
///
/// Cancellation is cooperative. A session never preempts a render; it checks its continuation
/// at the top of the next tick and stops there.
pub trait Continuation {
    fn should_continue(&self) -> bool;
}

impl<C: Continuation + ?Sized> Continuation for &C {
    fn should_continue(&self) -> bool {
        (**self).should_continue()
    }
}

impl<C: Continuation + ?Sized> Continuation for Arc<C> {
    fn should_continue(&self) -> bool {
        (**self).should_continue()
    }
}

/// A shared "is animating" flag owned by single-threaded UI code.
impl Continuation for Cell<bool> {
    fn should_continue(&self) -> bool {
        self.get()
    }
}

impl Continuation for AtomicBool {
    fn should_continue(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

/// A continuation backed by a closure.
pub struct FnContinuation<F>(pub F);

impl<F> Continuation for FnContinuation<F>
where
    F: Fn() -> bool,
{
    fn should_continue(&self) -> bool {
        (self.0)()
    }
}

/// Never cancels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Uninterrupted;

impl Continuation for Uninterrupted {
    fn should_continue(&self) -> bool {
        true
    }
}

/// Per-session cancellation token. Clones share state; cancelling is permanent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Continuation for CancelToken {
    fn should_continue(&self) -> bool {
        !self.is_cancelled()
    }
}
