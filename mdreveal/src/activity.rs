use std::collections::BTreeSet;

use crate::types::{PlaybackEvent, SessionId};

/// Receives session lifecycle events.
///
/// UI state that used to watch a shared "is animating" boolean (input locking, side panels)
/// implements this instead and derives its state from the events.
pub trait PlaybackObserver {
    fn on_event(&mut self, event: &PlaybackEvent);
}

impl<O: PlaybackObserver + ?Sized> PlaybackObserver for &mut O {
    fn on_event(&mut self, event: &PlaybackEvent) {
        (**self).on_event(event)
    }
}

/// An observer backed by a closure.
pub struct FnObserver<F>(pub F);

impl<F> PlaybackObserver for FnObserver<F>
where
    F: FnMut(&PlaybackEvent),
{
    fn on_event(&mut self, event: &PlaybackEvent) {
        (self.0)(event)
    }
}

/// Tracks which sessions are currently animating.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityTracker {
    active: BTreeSet<SessionId>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_animating(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn active(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, id: SessionId) -> bool {
        self.active.contains(&id)
    }
}

impl PlaybackObserver for ActivityTracker {
    fn on_event(&mut self, event: &PlaybackEvent) {
        match *event {
            PlaybackEvent::Started { id } => {
                self.active.insert(id);
            }
            PlaybackEvent::Completed { id }
            | PlaybackEvent::Cancelled { id, .. }
            | PlaybackEvent::Failed { id } => {
                self.active.remove(&id);
            }
        }
    }
}
