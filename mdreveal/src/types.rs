use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Allocate a process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        SessionId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Completed,
    Cancelled,
    /// The output region rejected a write.
    Failed,
}

/// One rendered state of a playback session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Number of characters revealed by this frame.
    pub index: usize,
    pub markup: String,
    /// The final frame renders the whole text and carries no cursor glyph.
    pub is_final: bool,
}

/// What the next tick of a session will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Frame(Frame),
    /// Cancellation was observed before the text was exhausted.
    Cancelled { revealed: usize },
    /// The session already terminated.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A non-final frame revealing `index` characters was written.
    Advanced { index: usize },
    /// The final frame was written.
    Completed,
    /// Cancellation was observed; the last written frame (cursor included) stays in place.
    Cancelled { revealed: usize },
    Idle,
}

impl TickOutcome {
    /// Terminal outcomes map to a lifecycle event.
    pub fn event(self, id: SessionId) -> Option<PlaybackEvent> {
        match self {
            TickOutcome::Completed => Some(PlaybackEvent::Completed { id }),
            TickOutcome::Cancelled { revealed } => Some(PlaybackEvent::Cancelled { id, revealed }),
            TickOutcome::Advanced { .. } | TickOutcome::Idle => None,
        }
    }
}

/// Session lifecycle notifications for UI state that must track "a message is animating".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started { id: SessionId },
    Completed { id: SessionId },
    Cancelled { id: SessionId, revealed: usize },
    Failed { id: SessionId },
}

impl PlaybackEvent {
    pub fn id(&self) -> SessionId {
        match *self {
            PlaybackEvent::Started { id }
            | PlaybackEvent::Completed { id }
            | PlaybackEvent::Cancelled { id, .. }
            | PlaybackEvent::Failed { id } => id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PlaybackEvent::Started { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::next();
        let b = SessionId::next();
        assert_ne!(a, b);
        assert_eq!(format!("{:?}", SessionId(3)), "SessionId(3)");
        assert_eq!(SessionId(3).to_string(), "#3");
    }

    #[test]
    fn only_terminal_outcomes_produce_events() {
        let id = SessionId(9);
        assert_eq!(TickOutcome::Advanced { index: 1 }.event(id), None);
        assert_eq!(TickOutcome::Idle.event(id), None);
        assert_eq!(
            TickOutcome::Completed.event(id),
            Some(PlaybackEvent::Completed { id })
        );
        let cancelled = TickOutcome::Cancelled { revealed: 2 }.event(id).unwrap();
        assert!(cancelled.is_terminal());
        assert_eq!(cancelled.id(), id);
    }
}
