//! Tokio glue for `mdreveal`.
//!
//! `mdreveal` sessions are runtime-agnostic state machines: one `tick` call reveals one character.
//! This crate drives them on a tokio timer:
//!
//! - [`PlaybackDriver::play`] spawns a task that ticks a session at its configured interval.
//! - Each session gets its own [`CancellationToken`]; an optional parent token stops every
//!   session started by the same driver at once.
//! - [`ActivityHub`] publishes "how many messages are animating" on a `watch` channel, so input
//!   locking or side panels can subscribe instead of sharing a global boolean.
//!
//! Must be used from within a tokio runtime.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use mdreveal::{
    ActivityTracker, ChatMarkdown, ChatMessage, Continuation, Markdown, MessagePresenter,
    OutputRegion, PlaybackEvent, PlaybackObserver, PlaybackSession, Presentation, RegionError,
    RegionFactory, ScrollTarget, SessionId, SessionState, TickOutcome,
};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeedPreset {
    Fast,
    Normal,
    Relaxed,
}

impl SpeedPreset {
    pub fn next(self) -> Self {
        match self {
            SpeedPreset::Fast => SpeedPreset::Normal,
            SpeedPreset::Normal => SpeedPreset::Relaxed,
            SpeedPreset::Relaxed => SpeedPreset::Fast,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpeedPreset::Fast => "fast",
            SpeedPreset::Normal => "normal",
            SpeedPreset::Relaxed => "relaxed",
        }
    }

    /// Delay between two revealed characters.
    pub fn interval(self) -> Duration {
        match self {
            SpeedPreset::Fast => Duration::from_millis(8),
            SpeedPreset::Normal => Duration::from_millis(15),
            SpeedPreset::Relaxed => Duration::from_millis(35),
        }
    }
}

/// Snapshot published by [`ActivityHub`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Activity {
    /// Sessions started and not yet completed, cancelled or failed.
    pub active: usize,
}

impl Activity {
    pub fn is_animating(&self) -> bool {
        self.active > 0
    }
}

/// Publishes session lifecycle as a `watch` channel of [`Activity`].
///
/// Clones share the same channel.
#[derive(Clone, Debug)]
pub struct ActivityHub {
    inner: Arc<HubInner>,
}

#[derive(Debug)]
struct HubInner {
    tx: watch::Sender<Activity>,
    tracker: Mutex<ActivityTracker>,
}

impl Default for ActivityHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityHub {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Activity::default());
        Self {
            inner: Arc::new(HubInner {
                tx,
                tracker: Mutex::new(ActivityTracker::new()),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Activity> {
        self.inner.tx.subscribe()
    }

    pub fn current(&self) -> Activity {
        *self.inner.tx.borrow()
    }

    pub fn report(&self, event: &PlaybackEvent) {
        let active = {
            let mut tracker = self
                .inner
                .tracker
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            tracker.on_event(event);
            tracker.active()
        };
        // Subscribers only care about transitions.
        self.inner.tx.send_if_modified(|current| {
            if current.active == active {
                return false;
            }
            current.active = active;
            true
        });
    }
}

impl PlaybackObserver for ActivityHub {
    fn on_event(&mut self, event: &PlaybackEvent) {
        self.report(event);
    }
}

struct TokenContinuation<'a>(&'a CancellationToken);

impl Continuation for TokenContinuation<'_> {
    fn should_continue(&self) -> bool {
        !self.0.is_cancelled()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    /// Stopped early; the region still shows the last frame, cursor glyph included.
    Cancelled { revealed: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Region(#[from] RegionError),
    #[error("playback task failed: {0}")]
    Join(#[from] JoinError),
}

/// Everything a finished playback task hands back.
#[derive(Debug)]
pub struct PlaybackReport<R, V, M = ChatMarkdown> {
    pub outcome: PlaybackOutcome,
    pub session: PlaybackSession<M>,
    pub region: R,
    pub viewport: V,
}

/// A running playback task.
///
/// Dropping the handle detaches the task; it keeps playing until done.
pub struct PlaybackHandle<R, V, M = ChatMarkdown> {
    id: SessionId,
    token: CancellationToken,
    task: JoinHandle<Result<PlaybackReport<R, V, M>, PlaybackError>>,
}

impl<R, V, M> PlaybackHandle<R, V, M>
where
    R: OutputRegion + Send + 'static,
    V: ScrollTarget + Send + 'static,
    M: Markdown + 'static,
{
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Ask the session to stop at its next tick. The last frame is left as is.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session to complete or observe cancellation.
    pub async fn completed(self) -> Result<PlaybackReport<R, V, M>, PlaybackError> {
        self.task.await?
    }

    /// Cancel, wait, and clean up: a cancelled region is re-rendered without the cursor glyph and
    /// the viewport is scrolled regardless of the throttle.
    pub async fn stop(self) -> Result<PlaybackReport<R, V, M>, PlaybackError> {
        self.token.cancel();
        let mut report = self.task.await??;
        if let PlaybackOutcome::Cancelled { revealed } = report.outcome {
            report.session.settle_cancelled(
                &mut report.region,
                &mut report.viewport,
                Instant::now().into_std(),
            )?;
            tracing::debug!(session = %report.session.id(), revealed, "playback settled");
        }
        Ok(report)
    }
}

/// Result of [`PlaybackDriver::present`].
pub enum Presented<R, V, M = ChatMarkdown> {
    Static(R),
    Animated(PlaybackHandle<R, V, M>),
}

/// Spawns playback tasks.
#[derive(Clone, Debug, Default)]
pub struct PlaybackDriver {
    hub: Option<ActivityHub>,
    parent: Option<CancellationToken>,
}

impl PlaybackDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report every session's lifecycle to `hub`.
    pub fn with_activity(mut self, hub: ActivityHub) -> Self {
        self.hub = Some(hub);
        self
    }

    /// Derive session tokens from `parent`; cancelling it stops every session of this driver.
    pub fn with_parent_token(mut self, parent: CancellationToken) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn activity(&self) -> Option<&ActivityHub> {
        self.hub.as_ref()
    }

    /// Start driving `session` into `region`.
    pub fn play<R, V, M>(
        &self,
        session: PlaybackSession<M>,
        region: R,
        viewport: V,
    ) -> PlaybackHandle<R, V, M>
    where
        R: OutputRegion + Send + 'static,
        V: ScrollTarget + Send + 'static,
        M: Markdown + 'static,
    {
        let id = session.id();
        let token = match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        if let Some(hub) = &self.hub {
            hub.report(&PlaybackEvent::Started { id });
        }
        tracing::debug!(
            session = %id,
            chars = session.len(),
            interval_ms = session.options().tick_interval.as_millis() as u64,
            "playback started"
        );

        let task = tokio::spawn(run_session(
            session,
            region,
            viewport,
            token.clone(),
            self.hub.clone(),
        ));
        PlaybackHandle { id, token, task }
    }

    /// Present `message` and, if it animates, start playing it.
    pub fn present<F, V, M>(
        &self,
        presenter: &MessagePresenter<M>,
        factory: &mut F,
        message: ChatMessage,
        viewport: V,
    ) -> Result<Presented<F::Region, V, M>, RegionError>
    where
        F: RegionFactory,
        F::Region: Send + 'static,
        V: ScrollTarget + Send + 'static,
        M: Markdown + Clone + 'static,
    {
        match presenter.present(factory, message)? {
            Presentation::Static(region) => Ok(Presented::Static(region)),
            Presentation::Animated { region, session } => {
                Ok(Presented::Animated(self.play(session, region, viewport)))
            }
        }
    }
}

/// Play `session` on its own token, without activity reporting.
pub fn play<R, V, M>(session: PlaybackSession<M>, region: R, viewport: V) -> PlaybackHandle<R, V, M>
where
    R: OutputRegion + Send + 'static,
    V: ScrollTarget + Send + 'static,
    M: Markdown + 'static,
{
    PlaybackDriver::new().play(session, region, viewport)
}

/// Present `message`, reporting an animated reply to `hub` when given.
pub fn present_message<F, V, M>(
    presenter: &MessagePresenter<M>,
    factory: &mut F,
    message: ChatMessage,
    viewport: V,
    hub: Option<&ActivityHub>,
) -> Result<Presented<F::Region, V, M>, RegionError>
where
    F: RegionFactory,
    F::Region: Send + 'static,
    V: ScrollTarget + Send + 'static,
    M: Markdown + Clone + 'static,
{
    let driver = match hub {
        Some(hub) => PlaybackDriver::new().with_activity(hub.clone()),
        None => PlaybackDriver::new(),
    };
    driver.present(presenter, factory, message, viewport)
}

async fn run_session<R, V, M>(
    mut session: PlaybackSession<M>,
    mut region: R,
    mut viewport: V,
    token: CancellationToken,
    hub: Option<ActivityHub>,
) -> Result<PlaybackReport<R, V, M>, PlaybackError>
where
    R: OutputRegion,
    V: ScrollTarget,
    M: Markdown,
{
    let id = session.id();
    let period = session
        .options()
        .tick_interval
        .max(Duration::from_millis(1));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let continuation = TokenContinuation(&token);

    let result = loop {
        tokio::select! {
            _ = interval.tick() => {}
            // Wake early; the token is re-checked at the top of the tick.
            _ = token.cancelled() => {}
        }

        let now = Instant::now().into_std();
        match session.tick(&mut region, &mut viewport, &continuation, now) {
            Ok(TickOutcome::Advanced { .. }) => continue,
            Ok(TickOutcome::Completed) => break Ok(PlaybackOutcome::Completed),
            Ok(TickOutcome::Cancelled { revealed }) => {
                break Ok(PlaybackOutcome::Cancelled { revealed });
            }
            Ok(TickOutcome::Idle) => break Ok(idle_outcome(&session)),
            Err(err) => break Err(err),
        }
    };

    let event = match &result {
        Ok(PlaybackOutcome::Completed) => PlaybackEvent::Completed { id },
        Ok(PlaybackOutcome::Cancelled { revealed }) => PlaybackEvent::Cancelled {
            id,
            revealed: *revealed,
        },
        Err(_) => PlaybackEvent::Failed { id },
    };
    if let Some(hub) = &hub {
        hub.report(&event);
    }

    let outcome = result?;
    Ok(PlaybackReport {
        outcome,
        session,
        region,
        viewport,
    })
}

/// A session handed over after it already terminated.
fn idle_outcome<M: Markdown>(session: &PlaybackSession<M>) -> PlaybackOutcome {
    match session.state() {
        SessionState::Cancelled => PlaybackOutcome::Cancelled {
            revealed: session.revealed(),
        },
        _ => PlaybackOutcome::Completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdreveal::{
        MemoryRegion, MemoryRegionFactory, MemoryViewport, NoScroll, PlaybackOptions,
        PresenterOptions, render,
    };
    use pretty_assertions::assert_eq;
    use tokio::time;

    type Shared<T> = Arc<Mutex<T>>;

    fn shared<T>(value: T) -> Shared<T> {
        Arc::new(Mutex::new(value))
    }

    fn session(text: &str, interval_ms: u64) -> PlaybackSession {
        PlaybackSession::new(
            text,
            ChatMarkdown::default(),
            PlaybackOptions {
                tick_interval: Duration::from_millis(interval_ms),
                ..PlaybackOptions::default()
            },
        )
    }

    fn glyph() -> String {
        PlaybackOptions::default().cursor_glyph
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn plays_to_completion_and_writes_final_markup() {
        let region = shared(MemoryRegion::new());
        let viewport = shared(MemoryViewport::new());
        let handle = PlaybackDriver::new().play(
            session("It is **4**.", 10),
            Arc::clone(&region),
            Arc::clone(&viewport),
        );

        let report = handle.completed().await.unwrap();
        assert_eq!(report.outcome, PlaybackOutcome::Completed);

        let region = region.lock().unwrap();
        assert_eq!(region.as_str(), render("It is **4**."));
        assert_eq!(region.writes(), "It is **4**.".chars().count() + 1);
        assert!(!viewport.lock().unwrap().scrolls().is_empty());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn cancellation_leaves_the_last_frame_in_place() {
        let region = shared(MemoryRegion::new());
        let handle = PlaybackDriver::new().play(session("0123456789", 10), Arc::clone(&region), NoScroll);

        while region.lock().unwrap().writes() < 2 {
            time::sleep(Duration::from_millis(1)).await;
        }
        handle.cancel();

        let report = handle.completed().await.unwrap();
        assert_eq!(report.outcome, PlaybackOutcome::Cancelled { revealed: 2 });
        let region = region.lock().unwrap();
        assert_eq!(region.writes(), 2);
        assert_eq!(region.as_str(), format!("{}{}", render("01"), glyph()));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn stop_strips_the_cursor_and_scrolls() {
        let text = "abcdefghij";
        let region = shared(MemoryRegion::new());
        let viewport = shared(MemoryViewport::new());
        let handle =
            PlaybackDriver::new().play(session(text, 10), Arc::clone(&region), Arc::clone(&viewport));

        time::sleep(Duration::from_millis(25)).await;
        let report = handle.stop().await.unwrap();

        let PlaybackOutcome::Cancelled { revealed } = report.outcome else {
            panic!("expected cancellation, got {:?}", report.outcome);
        };
        assert!(revealed > 0 && revealed < text.len());
        assert_eq!(region.lock().unwrap().as_str(), render(&text[..revealed]));
        assert_eq!(
            viewport.lock().unwrap().scrolls().last(),
            Some(&mdreveal::ScrollBehavior::Smooth)
        );
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn activity_hub_tracks_start_and_finish() {
        let hub = ActivityHub::new();
        let mut rx = hub.subscribe();
        let driver = PlaybackDriver::new().with_activity(hub.clone());

        let handle = driver.play(session("hi", 5), MemoryRegion::new(), NoScroll);
        assert!(hub.current().is_animating());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().active, 1);

        handle.completed().await.unwrap();
        assert_eq!(hub.current(), Activity { active: 0 });
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn parent_token_stops_every_session() {
        let parent = CancellationToken::new();
        let hub = ActivityHub::new();
        let driver = PlaybackDriver::new()
            .with_parent_token(parent.clone())
            .with_activity(hub.clone());

        let a = driver.play(session("first message", 10), MemoryRegion::new(), NoScroll);
        let b = driver.play(session("second message", 10), MemoryRegion::new(), NoScroll);
        assert_eq!(hub.current().active, 2);

        time::sleep(Duration::from_millis(15)).await;
        parent.cancel();

        let a = a.completed().await.unwrap();
        let b = b.completed().await.unwrap();
        assert!(matches!(a.outcome, PlaybackOutcome::Cancelled { .. }));
        assert!(matches!(b.outcome, PlaybackOutcome::Cancelled { .. }));
        assert!(!hub.current().is_animating());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn sibling_sessions_do_not_cancel_each_other() {
        let driver = PlaybackDriver::new();
        let a = driver.play(session("abcdef", 10), MemoryRegion::new(), NoScroll);
        let b = driver.play(session("uvwxyz", 10), MemoryRegion::new(), NoScroll);

        a.cancel();
        let a = a.completed().await.unwrap();
        let b = b.completed().await.unwrap();
        assert!(matches!(a.outcome, PlaybackOutcome::Cancelled { .. }));
        assert_eq!(b.outcome, PlaybackOutcome::Completed);
        assert_eq!(b.region.as_str(), "uvwxyz");
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn detached_region_fails_the_session() {
        let hub = ActivityHub::new();
        let mut region = MemoryRegion::new();
        region.detach();
        let handle = PlaybackDriver::new()
            .with_activity(hub.clone())
            .play(session("abc", 10), region, NoScroll);

        let err = handle.completed().await.unwrap_err();
        assert!(matches!(err, PlaybackError::Region(RegionError::Detached)));
        assert_eq!(hub.current().active, 0);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn present_animates_only_assistant_messages() {
        let presenter = MessagePresenter::new(PresenterOptions::default());
        let mut factory = MemoryRegionFactory::new();
        let driver = PlaybackDriver::new();

        let user = driver
            .present(&presenter, &mut factory, ChatMessage::user("**q**"), NoScroll)
            .unwrap();
        let Presented::Static(region) = user else {
            panic!("user messages render synchronously");
        };
        assert_eq!(region.as_str(), "<strong>q</strong>");

        let reply = driver
            .present(&presenter, &mut factory, ChatMessage::assistant("- a"), NoScroll)
            .unwrap();
        let Presented::Animated(handle) = reply else {
            panic!("assistant messages animate");
        };
        let report = handle.completed().await.unwrap();
        assert_eq!(report.region.as_str(), "<ul><li>a</li></ul>");
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn free_functions_cover_the_common_case() {
        let handle = play(session("*x*", 5), MemoryRegion::new(), NoScroll);
        let report = handle.completed().await.unwrap();
        assert_eq!(report.region.as_str(), "<em>x</em>");

        let hub = ActivityHub::new();
        let presenter = MessagePresenter::new(PresenterOptions::default());
        let mut factory = MemoryRegionFactory::new();
        let presented = present_message(
            &presenter,
            &mut factory,
            ChatMessage::assistant("ok"),
            NoScroll,
            Some(&hub),
        )
        .unwrap();
        assert_eq!(hub.current().active, 1);
        let Presented::Animated(handle) = presented else {
            panic!("assistant messages animate");
        };
        handle.completed().await.unwrap();
        assert_eq!(hub.current().active, 0);
    }

    #[test]
    fn speed_presets_cycle_within_expected_range() {
        let mut preset = SpeedPreset::Fast;
        for _ in 0..3 {
            let ms = preset.interval().as_millis();
            assert!((8..=35).contains(&ms), "{} out of range", preset.label());
            preset = preset.next();
        }
        assert_eq!(preset, SpeedPreset::Fast);
    }
}
