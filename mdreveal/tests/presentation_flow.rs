use std::time::Instant;

use mdreveal::{
    ActivityTracker, ChatMessage, MemoryRegionFactory, MemoryViewport, MessagePresenter,
    PlaybackEvent, PlaybackObserver, Presentation, PresenterOptions, TickOutcome, Uninterrupted,
    render,
};

#[test]
fn assistant_reply_is_played_into_its_region() {
    let presenter = MessagePresenter::new(PresenterOptions::default());
    let mut factory = MemoryRegionFactory::new();
    let mut viewport = MemoryViewport::new();
    let mut activity = ActivityTracker::new();

    let user = presenter
        .present(&mut factory, ChatMessage::user("what is *2+2*?"))
        .unwrap();
    assert_eq!(user.region().as_str(), "what is <em>2+2</em>?");

    let reply = presenter
        .present(&mut factory, ChatMessage::assistant("It is **4**."))
        .unwrap();
    let Presentation::Animated {
        mut region,
        mut session,
    } = reply
    else {
        panic!("assistant replies animate by default");
    };

    activity.on_event(&PlaybackEvent::Started { id: session.id() });
    assert!(activity.is_animating());

    loop {
        let outcome = session
            .tick(&mut region, &mut viewport, &Uninterrupted, Instant::now())
            .unwrap();
        if let Some(event) = outcome.event(session.id()) {
            activity.on_event(&event);
        }
        if outcome == TickOutcome::Completed {
            break;
        }
    }

    assert!(!activity.is_animating());
    assert_eq!(region.as_str(), render("It is **4**."));
    assert_eq!(region.writes(), "It is **4**.".chars().count() + 1);
    assert_eq!(factory.created().len(), 2);
}
