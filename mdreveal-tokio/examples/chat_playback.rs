//! Plays a short conversation into in-memory regions on a tokio timer.
//!
//! The second reply is interrupted half way and cleaned up with `stop()`.
//!
//! Run:
//!   cargo run -p mdreveal-tokio --example chat_playback

use std::sync::{Arc, Mutex};
use std::time::Duration;

use mdreveal::{
    ChatMessage, MemoryRegionFactory, MemoryViewport, MessagePresenter, PlaybackOptions,
    PresenterOptions,
};
use mdreveal_tokio::{ActivityHub, PlaybackDriver, Presented, SpeedPreset};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let preset = SpeedPreset::Normal;
    let presenter = MessagePresenter::new(PresenterOptions {
        playback: PlaybackOptions {
            tick_interval: preset.interval(),
            ..PlaybackOptions::default()
        },
        ..PresenterOptions::default()
    });
    let hub = ActivityHub::new();
    let mut activity = hub.subscribe();
    let driver = PlaybackDriver::new().with_activity(hub.clone());
    let viewport = Arc::new(Mutex::new(MemoryViewport::new()));
    let mut factory = MemoryRegionFactory::new();

    tokio::spawn(async move {
        while activity.changed().await.is_ok() {
            let now = *activity.borrow_and_update();
            println!("[activity] animating={} active={}", now.is_animating(), now.active);
        }
    });

    let question = ChatMessage::user("What does `select!` do?");
    if let Presented::Static(region) =
        driver.present(&presenter, &mut factory, question, Arc::clone(&viewport))?
    {
        println!("user: {}", region.as_str());
    }

    let answer = ChatMessage::assistant(
        "It **waits on several futures** and runs the branch of the first one to finish.",
    );
    if let Presented::Animated(handle) =
        driver.present(&presenter, &mut factory, answer, Arc::clone(&viewport))?
    {
        println!("playing {} at {} speed", handle.id(), preset.label());
        let report = handle.completed().await?;
        println!("assistant: {}", report.region.as_str());
    }

    let long = ChatMessage::assistant("1. first step\n2. second step\n3. third step\n4. done");
    if let Presented::Animated(handle) =
        driver.present(&presenter, &mut factory, long, Arc::clone(&viewport))?
    {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let report = handle.stop().await?;
        println!("interrupted ({:?}): {}", report.outcome, report.region.as_str());
    }

    let scrolls = viewport
        .lock()
        .map(|v| v.scrolls().len())
        .unwrap_or_default();
    println!("executed scrolls: {scrolls}");
    Ok(())
}
