//! Minimal `mdreveal` usage: tick a session by hand and print every frame.
//!
//! Run:
//!   cargo run --example minimal

use std::time::Instant;

use mdreveal::{
    ChatMarkdown, MemoryRegion, NoScroll, OutputRegion, PlaybackOptions, PlaybackSession,
    TickOutcome, Uninterrupted,
};

fn main() {
    let text = "# Title\n\nHello **world**.\n- item 1\n- item 2";
    let mut session = PlaybackSession::new(text, ChatMarkdown::default(), PlaybackOptions::default());
    let mut region = MemoryRegion::new();

    loop {
        let outcome = session
            .tick(&mut region, &mut NoScroll, &Uninterrupted, Instant::now())
            .unwrap_or_else(|err| panic!("region rejected markup: {err}"));
        match outcome {
            TickOutcome::Advanced { index } => println!("== tick {index} ==\n{}", region.markup()),
            TickOutcome::Completed => {
                println!("\n== completed ==\n{}", region.markup());
                break;
            }
            other => {
                println!("stopped: {other:?}");
                break;
            }
        }
    }
}
