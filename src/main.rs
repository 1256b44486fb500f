//! Archery Range entry point
//!
//! Plays a scripted session on the virtual clock and logs the result. Usage:
//! `archery-range [difficulty] [seed]`, e.g. `RUST_LOG=info archery-range hard 7`.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::rc::Rc;

    use archery_range::consts::*;
    use archery_range::polar_to_cartesian;
    use archery_range::sim::{ArcheryGame, GameEventLog, InputOutcome};
    use archery_range::{Difficulty, SessionOptions, VirtualScheduler};

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let difficulty = match args.next() {
        Some(name) => Difficulty::from_str(&name).unwrap_or_else(|| {
            log::warn!("Unknown difficulty '{}', using Normal", name);
            Difficulty::Normal
        }),
        None => Difficulty::Normal,
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(0);

    let options = SessionOptions {
        seed,
        max_arrows: 5,
        ..SessionOptions::from_difficulty(difficulty)
    };
    log::info!(
        "Archery Range starting ({}, seed {})",
        difficulty.as_str(),
        seed
    );

    let clock = Rc::new(VirtualScheduler::new());
    let events = GameEventLog::new();
    let game = ArcheryGame::new(options, clock.clone(), events.clone());
    game.start();

    // One draw per second, sweeping the aim across the target
    for degrees in [150.0_f64, 153.0, 156.0, 158.0, 162.0] {
        clock.advance(1000.0);
        let pointer = PIVOT + polar_to_cartesian(40.0, degrees.to_radians());
        if game.pointer_down(BOWSTRING_REST) != InputOutcome::Accepted {
            log::warn!("Draw refused at {}°", degrees);
            continue;
        }
        game.pointer_move(pointer);
        game.pointer_up();
    }
    clock.advance(END_GRACE_DELAY_MS + 1000.0);

    let snapshot = game.snapshot();
    log::info!(
        "Session {:?}: {} shots, scores {:?}",
        snapshot.phase,
        snapshot.shots_fired,
        events.scores()
    );
    match events.final_score() {
        Some(score) => println!("Final score: {}", score),
        None => println!("Session did not finish"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page on wasm
}
