//! From Beyond entry point
//!
//! Headless host: runs an autopilot session as fast as possible, then
//! records the final score in the high score file.
//!
//! Usage: `from-beyond [seed] [tuning.json]`

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use from_beyond::Tuning;
use from_beyond::consts::SIM_HZ;
use from_beyond::highscores::{DEFAULT_FILE, HighScore};
use from_beyond::sim::{GameEvent, RenderSnapshot, SessionState, TickInput, tick};

/// Stop after ten simulated minutes even if the autopilot survives
const MAX_TICKS: u64 = 10 * 60 * SIM_HZ as u64;

#[derive(Parser, Debug)]
#[command(name = "from-beyond")]
#[command(about = "Run a headless autopilot session", long_about = None)]
struct Args {
    /// RNG seed (default: wall clock)
    seed: Option<u64>,

    /// JSON tuning file (default: built-in balance)
    tuning: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    });
    let tuning = args.tuning.map(Tuning::load).unwrap_or_default();

    log::info!("From Beyond (headless) starting with seed {seed}");
    let mut state = SessionState::with_tuning(seed, tuning);
    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };

    let mut kills = 0usize;
    while !state.is_over() && state.time_ticks < MAX_TICKS {
        tick(&mut state, &input);
        kills += state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::EnemyDestroyed { .. }))
            .count();
    }

    let summary = state.summary.unwrap_or_else(|| state.summary());
    log::info!(
        "Session ended after {} ticks ({})",
        state.time_ticks,
        if state.is_over() { "game over" } else { "time limit" }
    );

    let mut high = HighScore::load(DEFAULT_FILE);
    if high.record(summary.score) {
        println!("New high score!");
    }
    println!(
        "Score {} | round {} | wave {} | {} kills | {:.1}s simulated | best {}",
        summary.score,
        summary.round,
        summary.wave,
        kills,
        state.time_ticks as f32 / SIM_HZ as f32,
        high.best()
    );

    match serde_json::to_string_pretty(&RenderSnapshot::capture(&state).hud) {
        Ok(json) => println!("{json}"),
        Err(e) => log::warn!("Could not encode HUD: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_accept_seed_and_tuning() {
        let args = Args::try_parse_from(["from-beyond", "42", "balance.json"]).unwrap();
        assert_eq!(args.seed, Some(42));
        assert_eq!(args.tuning, Some(PathBuf::from("balance.json")));

        let args = Args::try_parse_from(["from-beyond"]).unwrap();
        assert_eq!(args.seed, None);
        assert_eq!(args.tuning, None);
    }

    #[test]
    fn test_args_reject_bad_seed() {
        let err = Args::try_parse_from(["from-beyond", "not-a-seed", "/nonexistent.json"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
