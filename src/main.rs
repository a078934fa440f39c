//! Sheep Jump headless runner
//!
//! Plays one session with the autopilot at a fixed 60 Hz frame rate and keeps
//! the leaderboard on disk.
//!
//! Usage: `sheep-jump [hours_slept] [seed] [max_frames]`
//!
//! Environment:
//! - `SHEEP_JUMP_TUNING`: optional tuning JSON
//! - `SHEEP_JUMP_SCORES`: leaderboard file (default `sheep_jump_scores.json`)
//! - `RUST_LOG`: log filter

use std::path::PathBuf;
use std::process::ExitCode;

use glam::Vec2;
use sheep_jump::consts::{BASE_DELTA_MS, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};
use sheep_jump::sim::{GameEvent, InputEvent, autopilot_input};
use sheep_jump::{HighScores, Session, Tuning};

const DEFAULT_SCORES_PATH: &str = "sheep_jump_scores.json";

struct Args {
    hours_slept: f32,
    seed: u64,
    max_frames: u64,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let hours_slept = match args.next() {
        Some(s) => s.parse().map_err(|e| format!("bad hours_slept `{s}`: {e}"))?,
        None => 0.0,
    };
    let seed = match args.next() {
        Some(s) => s.parse().map_err(|e| format!("bad seed `{s}`: {e}"))?,
        None => 0x5EE9,
    };
    let max_frames = match args.next() {
        Some(s) => s.parse().map_err(|e| format!("bad max_frames `{s}`: {e}"))?,
        None => 60 * 60 * 5,
    };
    Ok(Args {
        hours_slept,
        seed,
        max_frames,
    })
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args()?;

    let tuning = match std::env::var_os("SHEEP_JUMP_TUNING") {
        Some(path) => Tuning::load(&PathBuf::from(path))?,
        None => Tuning::default(),
    };
    let scores_path = std::env::var_os("SHEEP_JUMP_SCORES")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SCORES_PATH));
    let high_scores = HighScores::load(&scores_path)?;

    let window = Vec2::new(DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT);
    let mut session = Session::new(tuning, window, args.hours_slept, args.seed, high_scores)?;

    let mut frames = 0;
    while frames < args.max_frames && !session.is_over() {
        let input: Vec<InputEvent> = autopilot_input(&session.world).into_iter().collect();
        for event in session.frame(&input, BASE_DELTA_MS)? {
            match event {
                GameEvent::Score => log::debug!("Score: {}", session.tally.score),
                GameEvent::GameOver => log::info!("Crashed into a fence at frame {}", frames),
                GameEvent::LoseLife => log::info!("Sheared at frame {}", frames),
                _ => {}
            }
        }
        frames += 1;
    }

    let tally = session.tally;
    log::info!(
        "Run finished after {} frames: score {}, revives used {}, tokens left {}, top speed {:.1}",
        frames,
        tally.score,
        tally.revives_used,
        tally.revive_tokens,
        session.world.max_speed_reached
    );
    if let Some(rank) = session.final_rank {
        log::info!("Placed #{} on the leaderboard", rank);
    }
    session.high_scores.save(&scores_path)?;

    println!(
        "score={} revives_used={} high_score={}",
        tally.score,
        tally.revives_used,
        session.high_score()
    );
    Ok(())
}

fn main() -> ExitCode {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Sheep Jump (headless) starting...");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
