//! Sheep Jump - side-scrolling obstacle-avoidance minigame
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (physics, obstacles, collisions, events)
//! - `session`: Revive tokens, game over and restart around the simulation
//! - `highscores`: Persisted leaderboard
//! - `tuning`: Data-driven game balance

pub mod highscores;
pub mod session;
pub mod sim;
pub mod tuning;

pub use highscores::{HighScores, ScoreError};
pub use session::{Session, SessionPhase, SessionTally};
pub use tuning::{Tuning, TuningError};

/// Engine constants that are not balance knobs
pub mod consts {
    /// Reference frame length (ms). Velocities are expressed per reference frame.
    pub const BASE_DELTA_MS: f32 = 1000.0 / 60.0;
    /// Scale applied to the gravity constant
    pub const GRAVITY_SCALE: f32 = 0.001;
    /// Jumps allowed before the player has to touch the ground again
    pub const MAX_JUMPS: u8 = 2;

    /// Default landscape viewport used by the headless runner
    pub const DEFAULT_WINDOW_WIDTH: f32 = 844.0;
    pub const DEFAULT_WINDOW_HEIGHT: f32 = 390.0;
}

