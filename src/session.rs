//! Game session controller
//!
//! Owns the bookkeeping around the simulation: score, revive tokens earned
//! from sleep, the revive pause, game over and the leaderboard. The simulation
//! itself knows nothing about lives; it only reports events.

use glam::Vec2;

use crate::highscores::HighScores;
use crate::sim::{GameEvent, InputEvent, SimError, World, step};
use crate::tuning::{Tuning, TuningError};

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionPhase {
    /// Simulation advances every frame
    Running,
    /// Held by the host (menu, app in background)
    Paused,
    /// Short freeze after a revive before play resumes
    Reviving { remaining_ms: f32 },
    /// Out of revives; waiting for a restart
    GameOver,
}

/// Per-run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTally {
    pub score: u64,
    pub revive_tokens: u32,
    pub revives_used: u32,
    pub survived_ms: u64,
}

/// Revive tokens earned by a night's sleep.
///
/// Whole hours slept become tokens; no usable total falls back to `default`.
pub fn revive_tokens_for_hours(hours_slept: f32, default: u32) -> u32 {
    if hours_slept.is_finite() && hours_slept >= 1.0 {
        hours_slept.floor() as u32
    } else {
        default
    }
}

/// One play session
#[derive(Debug)]
pub struct Session {
    pub world: World,
    pub tally: SessionTally,
    pub phase: SessionPhase,
    pub high_scores: HighScores,
    /// Leaderboard rank of the finished run, if it placed
    pub final_rank: Option<usize>,
    hours_slept: f32,
    survived: f64,
}

impl Session {
    pub fn new(
        tuning: Tuning,
        window: Vec2,
        hours_slept: f32,
        seed: u64,
        high_scores: HighScores,
    ) -> Result<Self, TuningError> {
        let tokens = revive_tokens_for_hours(hours_slept, tuning.default_revive_tokens);
        let world = World::new(tuning, window.x, window.y, seed)?;
        log::info!(
            "Session start: {:.1}h slept -> {} revive tokens, seed {}",
            hours_slept,
            tokens,
            seed
        );

        Ok(Self {
            world,
            tally: SessionTally {
                revive_tokens: tokens,
                ..SessionTally::default()
            },
            phase: SessionPhase::Running,
            high_scores,
            final_rank: None,
            hours_slept,
            survived: 0.0,
        })
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn is_over(&self) -> bool {
        self.phase == SessionPhase::GameOver
    }

    pub fn high_score(&self) -> u64 {
        self.high_scores.top_score()
    }

    /// Run one host frame.
    ///
    /// The simulation only steps while running; during the revive freeze the
    /// countdown advances instead. Returns the step's events after the session
    /// has applied them.
    pub fn frame(
        &mut self,
        inputs: &[InputEvent],
        elapsed_ms: f32,
    ) -> Result<Vec<GameEvent>, SimError> {
        match self.phase {
            SessionPhase::Running => {}
            SessionPhase::Reviving { remaining_ms } => {
                let remaining_ms = remaining_ms - elapsed_ms;
                self.phase = if remaining_ms <= 0.0 {
                    log::info!("Revive pause over, resuming");
                    SessionPhase::Running
                } else {
                    SessionPhase::Reviving { remaining_ms }
                };
                return Ok(Vec::new());
            }
            SessionPhase::Paused | SessionPhase::GameOver => return Ok(Vec::new()),
        }

        let events = step(&mut self.world, inputs, elapsed_ms)?;
        self.survived += f64::from(elapsed_ms.max(0.0));
        self.tally.survived_ms = self.survived as u64;

        for event in &events {
            self.apply(event)?;
        }
        Ok(events)
    }

    /// Apply the session-level consequence of one event
    pub fn apply(&mut self, event: &GameEvent) -> Result<(), SimError> {
        if self.phase == SessionPhase::GameOver {
            return Ok(());
        }

        match event {
            GameEvent::Score => self.tally.score += 1,
            GameEvent::LoseLife => {
                if self.spend_token() {
                    log::debug!("Life lost, {} revives left", self.tally.revive_tokens);
                } else {
                    self.finish();
                }
            }
            GameEvent::GameOver => {
                if matches!(self.phase, SessionPhase::Reviving { .. }) {
                    // Same crash reported twice in one frame
                    return Ok(());
                }
                if self.spend_token() {
                    self.world.reset()?;
                    self.phase = SessionPhase::Reviving {
                        remaining_ms: self.world.tuning.revive_pause_ms,
                    };
                    log::info!("Revived, {} revives left", self.tally.revive_tokens);
                } else {
                    self.finish();
                }
            }
            GameEvent::SlowDown | GameEvent::ResetJump | GameEvent::RemoveEntities(_) => {}
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.phase == SessionPhase::Running {
            self.phase = SessionPhase::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.phase == SessionPhase::Paused {
            self.phase = SessionPhase::Running;
        }
    }

    /// Start a new run with the same sleep total and tuning
    pub fn restart(&mut self, seed: u64) -> Result<(), TuningError> {
        let tuning = self.world.tuning.clone();
        let window = self.world.window;
        let tokens = revive_tokens_for_hours(self.hours_slept, tuning.default_revive_tokens);

        self.world = World::new(tuning, window.x, window.y, seed)?;
        self.tally = SessionTally {
            revive_tokens: tokens,
            ..SessionTally::default()
        };
        self.phase = SessionPhase::Running;
        self.final_rank = None;
        self.survived = 0.0;
        log::info!("Session restarted with seed {}", seed);
        Ok(())
    }

    fn spend_token(&mut self) -> bool {
        if self.tally.revive_tokens == 0 {
            return false;
        }
        self.tally.revive_tokens -= 1;
        self.tally.revives_used += 1;
        true
    }

    fn finish(&mut self) {
        self.phase = SessionPhase::GameOver;
        let previous_best = self.high_scores.top_score();
        self.final_rank = self.high_scores.add_score(
            self.tally.score,
            self.tally.revives_used,
            self.tally.survived_ms,
        );
        log::info!(
            "Game over: score {}, revives used {}",
            self.tally.score,
            self.tally.revives_used
        );
        if self.tally.score > previous_best {
            log::info!("New high score: {}", self.tally.score);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{EntityKind, autopilot_input, spawn_obstacle};

    fn session(hours: f32) -> Session {
        Session::new(
            Tuning::default(),
            Vec2::new(800.0, 400.0),
            hours,
            2024,
            HighScores::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_tokens_from_sleep() {
        assert_eq!(revive_tokens_for_hours(8.0, 3), 8);
        assert_eq!(revive_tokens_for_hours(6.7, 3), 6);
        assert_eq!(revive_tokens_for_hours(0.0, 3), 3);
        assert_eq!(revive_tokens_for_hours(0.5, 3), 3);
        assert_eq!(revive_tokens_for_hours(f32::NAN, 3), 3);
        assert_eq!(session(0.0).tally.revive_tokens, 3);
        assert_eq!(session(5.0).tally.revive_tokens, 5);
    }

    #[test]
    fn test_invalid_tuning_rejected() {
        let tuning = Tuning {
            slow_factor: 0.0,
            ..Tuning::default()
        };
        assert!(Session::new(tuning, Vec2::new(800.0, 400.0), 8.0, 1, HighScores::new()).is_err());
    }

    #[test]
    fn test_score_events_count() {
        let mut s = session(2.0);
        s.apply(&GameEvent::Score).unwrap();
        s.apply(&GameEvent::Score).unwrap();
        s.apply(&GameEvent::SlowDown).unwrap();
        assert_eq!(s.tally.score, 2);
    }

    #[test]
    fn test_crash_with_tokens_revives_and_pauses() {
        let mut s = session(2.0);
        spawn_obstacle(&mut s.world, EntityKind::Hazard, Vec2::new(600.0, 150.0), 0.0).unwrap();
        s.world.jump_count = 2;

        s.apply(&GameEvent::GameOver).unwrap();
        assert_eq!(s.tally.revive_tokens, 1);
        assert_eq!(s.tally.revives_used, 1);
        assert!(s.world.obstacles.is_empty());
        assert_eq!(s.world.jump_count, 0);
        assert!(matches!(s.phase, SessionPhase::Reviving { .. }));

        // Frozen: the world does not advance during the pause
        let timer = s.world.spawn_timer;
        for _ in 0..62 {
            assert!(s.frame(&[], 16.0).unwrap().is_empty());
        }
        assert_eq!(s.world.spawn_timer, timer);
        assert!(!s.is_running());

        // 63 * 16ms > 1000ms
        s.frame(&[], 16.0).unwrap();
        assert!(s.is_running());
        s.frame(&[], 16.0).unwrap();
        assert!(s.world.spawn_timer > timer);
    }

    #[test]
    fn test_crash_without_tokens_ends_run() {
        let mut s = session(1.0);
        s.tally.score = 4;
        s.apply(&GameEvent::GameOver).unwrap();
        assert!(matches!(s.phase, SessionPhase::Reviving { .. }));
        s.phase = SessionPhase::Running;

        s.apply(&GameEvent::GameOver).unwrap();
        assert!(s.is_over());
        assert_eq!(s.tally.revive_tokens, 0);
        assert_eq!(s.final_rank, Some(1));
        assert_eq!(s.high_score(), 4);

        // Nothing moves once the run is over
        assert!(s.frame(&[InputEvent::Press], 16.0).unwrap().is_empty());
        s.apply(&GameEvent::Score).unwrap();
        assert_eq!(s.tally.score, 4);
    }

    #[test]
    fn test_duplicate_crash_in_one_frame_costs_one_token() {
        let mut s = session(3.0);
        s.apply(&GameEvent::GameOver).unwrap();
        s.apply(&GameEvent::GameOver).unwrap();
        assert_eq!(s.tally.revive_tokens, 2);
    }

    #[test]
    fn test_hazard_spends_token_without_pause() {
        let mut s = session(1.0);
        s.apply(&GameEvent::LoseLife).unwrap();
        assert_eq!(s.tally.revive_tokens, 0);
        assert!(s.is_running());

        s.apply(&GameEvent::LoseLife).unwrap();
        assert!(s.is_over());
    }

    #[test]
    fn test_pause_blocks_simulation() {
        let mut s = session(3.0);
        s.pause();
        for _ in 0..10 {
            s.frame(&[InputEvent::Press], 16.0).unwrap();
        }
        assert_eq!(s.world.jump_count, 0);
        assert_eq!(s.world.spawn_timer, 0.0);
        assert_eq!(s.tally.survived_ms, 0);

        s.resume();
        s.frame(&[InputEvent::Press], 16.0).unwrap();
        assert_eq!(s.world.jump_count, 1);
        assert_eq!(s.tally.survived_ms, 16);
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut s = session(0.0);
        s.tally.score = 9;
        s.tally.revive_tokens = 0;
        s.apply(&GameEvent::GameOver).unwrap();
        assert!(s.is_over());

        s.restart(77).unwrap();
        assert!(s.is_running());
        assert_eq!(s.tally.score, 0);
        assert_eq!(s.tally.revive_tokens, 3);
        assert_eq!(s.final_rank, None);
        // Leaderboard survives the restart
        assert_eq!(s.high_score(), 9);
    }

    #[test]
    fn test_idle_player_runs_out_of_revives() {
        // Never jumping, every barrier ends in a crash
        let mut s = session(1.0);
        let mut crashes = 0;
        for _ in 0..2_000 {
            if s.is_over() {
                break;
            }
            let events = s.frame(&[], 16.0).unwrap();
            crashes += events.iter().filter(|e| **e == GameEvent::GameOver).count();
        }
        assert!(s.is_over());
        assert_eq!(crashes, 2);
        assert_eq!(s.tally.revives_used, 1);
        assert_eq!(s.tally.revive_tokens, 0);
        assert!(s.tally.survived_ms > 2_000);
    }

    #[test]
    fn test_autopilot_scores() {
        let mut s = session(8.0);
        for _ in 0..1_500 {
            let input: Vec<InputEvent> = autopilot_input(&s.world).into_iter().collect();
            s.frame(&input, 16.0).unwrap();
        }
        assert!(s.tally.score > 0);
    }
}
