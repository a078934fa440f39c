//! Data-driven game balance
//!
//! Every numeric knob of the run lives here. A tuning file only needs to name
//! the values it overrides; everything else falls back to the defaults below.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("tuning is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Game balance table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Scrolling ===
    /// Scroll speed at the start of a run (pixels per step)
    pub initial_speed: f32,
    /// Speed added by each ramp tick
    pub speed_increment: f32,
    /// Simulated time between ramp ticks (ms)
    pub speed_ramp_interval_ms: f32,
    /// Optional ceiling for the ramp. `None` keeps ramping forever.
    pub max_speed: Option<f32>,
    /// Multiplier applied to speed when a slow pickup is collected
    pub slow_factor: f32,

    // === Timestep ===
    /// Upper bound on the elapsed time fed into one step (ms)
    pub max_step_ms: f32,

    // === Player ===
    /// Downward gravity constant
    pub gravity: f32,
    /// Vertical velocity set by a jump (negative is up)
    pub jump_velocity: f32,
    /// Square player box edge
    pub player_size: f32,
    /// Radius inside which pickups and hazards fire
    pub effect_radius: f32,

    // === World geometry ===
    pub ground_height: f32,
    /// Obstacles at or left of this x are discarded
    pub offscreen_x: f32,
    /// Distance right of the viewport where obstacles appear
    pub spawn_margin: f32,

    // === Spawning ===
    /// Simulated time between barrier spawns (ms)
    pub spawn_interval_ms: f32,
    pub barrier_width: f32,
    pub barrier_min_height: f32,
    /// Barrier heights are drawn from `[min, min + range)` in whole units
    pub barrier_height_range: u32,
    /// Share of spawn ticks that also place a slow pickup
    pub slow_pickup_chance: f32,
    /// Share of spawn ticks that also place a hazard (disjoint from pickups)
    pub hazard_chance: f32,
    pub pickup_radius: f32,
    /// Collision box of a hazard (width, height)
    pub hazard_body: (f32, f32),

    // === Session ===
    /// Revive tokens granted when no usable sleep total is supplied
    pub default_revive_tokens: u32,
    /// Host time the session stays paused after a revive (ms)
    pub revive_pause_ms: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            initial_speed: 7.0,
            speed_increment: 0.5,
            speed_ramp_interval_ms: 5000.0,
            max_speed: None,
            slow_factor: 0.85,

            max_step_ms: 12.0,

            gravity: 1.7,
            jump_velocity: -9.0,
            player_size: 50.0,
            effect_radius: 50.0,

            ground_height: 100.0,
            offscreen_x: -50.0,
            spawn_margin: 50.0,

            spawn_interval_ms: 1200.0,
            barrier_width: 80.0,
            barrier_min_height: 80.0,
            barrier_height_range: 50,
            slow_pickup_chance: 0.05,
            hazard_chance: 0.20,
            pickup_radius: 35.0,
            hazard_body: (25.0, 50.0),

            default_revive_tokens: 3,
            revive_pause_ms: 1000.0,
        }
    }
}

impl Tuning {
    /// Parse and validate a tuning table from JSON
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate a tuning file
    pub fn load(path: &Path) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path).map_err(|source| TuningError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("initial_speed", self.initial_speed),
            ("speed_ramp_interval_ms", self.speed_ramp_interval_ms),
            ("max_step_ms", self.max_step_ms),
            ("player_size", self.player_size),
            ("effect_radius", self.effect_radius),
            ("ground_height", self.ground_height),
            ("spawn_interval_ms", self.spawn_interval_ms),
            ("barrier_width", self.barrier_width),
            ("barrier_min_height", self.barrier_min_height),
            ("pickup_radius", self.pickup_radius),
            ("hazard_body.0", self.hazard_body.0),
            ("hazard_body.1", self.hazard_body.1),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, format!("must be positive, got {value}")));
            }
        }

        if !(self.slow_factor > 0.0 && self.slow_factor <= 1.0) {
            return Err(invalid(
                "slow_factor",
                format!("must be in (0, 1], got {}", self.slow_factor),
            ));
        }
        if self.speed_increment < 0.0 {
            return Err(invalid(
                "speed_increment",
                format!("must not be negative, got {}", self.speed_increment),
            ));
        }
        if self.jump_velocity >= 0.0 {
            return Err(invalid(
                "jump_velocity",
                format!("must point upward (negative), got {}", self.jump_velocity),
            ));
        }
        if self.barrier_height_range == 0 {
            return Err(invalid("barrier_height_range", "must be at least 1".into()));
        }

        for (field, chance) in [
            ("slow_pickup_chance", self.slow_pickup_chance),
            ("hazard_chance", self.hazard_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(invalid(field, format!("must be in [0, 1], got {chance}")));
            }
        }
        if self.slow_pickup_chance + self.hazard_chance > 1.0 {
            return Err(invalid(
                "hazard_chance",
                "pickup and hazard chances must not exceed 1 combined".into(),
            ));
        }

        match self.max_speed {
            Some(cap) if !(cap >= self.initial_speed) => {
                return Err(invalid(
                    "max_speed",
                    format!("cap {cap} is below initial speed {}", self.initial_speed),
                ));
            }
            _ => {}
        }

        Ok(())
    }
}

fn invalid(field: &'static str, message: String) -> TuningError {
    TuningError::Invalid { field, message }
}
