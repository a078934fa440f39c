//! World state and core simulation types
//!
//! Everything the step function reads or mutates lives on [`World`], including
//! the spawn timer, key counter and RNG, so nothing leaks between runs.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::physics::{BodyHandle, BodyShape, Physics};
use crate::tuning::{Tuning, TuningError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("{0:?} body is missing from the physics world")]
    MissingBody(EntityKind),
    #[error("{0:?} is not an obstacle and cannot be spawned")]
    NotAnObstacle(EntityKind),
}

/// Kinds of simulation entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// The jumping sheep
    Player,
    Ground,
    /// Fence the player has to jump; touching it ends the run
    Barrier,
    /// Pillow that slows the scroll when collected
    SlowPickup,
    /// Shears that cost a life on contact
    Hazard,
}

impl EntityKind {
    /// Scrolling obstacles, as opposed to the permanent player and ground
    pub fn is_obstacle(self) -> bool {
        matches!(
            self,
            EntityKind::Barrier | EntityKind::SlowPickup | EntityKind::Hazard
        )
    }
}

/// Opaque key of an obstacle, unique within one world
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey(pub u32);

/// A simulation entity
#[derive(Debug, Clone)]
pub struct Entity {
    pub key: EntityKey,
    pub kind: EntityKind,
    pub body: BodyHandle,
    /// Drawn size (width, height); may differ from the collision shape
    pub size: Vec2,
    /// One-time effect already fired (point, slow-down or damage)
    pub scored: bool,
}

/// Player input for a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputEvent {
    Press,
    LongPress,
}

impl InputEvent {
    pub fn is_jump(self) -> bool {
        matches!(self, InputEvent::Press | InputEvent::LongPress)
    }
}

/// Events produced by a step, in the order they happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "entities", rename_all = "kebab-case")]
pub enum GameEvent {
    /// A barrier was passed
    Score,
    /// A slow pickup was collected
    SlowDown,
    /// A hazard was touched
    LoseLife,
    /// The player ran into a barrier
    GameOver,
    /// The player landed on the ground
    ResetJump,
    /// Obstacles discarded this step
    RemoveEntities(Vec<EntityKey>),
}

/// Complete simulation state for one run
#[derive(Debug)]
pub struct World {
    pub physics: Physics,
    pub tuning: Tuning,
    pub window: Vec2,
    /// Horizontal scroll per step
    pub speed: f32,
    /// Simulated time since the last speed ramp (ms)
    pub speed_increase_timer: f32,
    /// Simulated time since the last barrier spawn (ms)
    pub spawn_timer: f32,
    /// Jumps used since the last ground contact
    pub jump_count: u8,
    pub max_speed_reached: f32,
    pub player: Entity,
    pub ground: Entity,
    /// Live obstacles in key order
    pub obstacles: BTreeMap<EntityKey, Entity>,
    pub rng: Pcg32,
    next_key: u32,
}

impl World {
    /// Build a world with the player standing on the ground.
    ///
    /// Fails if the tuning does not validate.
    pub fn new(tuning: Tuning, width: f32, height: f32, seed: u64) -> Result<Self, TuningError> {
        tuning.validate()?;
        let mut physics = Physics::new(tuning.gravity, tuning.player_size);
        let window = Vec2::new(width, height);

        let ground_size = Vec2::new(width, tuning.ground_height);
        let ground_body = physics.add_fixed(
            BodyShape::Rect {
                width: ground_size.x,
                height: ground_size.y,
            },
            Vec2::new(width / 2.0, height - tuning.ground_height / 2.0),
        );

        let player_size = Vec2::splat(tuning.player_size);
        let player_body = physics.add_dynamic(
            BodyShape::Rect {
                width: player_size.x,
                height: player_size.y,
            },
            player_spawn(&tuning, window),
        );

        let mut next_key = 0;
        let mut entity = |kind, body, size| {
            next_key += 1;
            Entity {
                key: EntityKey(next_key),
                kind,
                body,
                size,
                scored: false,
            }
        };
        let ground = entity(EntityKind::Ground, ground_body, ground_size);
        let player = entity(EntityKind::Player, player_body, player_size);

        log::debug!("World created: {}x{} seed={}", width, height, seed);

        Ok(Self {
            physics,
            speed: tuning.initial_speed,
            max_speed_reached: tuning.initial_speed,
            tuning,
            window,
            speed_increase_timer: 0.0,
            spawn_timer: 0.0,
            jump_count: 0,
            player,
            ground,
            obstacles: BTreeMap::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_key,
        })
    }

    /// Allocate a new entity key
    pub fn next_entity_key(&mut self) -> EntityKey {
        self.next_key += 1;
        EntityKey(self.next_key)
    }

    /// Fixed lane the player is pinned to
    pub fn player_x(&self) -> f32 {
        self.window.x / 4.0
    }

    pub fn player_position(&self) -> Result<Vec2, SimError> {
        self.physics
            .position(self.player.body)
            .ok_or(SimError::MissingBody(EntityKind::Player))
    }

    pub fn player_velocity(&self) -> Result<Vec2, SimError> {
        self.physics
            .velocity(self.player.body)
            .ok_or(SimError::MissingBody(EntityKind::Player))
    }

    pub fn ground_position(&self) -> Result<Vec2, SimError> {
        self.physics
            .position(self.ground.body)
            .ok_or(SimError::MissingBody(EntityKind::Ground))
    }

    /// Position of an obstacle, if it is still alive
    pub fn obstacle_position(&self, key: EntityKey) -> Option<Vec2> {
        let entity = self.obstacles.get(&key)?;
        self.physics.position(entity.body)
    }

    /// Detach an obstacle from the map and the physics world
    pub fn remove_obstacle(&mut self, key: EntityKey) -> Option<Entity> {
        let entity = self.obstacles.remove(&key)?;
        self.physics.remove(entity.body);
        Some(entity)
    }

    /// Clear the field and put the player back on the ground.
    ///
    /// Speed and the difficulty ramp carry over; the host starts a fresh
    /// world for a new run.
    pub fn reset(&mut self) -> Result<(), SimError> {
        let keys: Vec<EntityKey> = self.obstacles.keys().copied().collect();
        for key in keys {
            self.remove_obstacle(key);
        }

        let spawn = player_spawn(&self.tuning, self.window);
        if !self.physics.set_position(self.player.body, spawn) {
            return Err(SimError::MissingBody(EntityKind::Player));
        }
        self.physics.set_velocity(self.player.body, Vec2::ZERO);

        self.jump_count = 0;
        self.spawn_timer = 0.0;
        log::debug!("World reset at speed {:.2}", self.speed);
        Ok(())
    }
}

/// Player centre standing on top of the ground in its lane
fn player_spawn(tuning: &Tuning, window: Vec2) -> Vec2 {
    let ground_top = window.y - tuning.ground_height;
    Vec2::new(window.x / 4.0, ground_top - tuning.player_size / 2.0)
}
