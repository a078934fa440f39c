//! Per-frame simulation step
//!
//! Advances the world by one rendered frame and reports what happened as a
//! list of [`GameEvent`]s for the host to drain.

use glam::Vec2;

use super::spawn::advance_spawner;
use super::state::{EntityKey, EntityKind, GameEvent, InputEvent, SimError, World};
use crate::consts::MAX_JUMPS;

/// Advance the world by `elapsed_ms` of host time.
///
/// Errors only when the player or ground body has gone missing, which is a
/// bug in the caller rather than a gameplay condition.
pub fn step(
    world: &mut World,
    inputs: &[InputEvent],
    elapsed_ms: f32,
) -> Result<Vec<GameEvent>, SimError> {
    let dt = if elapsed_ms.is_finite() {
        elapsed_ms.clamp(0.0, world.tuning.max_step_ms)
    } else {
        0.0
    };
    let mut events = Vec::new();

    ramp_speed(world, dt);

    // Player never moves horizontally; the obstacles scroll instead
    let player_body = world.player.body;
    let mut player_pos = world.player_position()?;
    player_pos.x = world.player_x();
    world.physics.set_position(player_body, player_pos);
    if !world.physics.contains(world.ground.body) {
        return Err(SimError::MissingBody(EntityKind::Ground));
    }

    let jumped = if inputs.iter().any(|i| i.is_jump()) {
        try_jump(world)?
    } else {
        false
    };

    let removed = scroll_obstacles(world, player_pos, &mut events);
    for key in &removed {
        world.remove_obstacle(*key);
    }

    advance_spawner(world, dt)?;

    for contact in world.physics.update(dt) {
        if contact.sensor {
            continue;
        }
        let Some(other) = contact.other(player_body) else {
            continue;
        };
        if other == world.ground.body {
            // Taking off from the ground is not a landing
            if !jumped {
                world.jump_count = 0;
                events.push(GameEvent::ResetJump);
            }
        } else if world
            .obstacles
            .values()
            .any(|e| e.body == other && e.kind == EntityKind::Barrier)
        {
            log::debug!("Player hit a barrier");
            events.push(GameEvent::GameOver);
        }
    }

    if !removed.is_empty() {
        events.push(GameEvent::RemoveEntities(removed));
    }

    Ok(events)
}

/// Difficulty ramp: every interval of simulated time adds a fixed increment
fn ramp_speed(world: &mut World, dt: f32) {
    world.speed_increase_timer += dt;
    if world.speed_increase_timer < world.tuning.speed_ramp_interval_ms {
        return;
    }
    world.speed_increase_timer -= world.tuning.speed_ramp_interval_ms;

    let mut speed = world.speed + world.tuning.speed_increment;
    if let Some(cap) = world.tuning.max_speed {
        speed = speed.min(cap).max(world.speed);
    }
    world.speed = speed;
    world.max_speed_reached = world.max_speed_reached.max(speed);
    log::trace!("Speed ramped to {:.2}", speed);
}

/// Apply the jump impulse unless both jumps are spent.
/// Returns whether the player jumped.
fn try_jump(world: &mut World) -> Result<bool, SimError> {
    if world.jump_count >= MAX_JUMPS {
        return Ok(false);
    }
    let impulse = Vec2::new(0.0, world.tuning.jump_velocity);
    if !world.physics.set_velocity(world.player.body, impulse) {
        return Err(SimError::MissingBody(EntityKind::Player));
    }
    world.jump_count += 1;
    Ok(true)
}

/// Move every obstacle left and apply one-time effects.
///
/// Returns the keys to discard, each exactly once, in key order.
fn scroll_obstacles(
    world: &mut World,
    player_pos: Vec2,
    events: &mut Vec<GameEvent>,
) -> Vec<EntityKey> {
    let speed_step = Vec2::new(-world.speed, 0.0);
    let radius = world.tuning.effect_radius;
    let offscreen_x = world.tuning.offscreen_x;
    let mut removed = Vec::new();

    for entity in world.obstacles.values_mut() {
        let Some(pos) = world.physics.translate(entity.body, speed_step) else {
            // Already detached; drop it with this batch
            removed.push(entity.key);
            continue;
        };
        let mut remove = false;

        if !entity.scored && pos.distance(player_pos) < radius {
            match entity.kind {
                EntityKind::SlowPickup => {
                    entity.scored = true;
                    world.speed *= world.tuning.slow_factor;
                    events.push(GameEvent::SlowDown);
                    log::debug!("Slow pickup collected, speed now {:.2}", world.speed);
                    remove = true;
                }
                EntityKind::Hazard => {
                    entity.scored = true;
                    events.push(GameEvent::LoseLife);
                    log::debug!("Hazard touched");
                    remove = true;
                }
                _ => {}
            }
        }

        if pos.x <= offscreen_x {
            remove = true;
        }

        if entity.kind == EntityKind::Barrier && !entity.scored && pos.x < player_pos.x {
            entity.scored = true;
            events.push(GameEvent::Score);
        }

        if remove {
            removed.push(entity.key);
        }
    }

    removed
}
