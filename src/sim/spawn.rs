//! Obstacle factory
//!
//! Barriers arrive on a fixed cadence of simulated time. Each barrier tick also
//! makes one uniform draw that may add a slow pickup or a hazard.

use glam::Vec2;
use rand::Rng;

use super::physics::BodyShape;
use super::state::{Entity, EntityKey, EntityKind, SimError, World};

/// What one spawn tick placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnTick {
    pub barrier: EntityKey,
    pub extra: Option<(EntityKind, EntityKey)>,
}

/// Advance the spawn timer and place obstacles when it elapses
pub fn advance_spawner(world: &mut World, dt_ms: f32) -> Result<Option<SpawnTick>, SimError> {
    world.spawn_timer += dt_ms;
    if world.spawn_timer < world.tuning.spawn_interval_ms {
        return Ok(None);
    }
    world.spawn_timer -= world.tuning.spawn_interval_ms;
    spawn_tick(world).map(Some)
}

/// Place a barrier and, depending on one random draw, a pickup or hazard
pub fn spawn_tick(world: &mut World) -> Result<SpawnTick, SimError> {
    let barrier = spawn_barrier(world)?;

    let roll: f32 = world.rng.random();
    let pickup_band = world.tuning.slow_pickup_chance;
    let hazard_band = pickup_band + world.tuning.hazard_chance;

    let extra = if roll < pickup_band {
        Some((EntityKind::SlowPickup, spawn_slow_pickup(world)?))
    } else if roll < hazard_band {
        Some((EntityKind::Hazard, spawn_hazard(world)?))
    } else {
        None
    };

    log::trace!("Spawn tick: barrier {:?}, extra {:?}", barrier, extra);
    Ok(SpawnTick { barrier, extra })
}

/// Barrier of random height standing on the ground reference line
pub fn spawn_barrier(world: &mut World) -> Result<EntityKey, SimError> {
    let tuning = &world.tuning;
    let height =
        tuning.barrier_min_height + world.rng.random_range(0..tuning.barrier_height_range) as f32;
    let ground_line = world.ground_position()?.y;
    let x = spawn_x(world);
    spawn_obstacle(world, EntityKind::Barrier, Vec2::new(x, ground_line - height / 2.0), height)
}

/// Pillow in the band between 40% and 60% of the screen height
pub fn spawn_slow_pickup(world: &mut World) -> Result<EntityKey, SimError> {
    let h = world.window.y;
    let lift: f32 = world.rng.random();
    let y = h * 0.6 - lift * (h * 0.2);
    let x = spawn_x(world);
    spawn_obstacle(world, EntityKind::SlowPickup, Vec2::new(x, y), 0.0)
}

/// Shears a little higher than pillows, between 30% and 50% of the height
pub fn spawn_hazard(world: &mut World) -> Result<EntityKey, SimError> {
    let h = world.window.y;
    let lift: f32 = world.rng.random();
    let y = h * 0.5 - lift * (h * 0.2);
    let x = spawn_x(world);
    spawn_obstacle(world, EntityKind::Hazard, Vec2::new(x, y), 0.0)
}

fn spawn_x(world: &World) -> f32 {
    world.window.x + world.tuning.spawn_margin
}

/// Insert an obstacle of `kind` centred at `position`.
///
/// `barrier_height` only applies to barriers, which are placed exactly where
/// asked. A pickup or hazard that would be entirely above or below the
/// viewport is pulled back inside it.
pub fn spawn_obstacle(
    world: &mut World,
    kind: EntityKind,
    position: Vec2,
    barrier_height: f32,
) -> Result<EntityKey, SimError> {
    let tuning = &world.tuning;
    let (shape, size) = match kind {
        EntityKind::Barrier => {
            let size = Vec2::new(tuning.barrier_width, barrier_height);
            let shape = BodyShape::Rect {
                width: size.x,
                height: size.y,
            };
            (shape, size)
        }
        EntityKind::SlowPickup => {
            let shape = BodyShape::Circle {
                radius: tuning.pickup_radius,
            };
            (shape, Vec2::splat(50.0))
        }
        EntityKind::Hazard => {
            let (width, height) = tuning.hazard_body;
            (BodyShape::Rect { width, height }, Vec2::new(20.0, 40.0))
        }
        EntityKind::Player | EntityKind::Ground => return Err(SimError::NotAnObstacle(kind)),
    };

    let handle = if kind == EntityKind::Barrier {
        world.physics.add_fixed(shape, position)
    } else {
        let y = clamp_to_viewport(position.y, shape.half_height(), world.window.y);
        world.physics.add_sensor(shape, Vec2::new(position.x, y))
    };

    let key = world.next_entity_key();
    world.obstacles.insert(
        key,
        Entity {
            key,
            kind,
            body: handle,
            size,
            scored: false,
        },
    );
    log::debug!("Spawned {:?} {:?} at {:?}", kind, key, position);
    Ok(key)
}

/// Bring a body of half height `half` back on screen if none of it is visible
fn clamp_to_viewport(y: f32, half: f32, height: f32) -> f32 {
    if y + half <= 0.0 {
        half
    } else if y - half >= height {
        height - half
    } else {
        y
    }
}
