//! rapier2d world for the runner
//!
//! Units are screen pixels with y growing downward. rapier runs with one time
//! unit per reference frame ([`BASE_DELTA_MS`]), so velocities are pixels per
//! 60 Hz frame and a jump of `-9` means the same thing at any step length.
//!
//! Built with `enhanced-determinism`; collision starts are sorted by handle so
//! a seeded run replays exactly.

use std::fmt;

use glam::Vec2;
use rapier2d::prelude::*;

use crate::consts::{BASE_DELTA_MS, GRAVITY_SCALE};

pub type BodyHandle = RigidBodyHandle;

/// Collision geometry, centred on the body position
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Rect { width: f32, height: f32 },
    Circle { radius: f32 },
}

impl BodyShape {
    pub fn half_height(&self) -> f32 {
        match *self {
            BodyShape::Rect { height, .. } => height / 2.0,
            BodyShape::Circle { radius } => radius,
        }
    }

    fn shared(&self) -> SharedShape {
        match *self {
            BodyShape::Rect { width, height } => SharedShape::cuboid(width / 2.0, height / 2.0),
            BodyShape::Circle { radius } => SharedShape::ball(radius),
        }
    }
}

/// Two bodies that started touching during an update (`a` has the lower handle)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionStart {
    pub a: BodyHandle,
    pub b: BodyHandle,
    /// One side is a sensor: an overlap, not a solid contact
    pub sensor: bool,
}

impl CollisionStart {
    /// The other body of the pair, if `handle` takes part in it
    pub fn other(&self, handle: BodyHandle) -> Option<BodyHandle> {
        if self.a == handle {
            Some(self.b)
        } else if self.b == handle {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Owns the rapier pipeline and body storage
pub struct Physics {
    /// Gravity constant (scaled by [`GRAVITY_SCALE`])
    gravity: f32,
    pipeline: PhysicsPipeline,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
}

impl fmt::Debug for Physics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Physics")
            .field("gravity", &self.gravity)
            .field("bodies", &self.bodies.len())
            .finish_non_exhaustive()
    }
}

impl Physics {
    /// `length_unit` is the typical size of a dynamic body in pixels; rapier
    /// scales its contact tolerances by it.
    pub fn new(gravity: f32, length_unit: f32) -> Self {
        Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            integration_params: IntegrationParameters {
                length_unit,
                ..IntegrationParameters::default()
            },
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    /// Solid body moved only by explicit position changes
    pub fn add_fixed(&mut self, shape: BodyShape, position: Vec2) -> BodyHandle {
        let body = RigidBodyBuilder::fixed().translation(to_vector(position)).build();
        self.insert(body, shape, false)
    }

    /// Fixed body that reports overlaps but never pushes
    pub fn add_sensor(&mut self, shape: BodyShape, position: Vec2) -> BodyHandle {
        let body = RigidBodyBuilder::fixed().translation(to_vector(position)).build();
        self.insert(body, shape, true)
    }

    /// Body integrated under gravity and pushed out of solid bodies
    pub fn add_dynamic(&mut self, shape: BodyShape, position: Vec2) -> BodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(to_vector(position))
            .lock_rotations()
            .can_sleep(false)
            .build();
        self.insert(body, shape, false)
    }

    fn insert(&mut self, body: RigidBody, shape: BodyShape, sensor: bool) -> BodyHandle {
        let handle = self.bodies.insert(body);
        let collider = ColliderBuilder::new(shape.shared())
            .sensor(sensor)
            .restitution(0.0)
            .friction(0.0)
            .friction_combine_rule(CoefficientCombineRule::Min)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        handle
    }

    /// Detach a body and its collider. Returns false if it was already gone.
    pub fn remove(&mut self, handle: BodyHandle) -> bool {
        self.bodies
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(handle).map(|b| to_vec2(b.translation()))
    }

    pub fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(handle).map(|b| to_vec2(b.linvel()))
    }

    pub fn set_position(&mut self, handle: BodyHandle, position: Vec2) -> bool {
        match self.bodies.get_mut(handle) {
            Some(body) => {
                body.set_translation(to_vector(position), true);
                true
            }
            None => false,
        }
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) -> bool {
        match self.bodies.get_mut(handle) {
            Some(body) => {
                body.set_linvel(to_vector(velocity), true);
                true
            }
            None => false,
        }
    }

    /// Shift a body and return its new position
    pub fn translate(&mut self, handle: BodyHandle, delta: Vec2) -> Option<Vec2> {
        let body = self.bodies.get_mut(handle)?;
        let position = to_vec2(body.translation()) + delta;
        body.set_translation(to_vector(position), true);
        Some(position)
    }

    /// Whether two solid bodies were in contact during the last update
    pub fn in_contact(&self, a: BodyHandle, b: BodyHandle) -> bool {
        let (Some(ca), Some(cb)) = (self.collider_of(a), self.collider_of(b)) else {
            return false;
        };
        self.narrow_phase
            .contact_pair(ca, cb)
            .is_some_and(|pair| pair.has_any_active_contact)
    }

    fn collider_of(&self, handle: BodyHandle) -> Option<ColliderHandle> {
        self.bodies.get(handle)?.colliders().first().copied()
    }

    fn parent_of(&self, collider: ColliderHandle) -> Option<BodyHandle> {
        self.colliders.get(collider)?.parent()
    }

    /// Advance by `dt_ms`, returning pairs that started touching.
    ///
    /// Contacts are detected on the positions at the start of the update, so
    /// obstacles moved by the caller are tested where they now stand. A
    /// non-positive step does nothing.
    pub fn update(&mut self, dt_ms: f32) -> Vec<CollisionStart> {
        if !(dt_ms > 0.0) {
            return Vec::new();
        }

        // Velocity gains gravity * scale * dt_ms^2 per update
        let gravity = vector![0.0, self.gravity * GRAVITY_SCALE * dt_ms * BASE_DELTA_MS];
        self.integration_params.dt = dt_ms / BASE_DELTA_MS;

        let (collision_send, collision_recv) =
            rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) =
            rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &event_handler,
        );

        let mut started = Vec::new();
        while let Ok(event) = collision_recv.try_recv() {
            let CollisionEvent::Started(c1, c2, flags) = event else {
                continue;
            };
            let (Some(h1), Some(h2)) = (self.parent_of(c1), self.parent_of(c2)) else {
                continue;
            };
            let (a, b) = if h1.into_raw_parts() <= h2.into_raw_parts() {
                (h1, h2)
            } else {
                (h2, h1)
            };
            started.push(CollisionStart {
                a,
                b,
                sensor: flags.contains(CollisionEventFlags::SENSOR),
            });
        }
        // Channel order is not guaranteed
        started.sort_by_key(|c| (c.a.into_raw_parts(), c.b.into_raw_parts()));
        started
    }
}

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn to_vec2(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: BodyShape = BodyShape::Rect {
        width: 50.0,
        height: 50.0,
    };

    fn world_with_floor() -> (Physics, BodyHandle) {
        let mut physics = Physics::new(1.7, 50.0);
        // Floor top at y = 300
        let floor = physics.add_fixed(
            BodyShape::Rect {
                width: 800.0,
                height: 100.0,
            },
            Vec2::new(400.0, 350.0),
        );
        (physics, floor)
    }

    #[test]
    fn test_gravity_accelerates_dynamic_bodies_only() {
        let mut physics = Physics::new(1.7, 50.0);
        let falling = physics.add_dynamic(PLAYER, Vec2::ZERO);
        let fixed = physics.add_fixed(PLAYER, Vec2::new(500.0, 0.0));

        physics.update(12.0);

        let dv = 1.7 * 0.001 * 144.0;
        let velocity = physics.velocity(falling).unwrap();
        assert!((velocity.y - dv).abs() < 1e-4, "vy = {}", velocity.y);
        // Never further than one full-step Euler move
        let y = physics.position(falling).unwrap().y;
        assert!(y > 0.0 && y <= dv * 12.0 / BASE_DELTA_MS + 1e-3, "y = {y}");
        assert_eq!(physics.position(fixed), Some(Vec2::new(500.0, 0.0)));
    }

    #[test]
    fn test_landing_reports_single_collision_start() {
        let (mut physics, floor) = world_with_floor();
        // Box bottom 20px above the floor
        let player = physics.add_dynamic(PLAYER, Vec2::new(200.0, 255.0));

        let mut starts = Vec::new();
        for _ in 0..200 {
            starts.extend(physics.update(12.0));
        }

        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].other(player), Some(floor));
        assert!(!starts[0].sensor);
        assert!(physics.in_contact(player, floor));

        // Resting on the floor, not sinking through it
        let position = physics.position(player).unwrap();
        assert!((position.y - 275.0).abs() < 0.5, "y = {}", position.y);
        assert!(physics.velocity(player).unwrap().y.abs() < 0.5);
    }

    #[test]
    fn test_leaving_and_returning_starts_again() {
        let (mut physics, floor) = world_with_floor();
        let player = physics.add_dynamic(PLAYER, Vec2::new(200.0, 275.0));
        assert_eq!(physics.update(12.0).len(), 1);

        physics.set_velocity(player, Vec2::new(0.0, -9.0));
        physics.update(12.0);
        physics.update(12.0);
        assert!(!physics.in_contact(player, floor));

        let mut starts = 0;
        for _ in 0..200 {
            starts += physics.update(12.0).len();
        }
        assert_eq!(starts, 1);
        assert!(physics.in_contact(player, floor));
    }

    #[test]
    fn test_sensors_report_overlap_without_pushing() {
        let (mut physics, floor) = world_with_floor();
        let player = physics.add_dynamic(PLAYER, Vec2::new(200.0, 275.0));
        let pickup = physics.add_sensor(BodyShape::Circle { radius: 35.0 }, Vec2::new(200.0, 275.0));

        let starts = physics.update(12.0);
        let pickup_start = starts
            .iter()
            .find(|s| s.other(player) == Some(pickup))
            .expect("sensor overlap reported");
        assert!(pickup_start.sensor);
        assert!(starts.iter().any(|s| s.other(player) == Some(floor) && !s.sensor));
        assert!(!physics.in_contact(player, pickup));
        assert!((physics.position(player).unwrap().x - 200.0).abs() < 1e-4);
    }

    #[test]
    fn test_remove_forgets_body() {
        let (mut physics, floor) = world_with_floor();
        let player = physics.add_dynamic(PLAYER, Vec2::new(200.0, 275.0));
        physics.update(12.0);
        assert!(physics.in_contact(player, floor));

        assert!(physics.remove(floor));
        assert!(!physics.remove(floor));
        assert!(!physics.in_contact(player, floor));
        assert!(!physics.contains(floor));
        assert_eq!(physics.position(floor), None);
        assert_eq!(physics.len(), 1);
    }

    #[test]
    fn test_fixed_pairs_never_touch() {
        let (mut physics, _floor) = world_with_floor();
        // Barrier sunk into the floor
        physics.add_fixed(
            BodyShape::Rect {
                width: 80.0,
                height: 100.0,
            },
            Vec2::new(600.0, 300.0),
        );
        assert!(physics.update(12.0).is_empty());
    }

    #[test]
    fn test_zero_step_is_a_no_op() {
        let (mut physics, _floor) = world_with_floor();
        let player = physics.add_dynamic(PLAYER, Vec2::new(200.0, 100.0));
        assert!(physics.update(0.0).is_empty());
        assert!(physics.update(f32::NAN).is_empty());
        assert_eq!(physics.position(player), Some(Vec2::new(200.0, 100.0)));
        assert_eq!(physics.velocity(player), Some(Vec2::ZERO));
    }

    #[test]
    fn test_translate_moves_fixed_body() {
        let (mut physics, floor) = world_with_floor();
        assert_eq!(
            physics.translate(floor, Vec2::new(-7.0, 0.0)),
            Some(Vec2::new(393.0, 350.0))
        );
        assert_eq!(physics.position(floor), Some(Vec2::new(393.0, 350.0)));
    }
}
