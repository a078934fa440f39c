//! Frame-driven simulation module
//!
//! All gameplay mechanics live here:
//! - Obstacles scroll; the player only moves vertically
//! - Seeded RNG only, owned by the world
//! - Stable iteration order (by entity key / body handle)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod physics;
pub mod spawn;
pub mod state;
pub mod tick;

pub use autopilot::autopilot_input;
pub use physics::{BodyHandle, BodyShape, CollisionStart, Physics};
pub use spawn::{SpawnTick, advance_spawner, spawn_obstacle, spawn_tick};
pub use state::{Entity, EntityKey, EntityKind, GameEvent, InputEvent, SimError, World};
pub use tick::step;
