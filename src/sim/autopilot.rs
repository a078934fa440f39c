//! Idle/demo mode input source
//!
//! Looks at the next barrier and presses jump early enough to clear it.

use super::state::{EntityKind, InputEvent, World};

/// Steps of travel before a barrier reaches the player at which to jump
const LEAD_STEPS: f32 = 24.0;

/// Decide whether to jump this frame
pub fn autopilot_input(world: &World) -> Option<InputEvent> {
    let position = world.player_position().ok()?;
    let velocity = world.player_velocity().ok()?;
    let half = world.player.size / 2.0;
    let player_left = position.x - half.x;
    let player_right = position.x + half.x;
    let player_bottom = position.y + half.y;

    // Nearest barrier that still overlaps or lies ahead of the player
    let next = world
        .obstacles
        .values()
        .filter(|e| e.kind == EntityKind::Barrier && !e.scored)
        .filter_map(|e| {
            let pos = world.physics.position(e.body)?;
            let left = pos.x - e.size.x / 2.0;
            let right = pos.x + e.size.x / 2.0;
            let top = pos.y - e.size.y / 2.0;
            (right > player_left).then_some((left, top))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0));

    let (barrier_left, barrier_top) = next?;
    let gap = barrier_left - player_right;

    match world.jump_count {
        0 if gap <= world.speed * LEAD_STEPS => Some(InputEvent::Press),
        // Second jump if the first one is coming down too early
        1 if gap <= 0.0 && velocity.y > 0.0 && player_bottom > barrier_top - 10.0 => {
            Some(InputEvent::Press)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::sim::spawn::spawn_obstacle;
    use crate::sim::state::GameEvent;
    use crate::sim::tick::step;
    use crate::tuning::Tuning;

    fn world() -> World {
        World::new(Tuning::default(), 800.0, 400.0, 5).unwrap()
    }

    #[test]
    fn test_idle_without_barriers() {
        assert_eq!(autopilot_input(&world()), None);
    }

    #[test]
    fn test_jumps_when_barrier_is_close() {
        let mut w = world();
        // Left edge 100px ahead of the player's right edge
        spawn_obstacle(&mut w, EntityKind::Barrier, Vec2::new(365.0, 300.0), 100.0).unwrap();
        assert_eq!(autopilot_input(&w), Some(InputEvent::Press));
    }

    #[test]
    fn test_waits_for_far_barrier() {
        let mut w = world();
        spawn_obstacle(&mut w, EntityKind::Barrier, Vec2::new(700.0, 300.0), 100.0).unwrap();
        assert_eq!(autopilot_input(&w), None);
    }

    #[test]
    fn test_ignores_passed_barriers() {
        let mut w = world();
        let key =
            spawn_obstacle(&mut w, EntityKind::Barrier, Vec2::new(365.0, 300.0), 100.0).unwrap();
        w.obstacles.get_mut(&key).unwrap().scored = true;
        assert_eq!(autopilot_input(&w), None);
    }

    #[test]
    fn test_clears_barriers() {
        let tuning = Tuning {
            slow_pickup_chance: 0.0,
            hazard_chance: 0.0,
            ..Tuning::default()
        };
        let mut w = World::new(tuning, 800.0, 400.0, 77).unwrap();
        let (mut scores, mut crashes) = (0, 0);
        for _ in 0..1500 {
            let input: Vec<InputEvent> = autopilot_input(&w).into_iter().collect();
            for event in step(&mut w, &input, 16.0).unwrap() {
                match event {
                    GameEvent::Score => scores += 1,
                    GameEvent::GameOver => crashes += 1,
                    _ => {}
                }
            }
        }
        assert!(scores >= 10, "scores = {scores}");
        assert!(crashes < scores, "crashes = {crashes}, scores = {scores}");
    }
}
