//! Simulation tick
//!
//! Core game loop step. Sub-steps run in a fixed order: input, motion, world
//! bounds, platform collisions, then camera scroll and platform collection.

use super::state::{GameEvent, GameState};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Move left (held)
    pub left: bool,
    /// Move right (held)
    pub right: bool,
    /// Jump (edge-triggered, consumed by one tick)
    pub jump: bool,
}

impl TickInput {
    /// Horizontal intent in {-1, 0, 1}
    pub fn horizontal(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// Advance the game state by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if dt <= 0.0 {
        return;
    }
    state.time_ticks += 1;

    // Decay before anything can re-arm it, so a reset shows at full strength
    if state.flash > 0.0 {
        state.flash = (state.flash - state.tuning.physics.flash_decay * dt).max(0.0);
    }

    if input.jump {
        state.jump();
    }
    state.avatar.vel.x = input.horizontal() * state.tuning.physics.move_speed;

    integrate(state, dt);
    clamp_to_world(state);
    resolve_collisions(state);
    scroll_and_collect(state, dt);
}

/// Semi-implicit Euler: velocity first, then position
fn integrate(state: &mut GameState, dt: f32) {
    let avatar = &mut state.avatar;
    avatar.vel.y += state.tuning.physics.gravity * dt;
    avatar.pos += avatar.vel * dt;
}

/// Keep the avatar inside the walls; the floor is the only failure path
fn clamp_to_world(state: &mut GameState) {
    let world = state.world;
    let avatar = &mut state.avatar;

    let max_x = (world.x - avatar.radius).max(avatar.radius);
    avatar.pos.x = avatar.pos.x.clamp(avatar.radius, max_x);

    if avatar.pos.y + avatar.radius > world.y {
        let was_jumping = avatar.jumping;
        avatar.land_on(world.y);
        if was_jumping {
            state.push_event(GameEvent::Landed { platform: None });
        }

        if state.score > 0 {
            let lost = state.score;
            state.score = 0;
            state.flash = 1.0;
            log::debug!("Fell to the floor, lost score {}", lost);
            state.push_event(GameEvent::ScoreReset { lost });
        }
    }
}

/// Land on platforms while falling; first touch scores and spawns more.
///
/// Only platforms live at the start of this pass are visited, so platforms
/// spawned here wait until the next tick.
fn resolve_collisions(state: &mut GameState) {
    let live = state.platforms.len();

    for i in 0..live {
        if state.avatar.vel.y <= 0.0 || !state.avatar.overlaps(&state.platforms[i]) {
            continue;
        }

        let was_jumping = state.avatar.jumping;
        let platform_id = state.platforms[i].id;
        let surface_y = state.platforms[i].pos.y;
        state.avatar.land_on(surface_y);
        if was_jumping {
            state.push_event(GameEvent::Landed {
                platform: Some(platform_id),
            });
        }

        if !state.platforms[i].touched {
            state.platforms[i].touched = true;
            state.score += 1;
            let score = state.score;
            state.push_event(GameEvent::Scored {
                platform: platform_id,
                score,
            });

            let count = state.tuning.platforms.spawn.spawn_count(state.platforms.len());
            for _ in 0..count {
                state.spawn_platform();
            }
        }
    }
}

/// Scroll everything down while the avatar is in the upper half, then drop
/// platforms that left the bottom of the world
fn scroll_and_collect(state: &mut GameState, dt: f32) {
    let height = state.world.y;

    if state.avatar.pos.y < height / 2.0 {
        let shift = state.tuning.physics.scroll_speed * dt;
        for platform in &mut state.platforms {
            platform.pos.y += shift;
        }
        state.avatar.pos.y += shift;
    }

    let before = state.platforms.len();
    state.platforms.retain(|p| p.pos.y < height);
    let collected = before - state.platforms.len();
    if collected > 0 {
        state.push_event(GameEvent::PlatformsCollected { count: collected });
    }

    // Never leave the run without a surface to aim for
    if state.platforms.is_empty() {
        log::debug!("No live platforms left, respawning");
        state.spawn_platform();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::state::Platform;
    use crate::tuning::{SpawnPolicy, Tuning};
    use glam::Vec2;
    use proptest::prelude::*;

    const W: f32 = 1280.0;
    const H: f32 = 800.0;

    fn state() -> GameState {
        GameState::new(12345, W, H, Tuning::classic())
    }

    /// State with a single platform directly under a falling avatar
    fn landing_setup() -> GameState {
        let mut s = state();
        s.platforms[0].pos = Vec2::new(600.0, 500.0);
        s.platforms[0].width = 80.0;
        s.avatar.pos = Vec2::new(640.0, 485.0);
        s.avatar.vel = Vec2::new(0.0, 60.0);
        s.avatar.jumping = true;
        s.avatar.jumps = 1;
        s
    }

    #[test]
    fn test_gravity_accumulates() {
        let mut s = state();
        s.avatar.pos.y = 450.0;
        tick(&mut s, &TickInput::default(), SIM_DT);
        let g = s.tuning.physics.gravity;
        assert!((s.avatar.vel.y - g * SIM_DT).abs() < 1e-4);
        tick(&mut s, &TickInput::default(), SIM_DT);
        assert!((s.avatar.vel.y - 2.0 * g * SIM_DT).abs() < 1e-4);
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut s = state();
        let pos = s.avatar.pos;
        tick(&mut s, &TickInput { jump: true, ..Default::default() }, 0.0);
        assert_eq!(s.avatar.pos, pos);
        assert_eq!(s.avatar.jumps, 0);
        assert_eq!(s.time_ticks, 0);
    }

    #[test]
    fn test_jump_input_launches_upward() {
        let mut s = state();
        s.avatar.land_on(H);
        let y = s.avatar.pos.y;
        tick(&mut s, &TickInput { jump: true, ..Default::default() }, SIM_DT);
        assert_eq!(s.avatar.jumps, 1);
        assert!(s.avatar.jumping);
        assert!(s.avatar.pos.y < y);
        assert!(s.drain_events().contains(&GameEvent::Jumped { count: 1 }));
    }

    #[test]
    fn test_horizontal_input() {
        let mut s = state();
        let x = s.avatar.pos.x;
        tick(&mut s, &TickInput { right: true, ..Default::default() }, SIM_DT);
        assert!((s.avatar.pos.x - (x + 5.0)).abs() < 1e-3);
        // Both held cancel out
        tick(&mut s, &TickInput { left: true, right: true, jump: false }, SIM_DT);
        assert_eq!(s.avatar.vel.x, 0.0);
    }

    #[test]
    fn test_floor_snaps_and_resets_score() {
        let mut s = state();
        s.score = 5;
        s.avatar.pos.y = H - s.avatar.radius + 3.0;
        s.avatar.vel.y = 200.0;
        s.avatar.jumps = 2;
        s.avatar.jumping = true;
        tick(&mut s, &TickInput::default(), SIM_DT);

        assert_eq!(s.score, 0);
        assert_eq!(s.flash, 1.0);
        assert_eq!(s.avatar.pos.y, H - s.avatar.radius);
        assert_eq!(s.avatar.vel.y, 0.0);
        assert_eq!(s.avatar.jumps, 0);
        assert!(!s.avatar.jumping);
        let events = s.drain_events();
        assert!(events.contains(&GameEvent::ScoreReset { lost: 5 }));
        assert!(events.contains(&GameEvent::Landed { platform: None }));
    }

    #[test]
    fn test_floor_without_score_does_not_flash() {
        let mut s = state();
        s.avatar.pos.y = H;
        tick(&mut s, &TickInput::default(), SIM_DT);
        assert_eq!(s.flash, 0.0);
        assert_eq!(s.score, 0);
    }

    #[test]
    fn test_flash_decays_in_simulation() {
        let mut s = state();
        s.flash = 1.0;
        s.avatar.pos.y = 450.0;
        for _ in 0..10 {
            tick(&mut s, &TickInput::default(), SIM_DT);
        }
        // 0.02 per reference tick
        assert!((s.flash - 0.8).abs() < 1e-4);
        for _ in 0..100 {
            tick(&mut s, &TickInput::default(), SIM_DT);
        }
        assert_eq!(s.flash, 0.0);
    }

    #[test]
    fn test_landing_scores_once_and_spawns_pair() {
        let mut s = landing_setup();
        tick(&mut s, &TickInput::default(), SIM_DT);

        assert_eq!(s.score, 1);
        assert!(s.platforms[0].touched);
        assert_eq!(s.avatar.pos.y, 500.0 - s.avatar.radius);
        assert_eq!(s.avatar.vel.y, 0.0);
        assert_eq!(s.avatar.jumps, 0);
        assert!(!s.avatar.jumping);
        assert_eq!(s.platforms.len(), 3);
        assert!(s.platforms[1..].iter().all(|p| !p.touched));

        // Park the new platforms out of reach
        for p in &mut s.platforms[1..] {
            p.pos.y = -300.0;
        }

        // Standing on it keeps colliding but never scores again
        for _ in 0..30 {
            tick(&mut s, &TickInput::default(), SIM_DT);
        }
        assert_eq!(s.score, 1);
        assert_eq!(s.platforms.len(), 3);
    }

    #[test]
    fn test_rising_through_platform_does_not_land() {
        let mut s = landing_setup();
        s.avatar.pos.y = 495.0;
        s.avatar.vel.y = -600.0;
        tick(&mut s, &TickInput::default(), SIM_DT);
        assert_eq!(s.score, 0);
        assert!(!s.platforms[0].touched);
    }

    #[test]
    fn test_capped_policy_spawns_single_over_cap() {
        let mut tuning = Tuning::classic();
        tuning.platforms.spawn = SpawnPolicy::Capped { cap: 2 };
        let mut s = GameState::new(1, W, H, tuning);
        s.spawn_platform();
        s.spawn_platform();
        // Three live, over the cap of two
        s.platforms[0].pos = Vec2::new(600.0, 500.0);
        s.platforms[0].width = 80.0;
        s.avatar.pos = Vec2::new(640.0, 485.0);
        s.avatar.vel = Vec2::new(0.0, 60.0);
        for p in &mut s.platforms[1..] {
            p.pos.y = -400.0;
        }
        tick(&mut s, &TickInput::default(), SIM_DT);
        assert_eq!(s.score, 1);
        assert_eq!(s.platforms.len(), 4);
    }

    #[test]
    fn test_landing_stops_further_hits_this_tick() {
        let mut s = landing_setup();
        // A second untouched platform overlapping the landing spot
        let id = s.next_entity_id();
        s.platforms.push(Platform {
            id,
            pos: Vec2::new(610.0, 502.0),
            width: 60.0,
            height: 10.0,
            touched: false,
        });
        tick(&mut s, &TickInput::default(), SIM_DT);
        // After landing on the first, dy is 0 so the second cannot score this tick
        assert_eq!(s.score, 1);
        assert!(!s.platforms[1].touched);
        assert_eq!(s.platforms.len(), 4);
    }

    #[test]
    fn test_scroll_when_above_midpoint() {
        let mut s = state();
        s.platforms[0].pos.y = 300.0;
        s.avatar.pos = Vec2::new(100.0, 200.0);
        s.avatar.vel = Vec2::ZERO;
        tick(&mut s, &TickInput::default(), SIM_DT);
        let g = s.tuning.physics.gravity;
        let expected_avatar = 200.0 + g * SIM_DT * SIM_DT + 10.0;
        assert!((s.avatar.pos.y - expected_avatar).abs() < 1e-3);
        assert!((s.platforms[0].pos.y - 310.0).abs() < 1e-3);
    }

    #[test]
    fn test_no_scroll_below_midpoint() {
        let mut s = state();
        s.platforms[0].pos.y = 300.0;
        s.avatar.pos = Vec2::new(100.0, 600.0);
        tick(&mut s, &TickInput::default(), SIM_DT);
        assert_eq!(s.platforms[0].pos.y, 300.0);
    }

    #[test]
    fn test_collects_platforms_below_world() {
        let mut s = state();
        s.spawn_platform();
        s.platforms[0].pos.y = H - 5.0;
        s.platforms[1].pos = Vec2::new(700.0, 100.0);
        s.avatar.pos = Vec2::new(100.0, 100.0);
        let kept = s.platforms[1].id;
        tick(&mut s, &TickInput::default(), SIM_DT);
        assert_eq!(s.platforms.len(), 1);
        assert_eq!(s.platforms[0].id, kept);
        assert!(s
            .drain_events()
            .contains(&GameEvent::PlatformsCollected { count: 1 }));
    }

    #[test]
    fn test_respawns_when_everything_collected() {
        let mut s = state();
        s.platforms[0].pos.y = H - 1.0;
        s.avatar.pos = Vec2::new(100.0, 100.0);
        tick(&mut s, &TickInput::default(), SIM_DT);
        assert_eq!(s.platforms.len(), 1);
        assert!(s.platforms[0].pos.y < H);
    }

    #[test]
    fn test_determinism() {
        let mut s1 = GameState::new(99999, W, H, Tuning::classic());
        let mut s2 = GameState::new(99999, W, H, Tuning::classic());

        let inputs = [
            TickInput { jump: true, ..Default::default() },
            TickInput { right: true, ..Default::default() },
            TickInput { right: true, jump: true, ..Default::default() },
            TickInput { left: true, ..Default::default() },
            TickInput::default(),
        ];

        for _ in 0..40 {
            for input in &inputs {
                tick(&mut s1, input, SIM_DT);
                tick(&mut s2, input, SIM_DT);
            }
        }

        assert_eq!(s1.time_ticks, s2.time_ticks);
        assert_eq!(s1.score, s2.score);
        assert_eq!(s1.avatar.pos, s2.avatar.pos);
        assert_eq!(s1.platforms.len(), s2.platforms.len());
    }

    fn input_strategy() -> impl Strategy<Value = TickInput> {
        (any::<bool>(), any::<bool>(), any::<bool>())
            .prop_map(|(left, right, jump)| TickInput { left, right, jump })
    }

    proptest! {
        #[test]
        fn prop_avatar_stays_between_walls(
            seed in any::<u64>(),
            inputs in prop::collection::vec(input_strategy(), 1..300),
        ) {
            let mut s = GameState::new(seed, 640.0, 480.0, Tuning::classic());
            let r = s.avatar.radius;
            for input in &inputs {
                tick(&mut s, input, SIM_DT);
                prop_assert!(s.avatar.pos.x >= r && s.avatar.pos.x <= 640.0 - r);
            }
        }

        #[test]
        fn prop_touched_is_sticky_and_scores_once(
            seed in any::<u64>(),
            inputs in prop::collection::vec(input_strategy(), 1..400),
        ) {
            let mut s = GameState::new(seed, 800.0, 600.0, Tuning::capped());
            for input in &inputs {
                let touched_before: Vec<u32> = s
                    .platforms
                    .iter()
                    .filter(|p| p.touched)
                    .map(|p| p.id)
                    .collect();
                let score_before = s.score;

                tick(&mut s, input, SIM_DT);

                // Touched platforms never revert
                for id in &touched_before {
                    if let Some(p) = s.platforms.iter().find(|p| p.id == *id) {
                        prop_assert!(p.touched);
                    }
                }
                let scored = s
                    .drain_events()
                    .iter()
                    .filter(|e| matches!(e, GameEvent::Scored { .. }))
                    .count() as u32;
                let newly_touched = s
                    .platforms
                    .iter()
                    .filter(|p| p.touched && !touched_before.contains(&p.id))
                    .count() as u32;
                prop_assert!(scored <= 1);
                prop_assert_eq!(scored, newly_touched);
                if s.score != 0 {
                    prop_assert_eq!(s.score, score_before + scored);
                }
            }
        }

        #[test]
        fn prop_gravity_step_in_open_air(
            seed in any::<u64>(),
            x in 100.0f32..500.0,
            y in 300.0f32..400.0,
            dy in -900.0f32..300.0,
        ) {
            let mut s = GameState::new(seed, 640.0, 800.0, Tuning::classic());
            s.platforms[0].pos = Vec2::new(0.0, -500.0);
            s.avatar.pos = Vec2::new(x, y);
            s.avatar.vel.y = dy;
            tick(&mut s, &TickInput::default(), SIM_DT);
            let expected = dy + s.tuning.physics.gravity * SIM_DT;
            prop_assert!((s.avatar.vel.y - expected).abs() < 1e-3);
        }
    }
}
