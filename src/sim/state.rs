//! Game state and core simulation types
//!
//! Everything the simulation mutates lives in [`GameState`], owned by the host
//! and passed into [`super::tick`] by reference.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::generator::{self, PlatformSpec};
use crate::consts::AVATAR_SPAWN_HEIGHT;
use crate::tuning::{PhysicsTuning, Tuning};

/// Notable things that happened during a tick, drained by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// A jump was accepted (`count` is the jump number within this airtime)
    Jumped { count: u8 },
    /// The avatar came to rest after being airborne (`None` = floor)
    Landed { platform: Option<u32> },
    /// First touch of a platform awarded a point
    Scored { platform: u32, score: u32 },
    /// The avatar hit the floor while holding a score
    ScoreReset { lost: u32 },
    /// Platforms that scrolled out of view this tick
    PlatformsCollected { count: usize },
}

/// The player-controlled ball
#[derive(Debug, Clone)]
pub struct Avatar {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Set by a jump, cleared on landing
    pub jumping: bool,
    /// Jumps made since the last landing
    pub jumps: u8,
    pub max_jumps: u8,
}

impl Avatar {
    pub fn new(pos: Vec2, physics: &PhysicsTuning) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius: physics.avatar_radius,
            jumping: false,
            jumps: 0,
            max_jumps: physics.max_jumps,
        }
    }

    pub fn can_jump(&self) -> bool {
        self.jumps < self.max_jumps
    }

    /// Apply a jump impulse if any jumps remain.
    ///
    /// `roll` in `[0, 1)` picks the strength of follow-up jumps; the first jump
    /// from rest always uses the full impulse. Returns false (and changes
    /// nothing) when the jump budget is spent.
    pub fn jump(&mut self, physics: &PhysicsTuning, roll: f32) -> bool {
        if !self.can_jump() {
            return false;
        }
        self.vel.y = if self.jumps == 0 {
            -physics.first_jump_impulse
        } else {
            -(physics.second_jump_min + roll * (physics.second_jump_max - physics.second_jump_min))
        };
        self.jumping = true;
        self.jumps += 1;
        true
    }

    /// Come to rest with the bottom of the ball at `surface_y`
    pub fn land_on(&mut self, surface_y: f32) {
        self.pos.y = surface_y - self.radius;
        self.vel.y = 0.0;
        self.jumping = false;
        self.jumps = 0;
    }

    /// Axis-aligned overlap of the ball's bounding box with a platform box
    pub fn overlaps(&self, platform: &Platform) -> bool {
        self.pos.y + self.radius > platform.pos.y
            && self.pos.y - self.radius < platform.pos.y + platform.height
            && self.pos.x + self.radius > platform.pos.x
            && self.pos.x - self.radius < platform.pos.x + platform.width
    }
}

/// A landing surface; `pos` is the top-left corner
#[derive(Debug, Clone)]
pub struct Platform {
    pub id: u32,
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    /// Score has already been awarded for this platform
    pub touched: bool,
}

impl Platform {
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.height
    }
}

/// Complete game state (deterministic for a given seed and input sequence)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    /// World size in pixels (x = width, y = height, y grows downward)
    pub world: Vec2,
    pub avatar: Avatar,
    /// Live platforms in spawn order
    pub platforms: Vec<Platform>,
    pub score: u32,
    /// Score flash cue in `[0, 1]`, set on reset and decayed every tick
    pub flash: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Platforms generated this run (drives the onboarding ramp)
    pub platforms_spawned: u32,
    rng: Pcg32,
    events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a new run and place the first platform
    pub fn new(seed: u64, width: f32, height: f32, tuning: Tuning) -> Self {
        let avatar = Avatar::new(
            Vec2::new(width / 2.0, height - AVATAR_SPAWN_HEIGHT),
            &tuning.physics,
        );
        let mut state = Self {
            seed,
            tuning,
            world: Vec2::new(width, height),
            avatar,
            platforms: Vec::new(),
            score: 0,
            flash: 0.0,
            time_ticks: 0,
            platforms_spawned: 0,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            next_id: 1,
        };

        state.spawn_platform();

        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Generate the next platform and append it to the live sequence
    pub fn spawn_platform(&mut self) -> u32 {
        let spec: PlatformSpec = generator::next_platform(
            &self.tuning.platforms,
            self.world,
            self.platforms.last(),
            self.platforms_spawned,
            &mut self.rng,
        );
        let id = self.next_entity_id();
        self.platforms.push(Platform {
            id,
            pos: spec.pos,
            width: spec.width,
            height: spec.height,
            touched: false,
        });
        self.platforms_spawned += 1;
        log::debug!(
            "Spawned platform {} at ({:.0}, {:.0}) width {:.0}",
            id,
            spec.pos.x,
            spec.pos.y,
            spec.width
        );
        id
    }

    /// Attempt a jump, drawing the follow-up strength from the run RNG
    pub fn jump(&mut self) -> bool {
        use rand::Rng;

        if !self.avatar.can_jump() {
            return false;
        }
        let roll: f32 = self.rng.random();
        let accepted = self.avatar.jump(&self.tuning.physics, roll);
        if accepted {
            let count = self.avatar.jumps;
            self.push_event(GameEvent::Jumped { count });
        }
        accepted
    }

    /// Rescale vertical positions after the viewport changed size.
    ///
    /// Y positions scale by `new_height / old_height`; platforms that would
    /// poke through the new floor are clamped onto it. X positions are kept.
    pub fn resize(&mut self, width: f32, height: f32) {
        let old_height = self.world.y;
        if !(width > 0.0 && height > 0.0 && old_height > 0.0) {
            log::warn!("Ignoring resize to {}x{}", width, height);
            return;
        }

        let scale = height / old_height;
        self.avatar.pos.y *= scale;
        for platform in &mut self.platforms {
            platform.pos.y *= scale;
            if platform.bottom() > height {
                platform.pos.y = height - platform.height;
            }
        }
        self.world = Vec2::new(width, height);
        log::info!(
            "World resized to {:.0}x{:.0} (scale {:.3})",
            width,
            height,
            scale
        );
    }
}
