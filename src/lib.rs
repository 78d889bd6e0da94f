//! Sky Hop - An endless vertical platform hopper
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, platforms, collisions, scrolling)
//! - `renderer`: Scene building and WebGPU rendering pipeline
//! - `platform`: Browser input mapping and URL query parsing
//! - `tuning`: Data-driven game balance

pub mod platform;
pub mod renderer;
pub mod sim;
pub mod tuning;

pub use tuning::{Tuning, TuningError, TuningPreset};

/// Game configuration constants
pub mod consts {
    /// Reference cadence the gameplay constants were tuned at
    pub const REFERENCE_HZ: f32 = 60.0;
    /// Fixed simulation timestep (one reference tick)
    pub const SIM_DT: f32 = 1.0 / REFERENCE_HZ;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta fed into the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Avatar spawns this far above the floor (center)
    pub const AVATAR_SPAWN_HEIGHT: f32 = 50.0;
    /// Rejection sampling attempts before the generator samples the feasible set directly
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 16;
}

/// Convert a per-reference-tick rate into a per-second rate
#[inline]
pub const fn per_tick(value: f32) -> f32 {
    value * consts::REFERENCE_HZ
}

/// Convert a per-reference-tick² acceleration into per-second²
#[inline]
pub const fn per_tick_sq(value: f32) -> f32 {
    value * consts::REFERENCE_HZ * consts::REFERENCE_HZ
}
