//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Explicit timestep only
//! - Seeded RNG only
//! - Stable iteration order (platforms in spawn order)
//! - No rendering or platform dependencies

pub mod generator;
pub mod state;
pub mod tick;

pub use generator::{PlatformSpec, next_platform};
pub use state::{Avatar, GameEvent, GameState, Platform};
pub use tick::{TickInput, tick};
