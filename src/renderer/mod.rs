//! Rendering module
//!
//! `scene` builds a triangle list from the game state; `pipeline` uploads it to
//! a WebGPU surface each frame.

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

pub use pipeline::{RenderInitError, RenderState};
pub use scene::{ScoreReadout, build_scene};
pub use vertex::Vertex;
