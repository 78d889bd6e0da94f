//! Frame building
//!
//! Turns a [`GameState`] into a triangle list plus the HUD score readout. Pure,
//! so it can be tested without a GPU.

use glam::Vec2;

use super::shapes;
use super::vertex::{Vertex, colors};
use crate::sim::{Avatar, GameState, Platform};

/// Segments used for every circle in the scene
pub const CIRCLE_SEGMENTS: u32 = 32;
/// Outline width in pixels
pub const OUTLINE_WIDTH: f32 = 2.0;
/// Pyramid apex height relative to platform height
pub const PYRAMID_RISE: f32 = 1.3;

/// CSS colors for the score readout
pub const SCORE_COLOR: &str = "#50C878";
pub const SCORE_FLASH_COLOR: &str = "red";

/// Text and tint for the HUD score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreReadout {
    pub text: String,
    pub color: &'static str,
}

impl ScoreReadout {
    pub fn from_state(state: &GameState) -> Self {
        Self {
            text: format!("Score: {}", state.score),
            color: if state.flash > 0.0 {
                SCORE_FLASH_COLOR
            } else {
                SCORE_COLOR
            },
        }
    }
}

/// Build the full frame: background, the avatar, then platforms over it
pub fn build_scene(state: &GameState) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(
        6 + state.platforms.len() * 21 + (CIRCLE_SEGMENTS as usize) * 21 + 3,
    );

    vertices.extend(shapes::gradient_rect(
        Vec2::ZERO,
        state.world,
        colors::SKY_TOP,
        colors::SKY_BOTTOM,
    ));

    push_avatar(&mut vertices, &state.avatar);

    for platform in &state.platforms {
        push_pyramid(&mut vertices, platform);
    }

    vertices
}

/// Triangular silhouette standing on the platform's top edge
fn push_pyramid(out: &mut Vec<Vertex>, platform: &Platform) {
    let base_left = platform.pos;
    let base_right = platform.pos + Vec2::new(platform.width, 0.0);
    let apex = platform.pos + Vec2::new(platform.width / 2.0, -platform.height * PYRAMID_RISE);

    out.extend(shapes::triangle(base_left, apex, base_right, colors::PLATFORM));
    for (a, b) in [(base_left, apex), (apex, base_right), (base_right, base_left)] {
        out.extend(shapes::line(a, b, OUTLINE_WIDTH, colors::OUTLINE));
    }
}

/// Gold ball with an outline, a red inner triangle and three gems
fn push_avatar(out: &mut Vec<Vertex>, avatar: &Avatar) {
    let c = avatar.pos;
    let r = avatar.radius;

    out.extend(shapes::circle(c, r, colors::AVATAR_BODY, CIRCLE_SEGMENTS));
    out.extend(shapes::ring(
        c,
        r - OUTLINE_WIDTH / 2.0,
        r + OUTLINE_WIDTH / 2.0,
        colors::OUTLINE,
        CIRCLE_SEGMENTS,
    ));

    let inset = r * 0.5;
    out.extend(shapes::triangle(
        c + Vec2::new(0.0, -r + inset),
        c + Vec2::new(r - inset, r - inset),
        c + Vec2::new(-r + inset, r - inset),
        colors::AVATAR_TRIANGLE,
    ));

    let offset = r * 0.4;
    let gem_radius = offset / 2.0;
    for (pos, color) in [
        (c + Vec2::new(0.0, -offset), colors::GEM_BLUE),
        (c + Vec2::new(-offset, offset), colors::GEM_GREEN),
        (c + Vec2::new(offset, offset), colors::GEM_PURPLE),
    ] {
        out.extend(shapes::circle(pos, gem_radius, color, CIRCLE_SEGMENTS));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    fn state() -> GameState {
        GameState::new(3, 800.0, 600.0, Tuning::classic())
    }

    #[test]
    fn test_scene_starts_with_background() {
        let s = state();
        let verts = build_scene(&s);
        let bg = &verts[..6];
        assert!(bg
            .iter()
            .any(|v| v.position == [800.0, 600.0] && v.color == colors::SKY_BOTTOM));
        assert!(bg
            .iter()
            .any(|v| v.position == [0.0, 0.0] && v.color == colors::SKY_TOP));
    }

    #[test]
    fn test_scene_size_tracks_platforms() {
        let mut s = state();
        let one = build_scene(&s).len();
        s.spawn_platform();
        let two = build_scene(&s).len();
        // Fill triangle plus three outline quads
        assert_eq!(two - one, 3 + 3 * 6);
    }

    #[test]
    fn test_pyramid_apex_above_platform() {
        let mut out = Vec::new();
        let platform = Platform {
            id: 1,
            pos: Vec2::new(100.0, 200.0),
            width: 60.0,
            height: 10.0,
            touched: false,
        };
        push_pyramid(&mut out, &platform);
        assert_eq!(out[0].position, [100.0, 200.0]);
        assert_eq!(out[1].position[0], 130.0);
        assert!((out[1].position[1] - 187.0).abs() < 1e-3);
        assert_eq!(out[2].position, [160.0, 200.0]);
        assert_eq!(out[0].color, colors::PLATFORM);
    }

    #[test]
    fn test_platforms_drawn_over_avatar() {
        let s = state();
        let verts = build_scene(&s);
        // Avatar body follows the background directly
        assert_eq!(verts[6].color, colors::AVATAR_BODY);
        // The last platform outline closes the frame
        assert_eq!(verts.last().unwrap().color, colors::OUTLINE);
        let body = verts
            .iter()
            .position(|v| v.color == colors::AVATAR_BODY)
            .unwrap();
        let pyramid = verts
            .iter()
            .position(|v| v.color == colors::PLATFORM)
            .unwrap();
        assert!(body < pyramid);
    }

    #[test]
    fn test_score_readout_flash() {
        let mut s = state();
        s.score = 7;
        let readout = ScoreReadout::from_state(&s);
        assert_eq!(readout.text, "Score: 7");
        assert_eq!(readout.color, SCORE_COLOR);

        s.flash = 0.4;
        assert_eq!(ScoreReadout::from_state(&s).color, SCORE_FLASH_COLOR);
    }
}
