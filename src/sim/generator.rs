//! Platform generator
//!
//! The first platforms of a run come from the tuning's onboarding ramp. After
//! that each platform is placed a random vertical gap above the previous one,
//! at a random x that keeps a minimum horizontal distance from it so
//! consecutive platforms never stack.

use glam::Vec2;
use rand::Rng;

use super::state::Platform;
use crate::consts::MAX_PLACEMENT_ATTEMPTS;
use crate::tuning::{PlatformTuning, RampStep};

/// Geometry of a platform about to be spawned
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformSpec {
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
}

/// Produce the next platform.
///
/// `index` is the number of platforms generated so far this run; `last` is the
/// newest live platform, if any.
pub fn next_platform<R: Rng>(
    tuning: &PlatformTuning,
    world: Vec2,
    last: Option<&Platform>,
    index: u32,
    rng: &mut R,
) -> PlatformSpec {
    let ramp_step = tuning.ramp.get(index as usize).copied();

    let pos = match (ramp_step, last) {
        (None, Some(last)) => {
            let y = last.pos.y
                - tuning.min_gap_y
                - rng.random::<f32>() * (tuning.max_gap_y - tuning.min_gap_y);
            let x = place_x(tuning, world.x, last.pos.x, rng);
            Some(Vec2::new(x, y))
        }
        _ => None,
    };

    let width = random_width(tuning, rng);
    let pos = pos.unwrap_or_else(|| {
        // Nothing live to build on: restart the ramp
        let step = ramp_step.or_else(|| tuning.ramp.first().copied());
        ramp_position(step, world, width, tuning.max_gap_y)
    });

    PlatformSpec {
        pos,
        width,
        height: tuning.height,
    }
}

fn random_width<R: Rng>(tuning: &PlatformTuning, rng: &mut R) -> f32 {
    if tuning.max_width > tuning.min_width {
        rng.random_range(tuning.min_width..tuning.max_width)
    } else {
        tuning.min_width
    }
}

fn ramp_position(step: Option<RampStep>, world: Vec2, width: f32, fallback_rise: f32) -> Vec2 {
    let max_x = (world.x - width).max(0.0);
    match step {
        Some(step) => Vec2::new(
            (world.x - step.from_right).min(max_x).max(0.0),
            world.y - step.from_bottom,
        ),
        // Empty ramp: center a platform one gap above the floor
        None => Vec2::new(max_x / 2.0, world.y - fallback_rise),
    }
}

/// Pick x in `[0, span)` with `|x - last_x| >= min_gap_x`.
///
/// Rejection sampling is bounded; once the budget runs out the feasible set
/// `[0, last_x - gap] ∪ [last_x + gap, span]` is sampled directly.
fn place_x<R: Rng>(tuning: &PlatformTuning, world_width: f32, last_x: f32, rng: &mut R) -> f32 {
    let span = (world_width - tuning.right_margin).max(0.0);
    let gap = tuning.min_gap_x;

    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let x = rng.random::<f32>() * span;
        if (x - last_x).abs() >= gap {
            return x;
        }
    }

    let left_len = (last_x - gap).min(span).max(0.0);
    let right_start = (last_x + gap).max(0.0);
    let right_len = (span - right_start).max(0.0);
    let total = left_len + right_len;

    if total > 0.0 {
        let u = rng.random::<f32>() * total;
        return if u < left_len {
            u
        } else {
            (right_start + (u - left_len)).min(span)
        };
    }

    // The range is too narrow for the gap; get as far away as possible
    let x = if last_x > span / 2.0 { 0.0 } else { span };
    log::warn!(
        "No x keeps {:.0}px from previous platform at {:.0} within [0, {:.0}]; using {:.0}",
        gap,
        last_x,
        span,
        x
    );
    x
}
