//! Data-driven game balance
//!
//! All gameplay constants live here, expressed per second so the simulation can
//! integrate with an explicit timestep. Two presets ship with the game; a JSON
//! document can override any subset of the classic values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{per_tick, per_tick_sq};

/// Errors produced while loading or validating a tuning
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be a finite number (got {value})")]
    NotFinite { field: &'static str, value: f32 },
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f32 },
    #[error("tuning overlay must be a JSON object")]
    OverlayNotObject,
    #[error("{min_field} ({min}) must not exceed {max_field} ({max})")]
    InvertedRange {
        min_field: &'static str,
        min: f32,
        max_field: &'static str,
        max: f32,
    },
    #[error("max_jumps must be at least 1")]
    NoJumps,
    #[error("spawn cap must be at least 1")]
    ZeroSpawnCap,
}

/// Built-in balance variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TuningPreset {
    /// Original constants: narrow platforms, always spawns a pair
    #[default]
    Classic,
    /// Wider platforms, longer ramp, spawn count capped by live platforms
    Capped,
}

impl TuningPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            TuningPreset::Classic => "classic",
            TuningPreset::Capped => "capped",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "classic" => Some(TuningPreset::Classic),
            "capped" => Some(TuningPreset::Capped),
            _ => None,
        }
    }

    pub fn tuning(&self) -> Tuning {
        match self {
            TuningPreset::Classic => Tuning::classic(),
            TuningPreset::Capped => Tuning::capped(),
        }
    }
}

/// How many platforms a first touch spawns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnPolicy {
    /// Always spawn two
    Pair,
    /// Spawn two while at most `cap` platforms are live, one afterwards
    Capped { cap: usize },
}

impl SpawnPolicy {
    /// Number of platforms to spawn given the current live count
    pub fn spawn_count(&self, live: usize) -> usize {
        match *self {
            SpawnPolicy::Pair => 2,
            SpawnPolicy::Capped { cap } if live > cap => 1,
            SpawnPolicy::Capped { .. } => 2,
        }
    }
}

/// Fixed placement for an onboarding platform, measured from the
/// bottom-right corner of the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampStep {
    pub from_right: f32,
    pub from_bottom: f32,
}

/// Avatar motion constants (per second)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    pub gravity: f32,
    pub move_speed: f32,
    pub avatar_radius: f32,
    pub max_jumps: u8,
    pub first_jump_impulse: f32,
    pub second_jump_min: f32,
    pub second_jump_max: f32,
    pub scroll_speed: f32,
    /// Flash timer decay (units per second, timer starts at 1.0)
    pub flash_decay: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: per_tick_sq(0.5),
            move_speed: per_tick(5.0),
            avatar_radius: 20.0,
            max_jumps: 2,
            first_jump_impulse: per_tick(13.0),
            second_jump_min: per_tick(7.0),
            second_jump_max: per_tick(16.0),
            scroll_speed: per_tick(10.0),
            flash_decay: per_tick(0.02),
        }
    }
}

/// Platform generator constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformTuning {
    pub min_width: f32,
    pub max_width: f32,
    pub height: f32,
    /// Vertical distance band from the previous platform
    pub min_gap_y: f32,
    pub max_gap_y: f32,
    /// Minimum horizontal distance from the previous platform
    pub min_gap_x: f32,
    /// Randomized x is drawn from `[0, world_width - right_margin)`
    pub right_margin: f32,
    pub ramp: Vec<RampStep>,
    pub spawn: SpawnPolicy,
}

impl Default for PlatformTuning {
    fn default() -> Self {
        Self {
            min_width: 40.0,
            max_width: 100.0,
            height: 10.0,
            min_gap_y: 40.0,
            max_gap_y: 120.0,
            min_gap_x: 67.0,
            right_margin: 300.0,
            ramp: vec![RampStep {
                from_right: 300.0,
                from_bottom: 150.0,
            }],
            spawn: SpawnPolicy::Pair,
        }
    }
}

/// Complete game balance
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub physics: PhysicsTuning,
    pub platforms: PlatformTuning,
}

impl Tuning {
    /// Default balance: two platforms per first touch, one ramp step
    pub fn classic() -> Self {
        Self::default()
    }

    /// Alternate balance with bounded platform growth
    pub fn capped() -> Self {
        Self {
            physics: PhysicsTuning::default(),
            platforms: PlatformTuning {
                min_width: 60.0,
                max_width: 130.0,
                height: 12.0,
                min_gap_y: 50.0,
                max_gap_y: 110.0,
                min_gap_x: 80.0,
                right_margin: 300.0,
                ramp: vec![
                    RampStep {
                        from_right: 300.0,
                        from_bottom: 150.0,
                    },
                    RampStep {
                        from_right: 480.0,
                        from_bottom: 250.0,
                    },
                    RampStep {
                        from_right: 280.0,
                        from_bottom: 350.0,
                    },
                ],
                spawn: SpawnPolicy::Capped { cap: 12 },
            },
        }
    }

    /// Parse a JSON tuning; missing fields fall back to the classic values
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Apply a partial JSON document on top of this tuning.
    ///
    /// Objects merge field by field; any other value (numbers, the ramp list,
    /// the spawn policy) replaces what was there.
    pub fn with_json_overlay(&self, json: &str) -> Result<Self, TuningError> {
        let patch: serde_json::Value = serde_json::from_str(json)?;
        if !patch.is_object() {
            return Err(TuningError::OverlayNotObject);
        }
        let mut merged = serde_json::to_value(self)?;
        merge_json(&mut merged, patch);
        let tuning: Tuning = serde_json::from_value(merged)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject tunings the simulation cannot run sensibly
    pub fn validate(&self) -> Result<(), TuningError> {
        let p = &self.physics;
        positive("gravity", p.gravity)?;
        positive("move_speed", p.move_speed)?;
        positive("avatar_radius", p.avatar_radius)?;
        positive("first_jump_impulse", p.first_jump_impulse)?;
        non_negative("second_jump_min", p.second_jump_min)?;
        positive("second_jump_max", p.second_jump_max)?;
        non_negative("scroll_speed", p.scroll_speed)?;
        positive("flash_decay", p.flash_decay)?;
        if p.max_jumps == 0 {
            return Err(TuningError::NoJumps);
        }
        ordered(
            "second_jump_min",
            p.second_jump_min,
            "second_jump_max",
            p.second_jump_max,
        )?;

        let pl = &self.platforms;
        positive("min_width", pl.min_width)?;
        positive("max_width", pl.max_width)?;
        positive("height", pl.height)?;
        non_negative("min_gap_y", pl.min_gap_y)?;
        positive("max_gap_y", pl.max_gap_y)?;
        non_negative("min_gap_x", pl.min_gap_x)?;
        non_negative("right_margin", pl.right_margin)?;
        ordered("min_width", pl.min_width, "max_width", pl.max_width)?;
        ordered("min_gap_y", pl.min_gap_y, "max_gap_y", pl.max_gap_y)?;
        for step in &pl.ramp {
            finite("ramp.from_right", step.from_right)?;
            finite("ramp.from_bottom", step.from_bottom)?;
        }
        if let SpawnPolicy::Capped { cap: 0 } = pl.spawn {
            return Err(TuningError::ZeroSpawnCap);
        }
        Ok(())
    }
}

fn merge_json(base: &mut serde_json::Value, patch: serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(base), serde_json::Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

// serde_json reads out-of-range numbers such as 1e39 as infinity
fn finite(field: &'static str, value: f32) -> Result<(), TuningError> {
    if !value.is_finite() {
        return Err(TuningError::NotFinite { field, value });
    }
    Ok(())
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(TuningError::NotPositive { field, value });
    }
    Ok(())
}

fn non_negative(field: &'static str, value: f32) -> Result<(), TuningError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(TuningError::Negative { field, value });
    }
    Ok(())
}

fn ordered(
    min_field: &'static str,
    min: f32,
    max_field: &'static str,
    max: f32,
) -> Result<(), TuningError> {
    finite(min_field, min)?;
    finite(max_field, max)?;
    if min > max {
        return Err(TuningError::InvertedRange {
            min_field,
            min,
            max_field,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(Tuning::classic().validate().is_ok());
        assert!(Tuning::capped().validate().is_ok());
    }

    #[test]
    fn test_classic_matches_reference_tick_constants() {
        let t = Tuning::classic();
        // 0.5 px/tick² and 13 px/tick at 60 Hz
        assert!((t.physics.gravity - 1800.0).abs() < 1e-3);
        assert!((t.physics.first_jump_impulse - 780.0).abs() < 1e-3);
        assert!((t.physics.flash_decay - 1.2).abs() < 1e-4);
        assert_eq!(t.platforms.spawn, SpawnPolicy::Pair);
        assert_eq!(t.platforms.ramp.len(), 1);
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!(TuningPreset::from_str("Capped"), Some(TuningPreset::Capped));
        assert_eq!(TuningPreset::from_str(" classic "), Some(TuningPreset::Classic));
        assert_eq!(TuningPreset::from_str("hard"), None);
        assert_eq!(TuningPreset::Capped.tuning(), Tuning::capped());
    }

    #[test]
    fn test_spawn_policy_counts() {
        assert_eq!(SpawnPolicy::Pair.spawn_count(100), 2);
        let capped = SpawnPolicy::Capped { cap: 4 };
        assert_eq!(capped.spawn_count(4), 2);
        assert_eq!(capped.spawn_count(5), 1);
    }

    #[test]
    fn test_partial_json_overlays_classic() {
        let t = Tuning::from_json(r#"{ "platforms": { "min_gap_x": 90.0 } }"#).unwrap();
        assert_eq!(t.platforms.min_gap_x, 90.0);
        assert_eq!(t.platforms.max_width, 100.0);
        assert_eq!(t.physics, PhysicsTuning::default());
    }

    #[test]
    fn test_json_spawn_policy() {
        let t = Tuning::from_json(r#"{ "platforms": { "spawn": { "Capped": { "cap": 3 } } } }"#)
            .unwrap();
        assert_eq!(t.platforms.spawn, SpawnPolicy::Capped { cap: 3 });
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(TuningError::Json(_))
        ));
    }

    #[test]
    fn test_inverted_width_rejected() {
        let err = Tuning::from_json(r#"{ "platforms": { "min_width": 120.0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::InvertedRange {
                min_field: "min_width",
                ..
            }
        ));
    }

    #[test]
    fn test_degenerate_values_rejected() {
        let mut t = Tuning::classic();
        t.physics.max_jumps = 0;
        assert!(matches!(t.validate(), Err(TuningError::NoJumps)));

        let mut t = Tuning::classic();
        t.physics.gravity = f32::NAN;
        assert!(matches!(
            t.validate(),
            Err(TuningError::NotFinite { field: "gravity", .. })
        ));

        let mut t = Tuning::classic();
        t.platforms.min_gap_x = -1.0;
        assert!(matches!(
            t.validate(),
            Err(TuningError::Negative { field: "min_gap_x", .. })
        ));

        let mut t = Tuning::classic();
        t.platforms.spawn = SpawnPolicy::Capped { cap: 0 };
        assert!(matches!(t.validate(), Err(TuningError::ZeroSpawnCap)));
    }

    #[test]
    fn test_overflowing_number_rejected() {
        // 1e39 does not fit in f32 and parses as infinity
        let err = Tuning::from_json(r#"{ "platforms": { "max_width": 1e39 } }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::NotFinite {
                field: "max_width",
                ..
            }
        ));

        let err = Tuning::from_json(r#"{ "physics": { "scroll_speed": 1e39 } }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::NotFinite {
                field: "scroll_speed",
                ..
            }
        ));
    }

    #[test]
    fn test_validated_tuning_runs_without_panic() {
        use crate::sim::{GameState, TickInput, tick};

        let t = Tuning::from_json(r#"{ "platforms": { "max_width": 3.0e38 } }"#).unwrap();
        let mut state = GameState::new(1, 1280.0, 800.0, t);
        let jump = TickInput {
            jump: true,
            ..Default::default()
        };
        for _ in 0..120 {
            tick(&mut state, &jump, crate::consts::SIM_DT);
        }
        assert!(!state.platforms.is_empty());
    }

    #[test]
    fn test_overlay_keeps_preset_values() {
        let t = Tuning::capped()
            .with_json_overlay(r#"{ "physics": { "max_jumps": 3 }, "platforms": { "height": 8.0 } }"#)
            .unwrap();
        assert_eq!(t.physics.max_jumps, 3);
        assert_eq!(t.platforms.height, 8.0);
        // Untouched capped values survive
        assert_eq!(t.platforms.min_width, 60.0);
        assert_eq!(t.platforms.ramp.len(), 3);
        assert_eq!(t.platforms.spawn, SpawnPolicy::Capped { cap: 12 });
    }

    #[test]
    fn test_overlay_rejects_bad_documents() {
        let base = Tuning::classic();
        assert!(matches!(
            base.with_json_overlay("[1, 2]"),
            Err(TuningError::OverlayNotObject)
        ));
        assert!(matches!(
            base.with_json_overlay(r#"{ "physics": { "gravity": -5.0 } }"#),
            Err(TuningError::NotPositive { field: "gravity", .. })
        ));
    }
}
