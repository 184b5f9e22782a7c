//! Kick detection thresholds, timings and scoring references.

use super::{PhaseTimings, TargetZone};
use crate::error::{MotionError, Result};
use crate::motion::scoring::{ScoreWeights, TechniqueWeights};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KickConfig {
    pub thresholds: KickThresholds,
    pub timings: PhaseTimings,
    pub classification: KickClassification,
    pub scoring: KickScoring,
    pub target: TargetZone,
}

impl Default for KickConfig {
    fn default() -> Self {
        Self {
            thresholds: KickThresholds::default(),
            timings: PhaseTimings {
                min_arming_us: 200_000,      // 0.2s wind-up
                arming_timeout_us: 2_000_000, // 2s
                min_driving_us: 100_000,     // 0.1s acceleration
                driving_timeout_us: 2_000_000,
                min_contact_us: 0,
                contact_timeout_us: 2_000_000,
                completion_dwell_us: 300_000, // 0.3s follow-through
            },
            classification: KickClassification::default(),
            scoring: KickScoring::default(),
            target: TargetZone::default(),
        }
    }
}

impl KickConfig {
    pub fn junior() -> Self {
        let mut cfg = Self::default();
        cfg.thresholds.windup_speed = 0.4;
        cfg.thresholds.acceleration_speed = 1.5;
        cfg.classification.instep_min_speed = 1.5;
        cfg.classification.toe_min_speed = 3.0;
        cfg.scoring.max_ball_speed_kmh = 80.0;
        cfg.scoring.accuracy_cutoff_deg = 40.0;
        cfg.timings.arming_timeout_us = 3_000_000;
        cfg
    }

    pub fn pro() -> Self {
        let mut cfg = Self::default();
        cfg.thresholds.acceleration_speed = 2.5;
        cfg.classification.instep_min_speed = 2.5;
        cfg.scoring.max_ball_speed_kmh = 130.0;
        cfg.scoring.accuracy_cutoff_deg = 20.0;
        cfg.scoring.max_lean_deviation_deg = 35.0;
        cfg
    }

    pub(crate) fn validate_all(&self) -> Result<()> {
        self.thresholds.validate()?;
        self.timings.validate()?;
        self.classification.validate()?;
        self.scoring.validate()?;
        self.target.validate()?;
        self.scoring.weights.check("kick overall")?;
        self.scoring.technique_weights.check("kick technique")?;
        // every completed kick peaks above the acceleration speed
        if self.classification.instep_min_speed > self.thresholds.acceleration_speed {
            return Err(MotionError::ConflictingSettings(format!(
                "kick instep_min_speed {} exceeds acceleration_speed {}",
                self.classification.instep_min_speed, self.thresholds.acceleration_speed
            )));
        }
        Ok(())
    }
}

/// Velocity thresholds (m/s) and ratios for the kick state machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct KickThresholds {
    /// Backward ankle speed that starts a wind-up
    #[validate(range(min = 0.0))]
    pub windup_speed: f32,
    /// Forward foot speed that starts the acceleration phase
    #[validate(range(min = 0.0))]
    pub acceleration_speed: f32,
    /// Contact when speed falls below this fraction of the previous sample
    #[validate(range(min = 0.0, max = 1.0))]
    pub contact_decel_ratio: f32,
    /// One foot must be this much faster to become the kicking foot
    #[validate(range(min = 1.0))]
    pub limb_ratio: f32,
    /// Consecutive frames a new kicking foot must win before switching (0 = switch immediately)
    pub limb_switch_hold_frames: u32,
    /// Samples averaged for the contact direction
    #[validate(range(min = 1))]
    pub direction_frames: usize,
}

impl Default for KickThresholds {
    fn default() -> Self {
        Self {
            windup_speed: 0.5,
            acceleration_speed: 2.0,
            contact_decel_ratio: 0.7,
            limb_ratio: 1.5,
            limb_switch_hold_frames: 0,
            direction_frames: 3,
        }
    }
}

/// Decision tree cut points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct KickClassification {
    /// Knee straighter than this counts as a locked leg (deg)
    #[validate(range(min = 0.0, max = 180.0))]
    pub instep_min_knee_deg: f32,
    /// Peak foot speed for an instep strike (m/s), at most the acceleration speed
    #[validate(range(min = 0.0))]
    pub instep_min_speed: f32,
    /// Knee more bent than this is a side-foot pass (deg)
    #[validate(range(min = 0.0, max = 180.0))]
    pub side_foot_max_knee_deg: f32,
    /// Peak foot speed for a toe poke (m/s)
    #[validate(range(min = 0.0))]
    pub toe_min_speed: f32,
    /// Toe poke needs a knee more bent than this (deg)
    #[validate(range(min = 0.0, max = 180.0))]
    pub toe_max_knee_deg: f32,
}

impl Default for KickClassification {
    fn default() -> Self {
        Self {
            instep_min_knee_deg: 160.0,
            instep_min_speed: 2.0,
            side_foot_max_knee_deg: 120.0,
            toe_min_speed: 4.0,
            toe_max_knee_deg: 140.0,
        }
    }
}

/// Reference values for the four quality axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct KickScoring {
    /// Overall = weighted sum of the axis scores
    pub weights: ScoreWeights,
    /// Knee / hip / follow-through blend of the technique score
    pub technique_weights: TechniqueWeights,
    /// Ball speed ≈ foot speed × this
    #[validate(range(min = 0.0))]
    pub ball_speed_factor: f32,
    /// Ball speed scoring 100 (km/h, professional level)
    #[validate(range(min = 1.0))]
    pub max_ball_speed_kmh: f32,
    /// Direction error scoring 0 (deg)
    #[validate(range(min = 1.0, max = 180.0))]
    pub accuracy_cutoff_deg: f32,
    #[validate(range(min = 1.0, max = 180.0))]
    pub ideal_knee_deg: f32,
    /// Hip rotation scoring 100 (deg)
    #[validate(range(min = 1.0, max = 180.0))]
    pub max_hip_rotation_deg: f32,
    /// Follow-through path scoring 100 (m)
    #[validate(range(min = 0.01))]
    pub full_follow_through_m: f32,
    /// Frame-to-frame segments summed for the follow-through path
    #[validate(range(min = 1))]
    pub follow_through_segments: usize,
    /// Ideal forward torso lean (deg)
    #[validate(range(min = 0.0, max = 90.0))]
    pub ideal_lean_deg: f32,
    /// Lean deviation scoring 0 (deg)
    #[validate(range(min = 1.0, max = 180.0))]
    pub max_lean_deviation_deg: f32,
}

impl Default for KickScoring {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::new(0.30, 0.25, 0.25, 0.20),
            technique_weights: TechniqueWeights::default(),
            ball_speed_factor: 1.25,
            max_ball_speed_kmh: 120.0,
            accuracy_cutoff_deg: 30.0,
            ideal_knee_deg: 135.0,
            max_hip_rotation_deg: 90.0,
            full_follow_through_m: 1.0,
            follow_through_segments: 10,
            ideal_lean_deg: 10.0,
            max_lean_deviation_deg: 45.0,
        }
    }
}
