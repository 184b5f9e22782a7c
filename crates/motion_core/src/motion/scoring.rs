//! Quality scoring model
//!
//! Every analyzer reduces an action to four 0~100 axis scores and blends them
//! with a weight set that must sum to 1.0.

use crate::error::{MotionError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tolerance on weight sums.
pub const WEIGHT_SUM_TOLERANCE: f32 = 1e-3;

/// Per-axis scores (0~100 each)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisScores {
    pub power: f32,
    pub accuracy: f32,
    pub technique: f32,
    pub balance: f32,
}

impl AxisScores {
    pub fn new(power: f32, accuracy: f32, technique: f32, balance: f32) -> Self {
        Self {
            power: clamp_score(power),
            accuracy: clamp_score(accuracy),
            technique: clamp_score(technique),
            balance: clamp_score(balance),
        }
    }

    /// Weighted sum, clamped to 0~100.
    pub fn overall(&self, weights: &ScoreWeights) -> f32 {
        clamp_score(
            self.power * weights.power
                + self.accuracy * weights.accuracy
                + self.technique * weights.technique
                + self.balance * weights.balance,
        )
    }
}

/// Blend of the four axes into the overall score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreWeights {
    pub power: f32,
    pub accuracy: f32,
    pub technique: f32,
    pub balance: f32,
}

impl ScoreWeights {
    pub const fn new(power: f32, accuracy: f32, technique: f32, balance: f32) -> Self {
        Self { power, accuracy, technique, balance }
    }

    pub fn sum(&self) -> f32 {
        self.power + self.accuracy + self.technique + self.balance
    }

    pub fn validate(&self) -> Result<()> {
        self.check("score")
    }

    /// Like [`ScoreWeights::validate`], naming the weight set in the error.
    pub fn check(&self, name: &'static str) -> Result<()> {
        check_weights(name, &[self.power, self.accuracy, self.technique, self.balance])
    }
}

/// Sub-weights of the kick technique score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TechniqueWeights {
    pub knee: f32,
    pub hip: f32,
    pub follow_through: f32,
}

impl Default for TechniqueWeights {
    fn default() -> Self {
        Self { knee: 0.4, hip: 0.3, follow_through: 0.3 }
    }
}

impl TechniqueWeights {
    pub fn check(&self, name: &'static str) -> Result<()> {
        check_weights(name, &[self.knee, self.hip, self.follow_through])
    }

    pub fn blend(&self, knee: f32, hip: f32, follow_through: f32) -> f32 {
        clamp_score(knee * self.knee + hip * self.hip + follow_through * self.follow_through)
    }
}

fn check_weights(name: &'static str, weights: &[f32]) -> Result<()> {
    if let Some(&value) = weights.iter().find(|w| **w < 0.0 || w.is_nan()) {
        return Err(MotionError::NegativeWeight { name, value });
    }
    let sum: f32 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(MotionError::InvalidWeights { name, sum });
    }
    Ok(())
}

#[inline]
pub fn clamp_score(score: f32) -> f32 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 100.0)
}

/// 100 at zero deviation, 0 at `cutoff` and beyond.
pub fn linear_falloff(deviation: f32, cutoff: f32) -> f32 {
    if cutoff <= 0.0 {
        return 0.0;
    }
    clamp_score(100.0 - deviation.abs() / cutoff * 100.0)
}

/// `value / reference` as a percentage, clamped.
pub fn ratio_score(value: f32, reference: f32) -> f32 {
    if reference <= 0.0 {
        return 0.0;
    }
    clamp_score(value / reference * 100.0)
}
