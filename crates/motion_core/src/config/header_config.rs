//! Header detection thresholds, timings and scoring references.

use super::{PhaseTimings, TargetZone};
use crate::error::Result;
use crate::motion::scoring::ScoreWeights;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HeaderConfig {
    pub thresholds: HeaderThresholds,
    pub timings: PhaseTimings,
    pub classification: HeaderClassification,
    pub scoring: HeaderScoring,
    pub target: TargetZone,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            thresholds: HeaderThresholds::default(),
            timings: PhaseTimings {
                min_arming_us: 50_000,
                arming_timeout_us: 2_000_000,
                min_driving_us: 150_000, // 0.15s preparation
                driving_timeout_us: 2_000_000,
                min_contact_us: 50_000,
                contact_timeout_us: 2_000_000,
                completion_dwell_us: 300_000, // 0.3s recovery
            },
            classification: HeaderClassification::default(),
            scoring: HeaderScoring::default(),
            target: TargetZone::default(),
        }
    }
}

impl HeaderConfig {
    pub fn junior() -> Self {
        let mut cfg = Self::default();
        cfg.thresholds.min_head_speed = 0.8;
        cfg.thresholds.power_header_speed = 2.0;
        cfg.scoring.reference_head_speed = 3.0;
        cfg.scoring.accuracy_cutoff_deg = 40.0;
        cfg.timings.arming_timeout_us = 3_000_000;
        cfg
    }

    pub fn pro() -> Self {
        let mut cfg = Self::default();
        cfg.thresholds.min_head_speed = 1.2;
        cfg.thresholds.power_header_speed = 3.0;
        cfg.scoring.reference_head_speed = 5.0;
        cfg.scoring.accuracy_cutoff_deg = 20.0;
        cfg
    }

    pub(crate) fn validate_all(&self) -> Result<()> {
        self.thresholds.validate()?;
        self.timings.validate()?;
        self.classification.validate()?;
        self.scoring.validate()?;
        self.target.validate()?;
        self.scoring.weights.check("header overall")?;
        Ok(())
    }
}

/// Head velocity thresholds (m/s)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct HeaderThresholds {
    /// Head speed that leaves Idle
    #[validate(range(min = 0.0))]
    pub setup_speed: f32,
    #[validate(range(min = 0.0))]
    pub min_head_speed: f32,
    /// Contact speed that classifies a downward header as Power
    #[validate(range(min = 0.0))]
    pub power_header_speed: f32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub contact_decel_ratio: f32,
    /// Recovery starts below this fraction of `min_head_speed`
    #[validate(range(min = 0.0, max = 1.0))]
    pub recovery_speed_fraction: f32,
    #[validate(range(min = 1))]
    pub direction_frames: usize,
}

impl Default for HeaderThresholds {
    fn default() -> Self {
        Self {
            setup_speed: 0.5,
            min_head_speed: 1.0,
            power_header_speed: 2.5,
            contact_decel_ratio: 0.6,
            recovery_speed_fraction: 0.5,
            direction_frames: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct HeaderClassification {
    /// Body lean past this (deg from vertical) is a diving header
    #[validate(range(min = 0.0, max = 90.0))]
    pub diving_lean_deg: f32,
}

impl Default for HeaderClassification {
    fn default() -> Self {
        Self { diving_lean_deg: 45.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct HeaderScoring {
    pub weights: ScoreWeights,
    /// Peak head speed scoring 100 (m/s)
    #[validate(range(min = 0.1))]
    pub reference_head_speed: f32,
    /// Timing score when the peak clears `timing_speed_factor × min_head_speed`
    #[validate(range(min = 0.0, max = 100.0))]
    pub timing_good: f32,
    #[validate(range(min = 0.0, max = 100.0))]
    pub timing_base: f32,
    #[validate(range(min = 1.0))]
    pub timing_speed_factor: f32,
    #[validate(range(min = 1.0, max = 180.0))]
    pub accuracy_cutoff_deg: f32,
}

impl Default for HeaderScoring {
    fn default() -> Self {
        Self {
            // accuracy is reported but carries no weight
            weights: ScoreWeights::new(0.4, 0.0, 0.3, 0.3),
            reference_head_speed: 4.0,
            timing_good: 80.0,
            timing_base: 60.0,
            timing_speed_factor: 1.5,
            accuracy_cutoff_deg: 30.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(HeaderConfig::default().validate_all().is_ok());
        assert!(HeaderConfig::junior().validate_all().is_ok());
        assert!(HeaderConfig::pro().validate_all().is_ok());
    }

    #[test]
    fn test_zero_accuracy_weight_allowed() {
        let cfg = HeaderConfig::default();
        assert_eq!(cfg.scoring.weights.accuracy, 0.0);
        assert!(cfg.scoring.weights.validate().is_ok());
    }

    #[test]
    fn test_recovery_fraction_range() {
        let mut cfg = HeaderConfig::default();
        cfg.thresholds.recovery_speed_fraction = -0.1;
        assert!(cfg.validate_all().is_err());
    }
}
