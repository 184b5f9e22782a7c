//! # Motion Configuration
//!
//! Every tuning constant the detectors and analyzers read lives here, grouped
//! per action and exposed as presets. The core never loads files itself:
//! callers construct a config (or deserialize one) and hand it in.
//!
//! ## Usage
//! ```rust
//! use motion_core::config::MotionConfig;
//!
//! let config = MotionConfig::default();
//! let junior = MotionConfig::junior();
//! let from_env = MotionConfig::from_env_or_default();
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Environment Variables
//!
//! - `KIOSK_MOTION_PRESET`: Select preset (junior, pro, default)

mod header_config;
mod kick_config;

pub use header_config::{HeaderClassification, HeaderConfig, HeaderScoring, HeaderThresholds};
pub use kick_config::{KickClassification, KickConfig, KickScoring, KickThresholds};

use crate::error::{MotionError, Result};
use crate::math::Vec3;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::env;
use validator::Validate;

/// Environment variable consulted by [`MotionConfig::from_env_or_default`].
pub const PRESET_ENV_VAR: &str = "KIOSK_MOTION_PRESET";

/// Complete motion core configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct MotionConfig {
    /// Per-joint history buffers
    #[serde(default)]
    pub history: HistoryConfig,
    /// Kick detection and scoring
    #[serde(default)]
    pub kick: KickConfig,
    /// Header detection and scoring
    #[serde(default)]
    pub header: HeaderConfig,
}

impl MotionConfig {
    /// Forgiving thresholds for young or casual players.
    pub fn junior() -> Self {
        Self {
            history: HistoryConfig::default(),
            kick: KickConfig::junior(),
            header: HeaderConfig::junior(),
        }
    }

    /// Stricter thresholds and a higher power reference.
    pub fn pro() -> Self {
        Self {
            history: HistoryConfig::default(),
            kick: KickConfig::pro(),
            header: HeaderConfig::pro(),
        }
    }

    pub fn from_preset(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "" | "default" => Ok(Self::default()),
            "junior" => Ok(Self::junior()),
            "pro" => Ok(Self::pro()),
            other => Err(MotionError::UnknownPreset(other.to_string())),
        }
    }

    /// Load the preset named by `KIOSK_MOTION_PRESET` or use default.
    pub fn from_env_or_default() -> Self {
        let name = env::var(PRESET_ENV_VAR).unwrap_or_default();
        match Self::from_preset(&name) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("{}; falling back to default motion config", err);
                Self::default()
            }
        }
    }

    /// Range checks on every section plus weight-sum checks.
    pub fn validate(&self) -> Result<()> {
        self.history.validate()?;
        self.history.check_min_samples()?;
        self.kick.validate_all()?;
        self.header.validate_all()?;
        Ok(())
    }
}

/// Motion history buffer settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct HistoryConfig {
    /// Samples kept per joint (30 ≈ 1s at 30Hz)
    #[validate(range(min = 2, max = 600))]
    pub capacity: usize,
    /// Minimum confidence for a sample to be accepted (0.5 = Medium)
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_confidence: f32,
    /// Samples required before transition checks run
    #[validate(range(min = 2))]
    pub min_samples: usize,
}

impl HistoryConfig {
    /// A buffer smaller than `min_samples` never has enough data.
    pub fn check_min_samples(&self) -> Result<()> {
        if self.min_samples > self.capacity {
            return Err(MotionError::ConflictingSettings(format!(
                "history min_samples {} exceeds capacity {}",
                self.min_samples, self.capacity
            )));
        }
        Ok(())
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 30, min_confidence: 0.5, min_samples: 3 }
    }
}

/// Dwell times per canonical stage (µs).
///
/// `min_*` gates how early a stage may be left, `*_timeout_us` abandons the
/// action when a stage stalls. `completion_dwell_us` is the terminal dwell
/// after which the action is analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct PhaseTimings {
    pub min_arming_us: u64,
    #[validate(range(min = 1))]
    pub arming_timeout_us: u64,
    pub min_driving_us: u64,
    #[validate(range(min = 1))]
    pub driving_timeout_us: u64,
    pub min_contact_us: u64,
    #[validate(range(min = 1))]
    pub contact_timeout_us: u64,
    pub completion_dwell_us: u64,
}

/// Target the accuracy score measures against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct TargetZone {
    /// Zone centre in sensor space (mm)
    #[schemars(with = "[f32; 3]")]
    pub center: Vec3,
    /// Zone radius (mm)
    #[validate(range(min = 0.0))]
    pub radius_mm: f32,
}

impl Default for TargetZone {
    fn default() -> Self {
        // 3m straight ahead of the sensor origin
        Self { center: Vec3::new(0.0, 0.0, 3000.0), radius_mm: 500.0 }
    }
}

impl TargetZone {
    pub fn new(center: Vec3, radius_mm: f32) -> Self {
        Self { center, radius_mm }
    }

    /// Half-angle (degrees) the zone subtends seen from `origin`.
    pub fn angular_radius_deg(&self, origin: &Vec3) -> f32 {
        let distance = (self.center - origin).norm();
        if distance < crate::math::EPSILON {
            return 90.0;
        }
        (self.radius_mm / distance).atan().to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(MotionConfig::default().validate().is_ok());
        assert!(MotionConfig::junior().validate().is_ok());
        assert!(MotionConfig::pro().validate().is_ok());
    }

    #[test]
    fn test_from_preset_names() {
        assert_eq!(MotionConfig::from_preset("JUNIOR").unwrap(), MotionConfig::junior());
        assert_eq!(MotionConfig::from_preset("").unwrap(), MotionConfig::default());
        let err = MotionConfig::from_preset("arcade").unwrap_err();
        assert!(matches!(err, MotionError::UnknownPreset(ref name) if name == "arcade"));
    }

    #[test]
    fn test_history_range_validation() {
        let mut config = MotionConfig::default();
        config.history.min_confidence = 1.5;
        assert!(matches!(config.validate(), Err(MotionError::InvalidConfig(_))));
    }

    #[test]
    fn test_min_samples_above_capacity_rejected() {
        let mut config = MotionConfig::default();
        config.history.capacity = 2;
        config.history.min_samples = 3;
        assert!(matches!(config.validate(), Err(MotionError::ConflictingSettings(_))));

        config.history.min_samples = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = MotionConfig::default();
        config.kick.timings.arming_timeout_us = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip_keeps_target() {
        let mut config = MotionConfig::default();
        config.kick.target = TargetZone::new(Vec3::new(100.0, 1500.0, 4000.0), 300.0);
        let json = serde_json::to_string(&config).unwrap();
        let back: MotionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let back: MotionConfig =
            serde_json::from_str(r#"{"history":{"capacity":45,"min_confidence":0.5,"min_samples":3}}"#)
                .unwrap();
        assert_eq!(back.history.capacity, 45);
        assert_eq!(back.kick, KickConfig::default());
    }

    #[test]
    fn test_angular_radius() {
        let zone = TargetZone::new(Vec3::new(0.0, 0.0, 1000.0), 1000.0);
        assert!((zone.angular_radius_deg(&Vec3::zeros()) - 45.0).abs() < 0.01);
    }
}
