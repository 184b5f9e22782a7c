//! Skeleton snapshot types
//!
//! One `Skeleton` is what the body tracker hands over per tracked person per
//! frame. Joint layout follows the Azure Kinect body tracking model (32 joints).
//!
//! Coordinate convention: millimetres, +Y up, +Z forward (toward the target),
//! X lateral.

use crate::math::Vec3;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Number of joints in a skeleton snapshot.
pub const JOINT_COUNT: usize = 32;

/// Tracked joints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JointId {
    Pelvis,
    SpineNavel,
    SpineChest,
    Neck,
    ClavicleLeft,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    HandtipLeft,
    ThumbLeft,
    ClavicleRight,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HandtipRight,
    ThumbRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
    Head,
    Nose,
    EyeLeft,
    EarLeft,
    EyeRight,
    EarRight,
}

impl JointId {
    /// All joints in tracker index order.
    pub const ALL: [JointId; JOINT_COUNT] = [
        JointId::Pelvis,
        JointId::SpineNavel,
        JointId::SpineChest,
        JointId::Neck,
        JointId::ClavicleLeft,
        JointId::ShoulderLeft,
        JointId::ElbowLeft,
        JointId::WristLeft,
        JointId::HandLeft,
        JointId::HandtipLeft,
        JointId::ThumbLeft,
        JointId::ClavicleRight,
        JointId::ShoulderRight,
        JointId::ElbowRight,
        JointId::WristRight,
        JointId::HandRight,
        JointId::HandtipRight,
        JointId::ThumbRight,
        JointId::HipLeft,
        JointId::KneeLeft,
        JointId::AnkleLeft,
        JointId::FootLeft,
        JointId::HipRight,
        JointId::KneeRight,
        JointId::AnkleRight,
        JointId::FootRight,
        JointId::Head,
        JointId::Nose,
        JointId::EyeLeft,
        JointId::EarLeft,
        JointId::EyeRight,
        JointId::EarRight,
    ];

    /// Tracker index (0..32)
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<JointId> {
        Self::ALL.get(index).copied()
    }
}

/// Sensor-reported tracking quality of one joint in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Joint out of view
    #[default]
    None,
    /// Predicted / occluded
    Low,
    /// Tracked
    Medium,
    /// High fidelity
    High,
}

impl Confidence {
    /// Numeric weight used for gating (Medium = 0.5).
    pub fn as_f32(self) -> f32 {
        match self {
            Confidence::None => 0.0,
            Confidence::Low => 0.25,
            Confidence::Medium => 0.5,
            Confidence::High => 1.0,
        }
    }

    /// Maps the tracker's integer level (0..=3); anything above 3 counts as High.
    pub fn from_level(level: u8) -> Confidence {
        match level {
            0 => Confidence::None,
            1 => Confidence::Low,
            2 => Confidence::Medium,
            _ => Confidence::High,
        }
    }
}

impl From<Confidence> for f32 {
    fn from(c: Confidence) -> f32 {
        c.as_f32()
    }
}

/// One joint in one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointReading {
    /// Position (mm)
    pub position: Vec3,
    pub confidence: Confidence,
}

impl Default for JointReading {
    fn default() -> Self {
        Self { position: Vec3::zeros(), confidence: Confidence::None }
    }
}

/// Full-body snapshot for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    /// Monotonic capture time (µs)
    pub timestamp_us: u64,
    pub joints: [JointReading; JOINT_COUNT],
}

impl Skeleton {
    /// Empty skeleton: every joint at the origin with no confidence.
    pub fn new(timestamp_us: u64) -> Self {
        Self { timestamp_us, joints: [JointReading::default(); JOINT_COUNT] }
    }

    #[inline]
    pub fn joint(&self, id: JointId) -> &JointReading {
        &self.joints[id.index()]
    }

    #[inline]
    pub fn position(&self, id: JointId) -> Vec3 {
        self.joints[id.index()].position
    }

    pub fn set_joint(&mut self, id: JointId, position: Vec3, confidence: Confidence) {
        self.joints[id.index()] = JointReading { position, confidence };
    }

    /// Builder form of [`Skeleton::set_joint`].
    pub fn with_joint(mut self, id: JointId, position: Vec3, confidence: Confidence) -> Self {
        self.set_joint(id, position, confidence);
        self
    }

    /// Moves every joint by `offset` (mm), keeping confidences.
    pub fn translated(&self, offset: Vec3) -> Self {
        let mut out = self.clone();
        for joint in out.joints.iter_mut() {
            joint.position += offset;
        }
        out
    }

    /// Number of joints at or above `min` confidence.
    pub fn tracked_count(&self, min: Confidence) -> usize {
        self.joints.iter().filter(|j| j.confidence >= min).count()
    }
}
