//! Action profiles
//!
//! The phase engine knows five canonical stages. A profile decides which
//! joints drive them, what motion moves the engine from one stage to the
//! next, and how a finished action is scored.
//!
//! ```text
//! Idle → Arming → Driving → Contact → Completing → (analyze) → Idle
//!          kick:  WindUp    Acceleration  Contact   FollowThrough
//!          header: Setup    Preparation   Contact   Recovery
//! ```

use super::history::{JointHistories, MotionHistory};
use crate::config::PhaseTimings;
use crate::math::{normalize_or_zero, Vec3};
use crate::skeleton::{JointId, Skeleton};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Canonical engine stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    Idle,
    Arming,
    Driving,
    Contact,
    Completing,
}

/// Limb performing the action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominantLimb {
    Left,
    Right,
    #[default]
    Unknown,
}

impl DominantLimb {
    pub fn is_known(self) -> bool {
        self != DominantLimb::Unknown
    }

    /// Picks the clearly faster side; keeps `current` when neither side is
    /// `ratio` times faster than the other.
    pub fn from_speeds(left: f32, right: f32, ratio: f32, current: DominantLimb) -> DominantLimb {
        if left > right * ratio {
            DominantLimb::Left
        } else if right > left * ratio {
            DominantLimb::Right
        } else {
            current
        }
    }
}

/// What the engine observed while the action was in flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionTrace {
    /// Highest motion-joint speed from Driving entry on (m/s)
    pub peak_speed: f32,
    /// Averaged velocity at Contact entry (m/s)
    pub contact_velocity: Vec3,
    /// Unit direction at Contact entry; zero if the joint was still
    pub direction: Vec3,
    /// Motion-joint position at Contact entry (mm)
    pub contact_position: Vec3,
}

impl Default for ActionTrace {
    fn default() -> Self {
        Self {
            peak_speed: 0.0,
            contact_velocity: Vec3::zeros(),
            direction: Vec3::zeros(),
            contact_position: Vec3::zeros(),
        }
    }
}

impl ActionTrace {
    /// Trace read straight off a history, for analysis without a detector.
    pub fn from_history(history: &MotionHistory, direction_frames: usize) -> Self {
        let contact_velocity = history.average_velocity(direction_frames);
        Self {
            peak_speed: history.peak_speed(),
            contact_velocity,
            direction: normalize_or_zero(&contact_velocity),
            contact_position: history.latest().map(|s| s.position).unwrap_or_else(Vec3::zeros),
        }
    }

    /// Freezes direction and position at Contact entry, keeping the peak.
    pub(crate) fn capture_contact(&mut self, history: &MotionHistory, direction_frames: usize) {
        let snapshot = Self::from_history(history, direction_frames);
        self.contact_velocity = snapshot.contact_velocity;
        self.direction = snapshot.direction;
        self.contact_position = snapshot.contact_position;
    }
}

/// Everything an analyzer may look at.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInput<'a> {
    pub skeleton: &'a Skeleton,
    pub histories: &'a JointHistories,
    pub limb: DominantLimb,
    pub timestamp_us: u64,
    pub trace: ActionTrace,
}

/// Strategy plugged into [`super::detector::PhaseDetector`].
pub trait ActionProfile {
    /// Action-specific phase names
    type Phase: Copy + Eq + Debug;
    /// Analyzer result
    type Output: Copy + Debug;

    /// Log label
    const NAME: &'static str;

    fn phase(stage: Stage) -> Self::Phase;

    /// Joints the detector keeps histories for.
    fn tracked_joints(&self) -> &'static [JointId];

    fn timings(&self) -> &PhaseTimings;

    /// Samples averaged for the frozen contact direction.
    fn direction_frames(&self) -> usize;

    /// Transitions are skipped while no limb is known.
    fn requires_limb(&self) -> bool {
        false
    }

    /// Candidate limb for this frame.
    fn select_limb(&self, _histories: &JointHistories, current: DominantLimb) -> DominantLimb {
        current
    }

    /// Frames a new limb must win before it replaces the current one.
    fn limb_switch_hold_frames(&self) -> u32 {
        0
    }

    /// Joint watched while Idle.
    fn trigger_joint(&self, limb: DominantLimb) -> JointId;

    /// Joint watched from Arming on.
    fn motion_joint(&self, limb: DominantLimb) -> JointId;

    /// Idle → Arming
    fn should_arm(&self, trigger: &MotionHistory) -> bool;

    /// Arming → Driving
    fn should_drive(&self, motion: &MotionHistory) -> bool;

    /// Driving → Contact
    fn should_contact(&self, motion: &MotionHistory) -> bool;

    /// Contact → Completing
    fn should_complete(&self, motion: &MotionHistory) -> bool;

    fn analyze(&self, input: &AnalysisInput<'_>) -> Self::Output;
}
