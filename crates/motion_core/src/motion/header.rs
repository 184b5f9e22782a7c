//! Header detection and analysis
//!
//! `Setup → Preparation → Contact → Recovery` on the head joint alone. No
//! dominant limb: the head is always the striking surface.

use super::detector::PhaseDetector;
use super::history::MotionHistory;
use super::profile::{ActionProfile, AnalysisInput, DominantLimb, Stage};
use super::scoring::{linear_falloff, ratio_score, AxisScores};
use crate::config::{HeaderConfig, HistoryConfig, PhaseTimings};
use crate::math::{angle_between_deg, dot, normalize_or_zero, up, Vec3};
use crate::skeleton::{JointId, Skeleton};
use serde::{Deserialize, Serialize};

pub type HeaderDetector = PhaseDetector<HeaderProfile>;

/// Header phase (FSM state)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderPhase {
    Idle,
    /// Head starts moving
    Setup,
    /// Head driving toward the ball
    Preparation,
    Contact,
    Recovery,
}

impl HeaderPhase {
    pub fn name(self) -> &'static str {
        match self {
            HeaderPhase::Idle => "Idle",
            HeaderPhase::Setup => "Setup",
            HeaderPhase::Preparation => "Preparation",
            HeaderPhase::Contact => "Contact",
            HeaderPhase::Recovery => "Recovery",
        }
    }
}

impl From<Stage> for HeaderPhase {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Idle => HeaderPhase::Idle,
            Stage::Arming => HeaderPhase::Setup,
            Stage::Driving => HeaderPhase::Preparation,
            Stage::Contact => HeaderPhase::Contact,
            Stage::Completing => HeaderPhase::Recovery,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderType {
    /// Driven downward at speed
    Power,
    /// Body nearly horizontal
    Diving,
    /// Glancing, sideways redirect
    FlickOn,
    /// Upward clearance
    DefensiveClear,
}

impl HeaderType {
    pub fn name(self) -> &'static str {
        match self {
            HeaderType::Power => "Power Header",
            HeaderType::Diving => "Diving Header",
            HeaderType::FlickOn => "Flick-On",
            HeaderType::DefensiveClear => "Defensive Clear",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeaderQuality {
    pub power: f32,
    pub accuracy: f32,
    /// Timing score
    pub technique: f32,
    /// Body alignment score
    pub balance: f32,
    pub overall: f32,

    /// Peak head speed (m/s)
    pub head_speed: f32,
    /// Angle between neck→head and chest→neck (deg)
    pub neck_angle_deg: f32,
    /// Pelvis→head lean from vertical (deg)
    pub body_lean_deg: f32,
    pub direction_error_deg: f32,
    pub on_target: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeaderResult {
    pub header_type: HeaderType,
    pub quality: HeaderQuality,
    pub direction: Vec3,
    pub timestamp_us: u64,
    pub is_valid: bool,
}

impl HeaderResult {
    pub fn axis_scores(&self) -> AxisScores {
        AxisScores::new(
            self.quality.power,
            self.quality.accuracy,
            self.quality.technique,
            self.quality.balance,
        )
    }
}

/// Stateless header scorer
#[derive(Debug, Clone, Default)]
pub struct HeaderAnalyzer {
    config: HeaderConfig,
}

impl HeaderAnalyzer {
    pub fn new(config: HeaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HeaderConfig {
        &self.config
    }

    pub fn analyze(&self, input: &AnalysisInput<'_>) -> HeaderResult {
        let scoring = &self.config.scoring;
        let skeleton = input.skeleton;
        let head_history = input.histories.get(JointId::Head);

        let peak = input
            .trace
            .peak_speed
            .max(head_history.map(MotionHistory::peak_speed).unwrap_or(0.0));

        let mut velocity = input.trace.contact_velocity;
        if velocity.norm() < crate::math::EPSILON {
            velocity = head_history.map(MotionHistory::current_velocity).unwrap_or_else(Vec3::zeros);
        }

        let lean = Self::body_lean(skeleton);
        let header_type = self.classify(lean, &velocity);

        let power = ratio_score(peak, scoring.reference_head_speed);

        let to_target = self.config.target.center - input.trace.contact_position;
        let direction_error = angle_between_deg(&input.trace.direction, &to_target);
        let accuracy = linear_falloff(direction_error, scoring.accuracy_cutoff_deg);
        let on_target = input.trace.direction.norm() > crate::math::EPSILON
            && direction_error <= self.config.target.angular_radius_deg(&input.trace.contact_position);

        let technique = self.timing_score(peak);
        let balance = Self::body_alignment(skeleton, &input.trace.direction);

        let axes = AxisScores::new(power, accuracy, technique, balance);
        let quality = HeaderQuality {
            power: axes.power,
            accuracy: axes.accuracy,
            technique: axes.technique,
            balance: axes.balance,
            overall: axes.overall(&scoring.weights),
            head_speed: peak,
            neck_angle_deg: Self::neck_angle(skeleton),
            body_lean_deg: lean,
            direction_error_deg: direction_error,
            on_target,
        };

        HeaderResult {
            header_type,
            quality,
            direction: input.trace.direction,
            timestamp_us: input.timestamp_us,
            is_valid: peak > 0.0,
        }
    }

    /// Lean first, then the contact velocity; Power when nothing matches.
    pub fn classify(&self, body_lean_deg: f32, velocity: &Vec3) -> HeaderType {
        if body_lean_deg > self.config.classification.diving_lean_deg {
            HeaderType::Diving
        } else if velocity.norm() > self.config.thresholds.power_header_speed && velocity.y < 0.0 {
            HeaderType::Power
        } else if velocity.x.abs() > velocity.z.abs() {
            HeaderType::FlickOn
        } else if velocity.y > 0.0 {
            HeaderType::DefensiveClear
        } else {
            HeaderType::Power
        }
    }

    /// Fixed score for clearing the timing speed, lower one otherwise.
    pub fn timing_score(&self, peak_speed: f32) -> f32 {
        let s = &self.config.scoring;
        if peak_speed > self.config.thresholds.min_head_speed * s.timing_speed_factor {
            s.timing_good
        } else {
            s.timing_base
        }
    }

    fn body_lean(skeleton: &Skeleton) -> f32 {
        let body = skeleton.position(JointId::Head) - skeleton.position(JointId::Pelvis);
        angle_between_deg(&body, &up())
    }

    fn neck_angle(skeleton: &Skeleton) -> f32 {
        let neck = skeleton.position(JointId::Neck);
        let neck_to_head = skeleton.position(JointId::Head) - neck;
        let chest_to_neck = neck - skeleton.position(JointId::SpineChest);
        angle_between_deg(&neck_to_head, &chest_to_neck)
    }

    /// Torso against header direction: -1..1 mapped to 0..100.
    fn body_alignment(skeleton: &Skeleton, direction: &Vec3) -> f32 {
        let torso = skeleton.position(JointId::SpineChest) - skeleton.position(JointId::Pelvis);
        let alignment = dot(&normalize_or_zero(&torso), &normalize_or_zero(direction));
        (alignment + 1.0) * 50.0
    }
}

const HEADER_JOINTS: [JointId; 5] =
    [JointId::Pelvis, JointId::SpineChest, JointId::Neck, JointId::Head, JointId::Nose];

#[derive(Debug, Clone, Default)]
pub struct HeaderProfile {
    analyzer: HeaderAnalyzer,
}

impl HeaderProfile {
    pub fn new(config: HeaderConfig) -> Self {
        Self { analyzer: HeaderAnalyzer::new(config) }
    }

    fn config(&self) -> &HeaderConfig {
        self.analyzer.config()
    }
}

impl ActionProfile for HeaderProfile {
    type Phase = HeaderPhase;
    type Output = HeaderResult;
    const NAME: &'static str = "header";

    fn phase(stage: Stage) -> HeaderPhase {
        stage.into()
    }

    fn tracked_joints(&self) -> &'static [JointId] {
        &HEADER_JOINTS
    }

    fn timings(&self) -> &PhaseTimings {
        &self.config().timings
    }

    fn direction_frames(&self) -> usize {
        self.config().thresholds.direction_frames
    }

    fn trigger_joint(&self, _limb: DominantLimb) -> JointId {
        JointId::Head
    }

    fn motion_joint(&self, _limb: DominantLimb) -> JointId {
        JointId::Head
    }

    fn should_arm(&self, head: &MotionHistory) -> bool {
        head.current_speed() > self.config().thresholds.setup_speed
    }

    /// Fast enough and moving up or forward
    fn should_drive(&self, head: &MotionHistory) -> bool {
        let v = head.current_velocity();
        v.norm() > self.config().thresholds.min_head_speed && (v.y > 0.0 || v.z > 0.0)
    }

    fn should_contact(&self, head: &MotionHistory) -> bool {
        let t = &self.config().thresholds;
        let Some(prev) = head.velocity_n_frames_ago(1) else {
            return false;
        };
        let prev_speed = prev.norm();
        prev_speed > t.min_head_speed && head.current_speed() < prev_speed * t.contact_decel_ratio
    }

    fn should_complete(&self, head: &MotionHistory) -> bool {
        let t = &self.config().thresholds;
        head.current_speed() < t.min_head_speed * t.recovery_speed_fraction
    }

    fn analyze(&self, input: &AnalysisInput<'_>) -> HeaderResult {
        self.analyzer.analyze(input)
    }
}

impl HeaderDetector {
    pub fn with_config(config: HeaderConfig, history: &HistoryConfig) -> Self {
        PhaseDetector::new(HeaderProfile::new(config), history)
    }
}
