//! Kick detection and analysis
//!
//! `WindUp → Acceleration → Contact → FollowThrough`, driven by the dominant
//! foot. The ankle's backward swing arms the detector, the foot's forward
//! swing does the rest.
//!
//! ## Classification
//! - Instep: locked knee, fast foot
//! - SideFootPass: bent knee, controlled swing
//! - Outside: lateral swing dominates
//! - Toe: fast foot with a moderately bent knee

use super::detector::PhaseDetector;
use super::history::{JointHistories, MotionHistory};
use super::profile::{ActionProfile, AnalysisInput, DominantLimb, Stage};
use super::scoring::{linear_falloff, ratio_score, AxisScores};
use crate::config::{KickConfig, PhaseTimings};
use crate::math::{angle_between_deg, forward, horizontal, joint_angle_deg, up, Vec3, MM_PER_M, MPS_TO_KMH};
use crate::skeleton::{JointId, Skeleton};
use serde::{Deserialize, Serialize};

/// Kick detector over the generic phase engine.
pub type KickDetector = PhaseDetector<KickProfile>;

// ============================================================================
// Phase / Type
// ============================================================================

/// Kick phase (FSM state)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KickPhase {
    Idle,
    /// Leg swinging back
    WindUp,
    /// Leg swinging forward toward the ball
    Acceleration,
    /// Foot decelerating through the ball
    Contact,
    FollowThrough,
}

impl KickPhase {
    pub fn name(self) -> &'static str {
        match self {
            KickPhase::Idle => "Idle",
            KickPhase::WindUp => "Wind Up",
            KickPhase::Acceleration => "Acceleration",
            KickPhase::Contact => "Contact",
            KickPhase::FollowThrough => "Follow Through",
        }
    }
}

impl From<Stage> for KickPhase {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Idle => KickPhase::Idle,
            Stage::Arming => KickPhase::WindUp,
            Stage::Driving => KickPhase::Acceleration,
            Stage::Contact => KickPhase::Contact,
            Stage::Completing => KickPhase::FollowThrough,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KickType {
    /// Laces, power shot
    Instep,
    /// Inside of the foot, placed pass
    SideFootPass,
    /// Outside of the foot, curl
    Outside,
    /// Toe poke
    Toe,
}

impl KickType {
    pub fn name(self) -> &'static str {
        match self {
            KickType::Instep => "Instep",
            KickType::SideFootPass => "Side-Foot Pass",
            KickType::Outside => "Outside",
            KickType::Toe => "Toe",
        }
    }
}

// ============================================================================
// Result
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KickQuality {
    pub power: f32,
    pub accuracy: f32,
    pub technique: f32,
    pub balance: f32,
    pub overall: f32,

    /// Peak foot speed (m/s)
    pub foot_speed: f32,
    /// Estimated ball speed (km/h)
    pub ball_speed_kmh: f32,
    /// Angle between kick direction and target (deg)
    pub direction_error_deg: f32,
    /// Direction falls inside the target zone
    pub on_target: bool,
    /// Hip-knee-ankle angle (deg, 180 = straight)
    pub knee_angle_deg: f32,
    pub hip_rotation_deg: f32,
    /// Foot path over the follow-through window (m)
    pub follow_through_m: f32,
    /// Torso lean from vertical (deg)
    pub body_lean_deg: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KickResult {
    pub kick_type: KickType,
    pub quality: KickQuality,
    /// Unit vector frozen at contact
    pub direction: Vec3,
    pub foot: DominantLimb,
    pub timestamp_us: u64,
    pub is_valid: bool,
}

impl KickResult {
    /// Scores as [`AxisScores`].
    pub fn axis_scores(&self) -> AxisScores {
        AxisScores::new(
            self.quality.power,
            self.quality.accuracy,
            self.quality.technique,
            self.quality.balance,
        )
    }
}

// ============================================================================
// Analyzer
// ============================================================================

/// Leg joints for one side
#[derive(Debug, Clone, Copy)]
struct Leg {
    hip: JointId,
    knee: JointId,
    ankle: JointId,
    foot: JointId,
}

impl Leg {
    fn of(limb: DominantLimb) -> Leg {
        match limb {
            DominantLimb::Left => Leg {
                hip: JointId::HipLeft,
                knee: JointId::KneeLeft,
                ankle: JointId::AnkleLeft,
                foot: JointId::FootLeft,
            },
            // Unknown only reaches the analyzer through direct calls
            DominantLimb::Right | DominantLimb::Unknown => Leg {
                hip: JointId::HipRight,
                knee: JointId::KneeRight,
                ankle: JointId::AnkleRight,
                foot: JointId::FootRight,
            },
        }
    }
}

/// Stateless kick scorer
#[derive(Debug, Clone, Default)]
pub struct KickAnalyzer {
    config: KickConfig,
}

impl KickAnalyzer {
    pub fn new(config: KickConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KickConfig {
        &self.config
    }

    pub fn analyze(&self, input: &AnalysisInput<'_>) -> KickResult {
        let scoring = &self.config.scoring;
        let leg = Leg::of(input.limb);
        let skeleton = input.skeleton;
        let foot_history = input.histories.get(leg.foot);

        let history_peak = foot_history.map(MotionHistory::peak_speed).unwrap_or(0.0);
        let peak = input.trace.peak_speed.max(history_peak);

        let mut velocity = input.trace.contact_velocity;
        if velocity.norm() < crate::math::EPSILON {
            velocity = foot_history.map(MotionHistory::current_velocity).unwrap_or_else(Vec3::zeros);
        }

        let knee_angle = Self::knee_angle(skeleton, leg);
        let kick_type = self.classify(knee_angle, peak, &velocity);

        // Power
        let ball_speed_kmh = self.estimated_ball_speed_kmh(peak);
        let power = ratio_score(ball_speed_kmh, scoring.max_ball_speed_kmh);

        // Accuracy
        let to_target = self.config.target.center - input.trace.contact_position;
        let direction_error = angle_between_deg(&input.trace.direction, &to_target);
        let accuracy = linear_falloff(direction_error, scoring.accuracy_cutoff_deg);
        let on_target = input.trace.direction.norm() > crate::math::EPSILON
            && direction_error <= self.config.target.angular_radius_deg(&input.trace.contact_position);

        // Technique
        let hip_rotation = Self::hip_rotation(skeleton);
        let follow_through = foot_history
            .map(|h| Self::follow_through_length(h, scoring.follow_through_segments))
            .unwrap_or(0.0);
        let technique = self.technique_score(knee_angle, hip_rotation, follow_through);

        // Balance
        let lean = Self::body_lean(skeleton);
        let balance = linear_falloff(lean - scoring.ideal_lean_deg, scoring.max_lean_deviation_deg);

        let axes = AxisScores::new(power, accuracy, technique, balance);
        let quality = KickQuality {
            power: axes.power,
            accuracy: axes.accuracy,
            technique: axes.technique,
            balance: axes.balance,
            overall: axes.overall(&scoring.weights),
            foot_speed: peak,
            ball_speed_kmh,
            direction_error_deg: direction_error,
            on_target,
            knee_angle_deg: knee_angle,
            hip_rotation_deg: hip_rotation,
            follow_through_m: follow_through,
            body_lean_deg: lean,
        };

        KickResult {
            kick_type,
            quality,
            direction: input.trace.direction,
            foot: input.limb,
            timestamp_us: input.timestamp_us,
            is_valid: input.limb.is_known() && peak > 0.0,
        }
    }

    /// First matching rule wins; Instep when nothing matches.
    pub fn classify(&self, knee_angle: f32, peak_speed: f32, velocity: &Vec3) -> KickType {
        let c = &self.config.classification;
        if knee_angle > c.instep_min_knee_deg && peak_speed > c.instep_min_speed {
            KickType::Instep
        } else if knee_angle < c.side_foot_max_knee_deg {
            KickType::SideFootPass
        } else if velocity.x.abs() > velocity.z.abs() {
            KickType::Outside
        } else if peak_speed > c.toe_min_speed && knee_angle < c.toe_max_knee_deg {
            KickType::Toe
        } else {
            KickType::Instep
        }
    }

    /// Foot speed (m/s) → ball speed (km/h).
    pub fn estimated_ball_speed_kmh(&self, foot_speed: f32) -> f32 {
        foot_speed * self.config.scoring.ball_speed_factor * MPS_TO_KMH
    }

    pub fn technique_score(&self, knee_angle: f32, hip_rotation: f32, follow_through_m: f32) -> f32 {
        let s = &self.config.scoring;
        let knee = linear_falloff(knee_angle - s.ideal_knee_deg, s.ideal_knee_deg);
        let hip = ratio_score(hip_rotation, s.max_hip_rotation_deg);
        let follow = ratio_score(follow_through_m, s.full_follow_through_m);
        s.technique_weights.blend(knee, hip, follow)
    }

    fn knee_angle(skeleton: &Skeleton, leg: Leg) -> f32 {
        joint_angle_deg(
            &skeleton.position(leg.hip),
            &skeleton.position(leg.knee),
            &skeleton.position(leg.ankle),
        )
    }

    /// Hip line against the forward axis, ignoring height.
    fn hip_rotation(skeleton: &Skeleton) -> f32 {
        let hip_line = skeleton.position(JointId::HipRight) - skeleton.position(JointId::HipLeft);
        angle_between_deg(&horizontal(&hip_line), &forward())
    }

    /// Torso (pelvis → chest) lean from vertical.
    fn body_lean(skeleton: &Skeleton) -> f32 {
        let torso = skeleton.position(JointId::SpineChest) - skeleton.position(JointId::Pelvis);
        angle_between_deg(&torso, &up())
    }

    /// Path length (m) over the newest `segments` frame-to-frame steps.
    fn follow_through_length(history: &MotionHistory, segments: usize) -> f32 {
        let positions: Vec<Vec3> = history.iter().rev().take(segments + 1).map(|s| s.position).collect();
        positions.windows(2).map(|w| (w[0] - w[1]).norm()).sum::<f32>() / MM_PER_M
    }
}

// ============================================================================
// Profile
// ============================================================================

const KICK_JOINTS: [JointId; 10] = [
    JointId::Pelvis,
    JointId::SpineChest,
    JointId::HipLeft,
    JointId::KneeLeft,
    JointId::AnkleLeft,
    JointId::FootLeft,
    JointId::HipRight,
    JointId::KneeRight,
    JointId::AnkleRight,
    JointId::FootRight,
];

#[derive(Debug, Clone, Default)]
pub struct KickProfile {
    analyzer: KickAnalyzer,
}

impl KickProfile {
    pub fn new(config: KickConfig) -> Self {
        Self { analyzer: KickAnalyzer::new(config) }
    }

    fn config(&self) -> &KickConfig {
        self.analyzer.config()
    }
}

impl ActionProfile for KickProfile {
    type Phase = KickPhase;
    type Output = KickResult;
    const NAME: &'static str = "kick";

    fn phase(stage: Stage) -> KickPhase {
        stage.into()
    }

    fn tracked_joints(&self) -> &'static [JointId] {
        &KICK_JOINTS
    }

    fn timings(&self) -> &PhaseTimings {
        &self.config().timings
    }

    fn direction_frames(&self) -> usize {
        self.config().thresholds.direction_frames
    }

    fn requires_limb(&self) -> bool {
        true
    }

    fn select_limb(&self, histories: &JointHistories, current: DominantLimb) -> DominantLimb {
        DominantLimb::from_speeds(
            histories.speed(JointId::FootLeft),
            histories.speed(JointId::FootRight),
            self.config().thresholds.limb_ratio,
            current,
        )
    }

    fn limb_switch_hold_frames(&self) -> u32 {
        self.config().thresholds.limb_switch_hold_frames
    }

    fn trigger_joint(&self, limb: DominantLimb) -> JointId {
        Leg::of(limb).ankle
    }

    fn motion_joint(&self, limb: DominantLimb) -> JointId {
        Leg::of(limb).foot
    }

    /// Ankle swinging back
    fn should_arm(&self, ankle: &MotionHistory) -> bool {
        let v = ankle.current_velocity();
        v.norm() > self.config().thresholds.windup_speed && v.z < 0.0
    }

    /// Foot swinging forward fast
    fn should_drive(&self, foot: &MotionHistory) -> bool {
        let v = foot.current_velocity();
        v.norm() > self.config().thresholds.acceleration_speed && v.z > 0.0
    }

    /// Sharp deceleration from a fast swing
    fn should_contact(&self, foot: &MotionHistory) -> bool {
        let t = &self.config().thresholds;
        let Some(prev) = foot.velocity_n_frames_ago(1) else {
            return false;
        };
        let prev_speed = prev.norm();
        prev_speed > t.acceleration_speed && foot.current_speed() < prev_speed * t.contact_decel_ratio
    }

    /// Foot still moving forward, below the swing threshold
    fn should_complete(&self, foot: &MotionHistory) -> bool {
        let v = foot.current_velocity();
        v.z > 0.0 && v.norm() < self.config().thresholds.acceleration_speed
    }

    fn analyze(&self, input: &AnalysisInput<'_>) -> KickResult {
        self.analyzer.analyze(input)
    }
}

impl KickDetector {
    /// Kick detector with its own histories.
    pub fn with_config(config: KickConfig, history: &crate::config::HistoryConfig) -> Self {
        PhaseDetector::new(KickProfile::new(config), history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HistoryConfig;
    use crate::motion::profile::ActionTrace;
    use crate::skeleton::Confidence;
    use crate::synthetic;
    use std::sync::{Arc, Mutex};

    fn analyzer() -> KickAnalyzer {
        KickAnalyzer::new(KickConfig::default())
    }

    /// Upright body, right leg bent at the knee by `knee_deg`.
    fn stance(knee_deg: f32) -> Skeleton {
        let bend = (180.0 - knee_deg).to_radians();
        let knee = Vec3::new(150.0, 500.0, 0.0);
        let ankle = knee + Vec3::new(0.0, -bend.cos(), -bend.sin()) * 400.0;
        Skeleton::new(0)
            .with_joint(JointId::Pelvis, Vec3::new(0.0, 950.0, 0.0), Confidence::High)
            .with_joint(JointId::SpineChest, Vec3::new(0.0, 1350.0, 70.0), Confidence::High)
            .with_joint(JointId::HipLeft, Vec3::new(-150.0, 900.0, 0.0), Confidence::High)
            .with_joint(JointId::HipRight, Vec3::new(150.0, 900.0, 0.0), Confidence::High)
            .with_joint(JointId::KneeRight, knee, Confidence::High)
            .with_joint(JointId::AnkleRight, ankle, Confidence::High)
    }

    fn input<'a>(skeleton: &'a Skeleton, histories: &'a JointHistories, trace: ActionTrace) -> AnalysisInput<'a> {
        AnalysisInput { skeleton, histories, limb: DominantLimb::Right, timestamp_us: 0, trace }
    }

    #[test]
    fn test_phase_projection() {
        assert_eq!(KickPhase::from(Stage::Arming), KickPhase::WindUp);
        assert_eq!(KickPhase::from(Stage::Completing), KickPhase::FollowThrough);
        assert_eq!(KickPhase::FollowThrough.name(), "Follow Through");
    }

    #[test]
    fn test_classify_decision_tree() {
        let a = analyzer();
        let forward = Vec3::new(0.0, 0.0, 1.0);
        let lateral = Vec3::new(1.0, 0.0, 0.2);

        assert_eq!(a.classify(178.0, 5.0, &forward), KickType::Instep);
        assert_eq!(a.classify(100.0, 5.0, &forward), KickType::SideFootPass);
        assert_eq!(a.classify(150.0, 3.5, &lateral), KickType::Outside);
        assert_eq!(a.classify(130.0, 4.5, &forward), KickType::Toe);
        // nothing matches
        assert_eq!(a.classify(150.0, 2.0, &forward), KickType::Instep);
        // straight leg but slow: falls through to the later rules
        assert_eq!(a.classify(175.0, 1.8, &lateral), KickType::Outside);
    }

    #[test]
    fn test_straight_leg_fast_kick_is_instep() {
        let skel = stance(179.0);
        let histories = JointHistories::new(&HistoryConfig::default(), &KICK_JOINTS);
        let trace = ActionTrace {
            peak_speed: 5.0,
            contact_velocity: Vec3::new(0.0, 0.0, 5.0),
            direction: Vec3::new(0.0, 0.0, 1.0),
            contact_position: Vec3::zeros(),
        };
        let result = analyzer().analyze(&input(&skel, &histories, trace));
        assert_eq!(result.kick_type, KickType::Instep);
        assert!((result.quality.knee_angle_deg - 179.0).abs() < 0.5);
        assert!(result.is_valid);
    }

    #[test]
    fn test_straight_leg_just_past_acceleration_is_instep() {
        let skel = stance(180.0);
        let histories = JointHistories::new(&HistoryConfig::default(), &KICK_JOINTS);
        let contact_velocity = Vec3::new(2.0, 0.0, 1.5);
        let trace = ActionTrace {
            peak_speed: 2.5,
            contact_velocity,
            direction: contact_velocity.normalize(),
            contact_position: Vec3::zeros(),
        };
        let a = analyzer();
        assert!(trace.peak_speed > a.config().thresholds.acceleration_speed);
        let result = a.analyze(&input(&skel, &histories, trace));
        assert_eq!(result.kick_type, KickType::Instep);
    }

    #[test]
    fn test_bent_knee_is_side_foot_pass() {
        let skel = stance(100.0);
        let histories = JointHistories::new(&HistoryConfig::default(), &KICK_JOINTS);
        let trace = ActionTrace { peak_speed: 5.0, ..ActionTrace::default() };
        let result = analyzer().analyze(&input(&skel, &histories, trace));
        assert_eq!(result.kick_type, KickType::SideFootPass);
    }

    #[test]
    fn test_power_and_accuracy_scores() {
        let skel = stance(135.0);
        let histories = JointHistories::new(&HistoryConfig::default(), &KICK_JOINTS);
        // 16 m/s foot → 72 km/h ball → 60%
        let trace = ActionTrace {
            peak_speed: 16.0,
            contact_velocity: Vec3::new(0.0, 0.0, 16.0),
            direction: Vec3::new(0.0, 0.0, 1.0),
            contact_position: Vec3::zeros(),
        };
        let result = analyzer().analyze(&input(&skel, &histories, trace));
        assert!((result.quality.ball_speed_kmh - 72.0).abs() < 0.01);
        assert!((result.quality.power - 60.0).abs() < 0.01);
        assert!(result.quality.accuracy > 99.9);
        assert!(result.quality.on_target);
        assert!((0.0..=100.0).contains(&result.quality.overall));
    }

    #[test]
    fn test_off_target_direction() {
        let skel = stance(135.0);
        let histories = JointHistories::new(&HistoryConfig::default(), &KICK_JOINTS);
        // 45° off the straight line to the target
        let trace = ActionTrace {
            peak_speed: 4.0,
            contact_velocity: Vec3::new(4.0, 0.0, 4.0),
            direction: Vec3::new(1.0, 0.0, 1.0).normalize(),
            contact_position: Vec3::zeros(),
        };
        let result = analyzer().analyze(&input(&skel, &histories, trace));
        assert!((result.quality.direction_error_deg - 45.0).abs() < 0.1);
        assert_eq!(result.quality.accuracy, 0.0);
        assert!(!result.quality.on_target);
    }

    #[test]
    fn test_technique_components() {
        let a = analyzer();
        // ideal knee, square hips, full follow-through
        assert!((a.technique_score(135.0, 90.0, 1.0) - 100.0).abs() < 1e-3);
        // knee score 50, hip 0, follow 50 → 20 + 0 + 15
        assert!((a.technique_score(202.5, 0.0, 0.5) - 35.0).abs() < 1e-3);
    }

    #[test]
    fn test_balance_ideal_lean() {
        let skel = stance(135.0);
        let histories = JointHistories::new(&HistoryConfig::default(), &KICK_JOINTS);
        let result = analyzer().analyze(&input(&skel, &histories, ActionTrace::default()));
        // chest offset 70mm over 400mm ≈ 9.9°
        assert!((result.quality.body_lean_deg - 9.93).abs() < 0.1);
        assert!(result.quality.balance > 99.0);
    }

    #[test]
    fn test_synthetic_kick_runs_all_phases_once() {
        let mut detector = KickDetector::default();
        let results = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&results);
        detector.add_listener(move |r: KickResult| sink.lock().unwrap().push(r));

        let mut phases = vec![detector.phase()];
        let mut returned = 0;
        for frame in synthetic::kick(DominantLimb::Right) {
            if detector.process_frame(&frame).is_some() {
                returned += 1;
            }
            if phases.last() != Some(&detector.phase()) {
                phases.push(detector.phase());
            }
        }

        assert_eq!(
            phases,
            vec![
                KickPhase::Idle,
                KickPhase::WindUp,
                KickPhase::Acceleration,
                KickPhase::Contact,
                KickPhase::FollowThrough,
                KickPhase::Idle,
            ]
        );
        assert_eq!(returned, 1);
        let results = results.lock().unwrap();
        assert_eq!(results.len(), 1);
        let kick = results[0];
        assert_eq!(kick.foot, DominantLimb::Right);
        assert_eq!(kick.kick_type, KickType::Instep);
        assert!(kick.is_valid);
        assert!(kick.direction.z > 0.9);
        assert!(kick.quality.foot_speed > 5.0);
    }

    #[test]
    fn test_abandoned_windup_times_out() {
        let mut detector = KickDetector::default();
        let results = Arc::new(Mutex::new(0u32));
        let sink = Arc::clone(&results);
        detector.add_listener(move |_: KickResult| *sink.lock().unwrap() += 1);

        let mut saw_windup = false;
        for frame in synthetic::abandoned_windup(DominantLimb::Right) {
            assert!(detector.process_frame(&frame).is_none());
            saw_windup |= detector.phase() == KickPhase::WindUp;
        }
        assert!(saw_windup);
        assert_eq!(detector.phase(), KickPhase::Idle);
        assert_eq!(*results.lock().unwrap(), 0);
        assert_eq!(detector.completed_count(), 0);
    }

    #[test]
    fn test_reset_clears_limb_keeps_history() {
        let mut detector = KickDetector::default();
        for frame in synthetic::kick(DominantLimb::Left).iter().take(12) {
            detector.process_frame(frame);
        }
        assert_eq!(detector.dominant_limb(), DominantLimb::Left);
        let len = detector.history(JointId::FootLeft).map(MotionHistory::len);
        detector.reset();
        assert_eq!(detector.dominant_limb(), DominantLimb::Unknown);
        assert_eq!(detector.phase(), KickPhase::Idle);
        assert_eq!(detector.history(JointId::FootLeft).map(MotionHistory::len), len);
    }

    #[test]
    fn test_limb_switch_debounce() {
        let mut config = KickConfig::default();
        config.thresholds.limb_switch_hold_frames = 3;
        let mut detector = KickDetector::with_config(config, &HistoryConfig::default());

        let step = |i: u64, left_z: f32, right_z: f32| {
            Skeleton::new(i * synthetic::FRAME_US)
                .with_joint(JointId::FootLeft, Vec3::new(-150.0, 80.0, left_z), Confidence::High)
                .with_joint(JointId::FootRight, Vec3::new(150.0, 80.0, right_z), Confidence::High)
        };

        // right foot moves, left still
        detector.process_frame(&step(0, 0.0, 0.0));
        detector.process_frame(&step(1, 0.0, 30.0));
        assert_eq!(detector.dominant_limb(), DominantLimb::Right);

        // left foot takes over; needs three winning frames
        detector.process_frame(&step(2, 30.0, 30.0));
        detector.process_frame(&step(3, 60.0, 30.0));
        assert_eq!(detector.dominant_limb(), DominantLimb::Right);
        detector.process_frame(&step(4, 90.0, 30.0));
        assert_eq!(detector.dominant_limb(), DominantLimb::Left);
    }
}
