//! Phase detector engine
//!
//! A single state machine drives every action profile:
//!
//! 1. push the snapshot into the joint histories
//! 2. re-evaluate the dominant limb
//! 3. abandon the action if the current stage has stalled
//! 4. check the stage's exit condition (skipped while data is insufficient)
//! 5. after the terminal dwell, analyze, notify listeners and reset
//!
//! Frame processing never fails. Ambiguous input keeps the current stage and
//! stalls resolve through the per-stage timeouts.

use super::history::{JointHistories, MotionHistory};
use super::profile::{ActionProfile, ActionTrace, AnalysisInput, DominantLimb, Stage};
use crate::config::HistoryConfig;
use crate::events::{ActionListener, BoxedListener};
use crate::math::Vec3;
use crate::skeleton::{JointId, Skeleton};

pub struct PhaseDetector<P: ActionProfile> {
    profile: P,
    histories: JointHistories,
    stage: Stage,
    stage_entered_us: u64,
    limb: DominantLimb,
    /// Challenger limb and the frames it has been winning
    pending_limb: Option<(DominantLimb, u32)>,
    trace: ActionTrace,
    listeners: Vec<BoxedListener<P::Output>>,
    completed: u64,
}

impl<P: ActionProfile + Default> Default for PhaseDetector<P> {
    fn default() -> Self {
        Self::new(P::default(), &HistoryConfig::default())
    }
}

impl<P: ActionProfile> PhaseDetector<P> {
    pub fn new(profile: P, history: &HistoryConfig) -> Self {
        let histories = JointHistories::new(history, profile.tracked_joints());
        Self {
            profile,
            histories,
            stage: Stage::Idle,
            stage_entered_us: 0,
            limb: DominantLimb::Unknown,
            pending_limb: None,
            trace: ActionTrace::default(),
            listeners: Vec::new(),
            completed: 0,
        }
    }

    /// Feeds one snapshot. Returns the analyzer result on the frame an
    /// action completes; listeners receive the same value.
    pub fn process_frame(&mut self, skeleton: &Skeleton) -> Option<P::Output> {
        self.histories.ingest(skeleton);
        self.update_limb();

        let now = skeleton.timestamp_us;
        let dwell = now.saturating_sub(self.stage_entered_us);

        if let Some(timeout) = self.stage_timeout() {
            if dwell > timeout {
                log::debug!(
                    "{} abandoned in {:?} after {}ms",
                    P::NAME,
                    P::phase(self.stage),
                    dwell / 1_000
                );
                self.reset();
                return None;
            }
        }

        if self.stage == Stage::Completing {
            if dwell > self.profile.timings().completion_dwell_us {
                return Some(self.complete(skeleton));
            }
            return None;
        }

        if self.profile.requires_limb() && !self.limb.is_known() {
            log::trace!("{} frame {} skipped: no dominant limb", P::NAME, now);
            return None;
        }

        let watched = match self.stage {
            Stage::Idle => self.profile.trigger_joint(self.limb),
            _ => self.profile.motion_joint(self.limb),
        };
        let Some(history) = self.histories.get(watched).filter(|h| h.has_enough_data()) else {
            log::trace!("{} frame {} skipped: not enough {:?} data", P::NAME, now, watched);
            return None;
        };

        let timings = *self.profile.timings();
        let next = match self.stage {
            Stage::Idle if self.profile.should_arm(history) => Some(Stage::Arming),
            Stage::Arming
                if dwell >= timings.min_arming_us && self.profile.should_drive(history) =>
            {
                Some(Stage::Driving)
            }
            Stage::Driving => {
                self.trace.peak_speed = self.trace.peak_speed.max(history.current_speed());
                if dwell >= timings.min_driving_us && self.profile.should_contact(history) {
                    Some(Stage::Contact)
                } else {
                    None
                }
            }
            Stage::Contact
                if dwell >= timings.min_contact_us && self.profile.should_complete(history) =>
            {
                Some(Stage::Completing)
            }
            _ => None,
        };

        if let Some(stage) = next {
            self.enter(stage, now, watched);
        }
        None
    }

    /// Subscribes a listener; it is called once per completed action.
    pub fn add_listener<L>(&mut self, listener: L)
    where
        L: ActionListener<P::Output> + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn phase(&self) -> P::Phase {
        P::phase(self.stage)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn dominant_limb(&self) -> DominantLimb {
        self.limb
    }

    /// Peak motion-joint speed of the action in flight (m/s).
    pub fn peak_speed(&self) -> f32 {
        self.trace.peak_speed
    }

    /// Direction frozen at Contact entry; zero before contact.
    pub fn direction(&self) -> Vec3 {
        self.trace.direction
    }

    pub fn histories(&self) -> &JointHistories {
        &self.histories
    }

    pub fn history(&self, joint: JointId) -> Option<&MotionHistory> {
        self.histories.get(joint)
    }

    pub fn profile(&self) -> &P {
        &self.profile
    }

    /// Actions completed since construction.
    pub fn completed_count(&self) -> u64 {
        self.completed
    }

    /// Back to Idle. Histories are kept so velocity stays continuous.
    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
        self.trace = ActionTrace::default();
        self.limb = DominantLimb::Unknown;
        self.pending_limb = None;
    }

    fn stage_timeout(&self) -> Option<u64> {
        let timings = self.profile.timings();
        match self.stage {
            Stage::Arming => Some(timings.arming_timeout_us),
            Stage::Driving => Some(timings.driving_timeout_us),
            Stage::Contact => Some(timings.contact_timeout_us),
            Stage::Idle | Stage::Completing => None,
        }
    }

    fn enter(&mut self, stage: Stage, now: u64, watched: JointId) {
        log::debug!("{} {:?} -> {:?}", P::NAME, P::phase(self.stage), P::phase(stage));
        if let Some(history) = self.histories.get(watched) {
            match stage {
                Stage::Arming => self.trace = ActionTrace::default(),
                Stage::Driving => self.trace.peak_speed = history.current_speed(),
                Stage::Contact => {
                    self.trace.capture_contact(history, self.profile.direction_frames())
                }
                Stage::Idle | Stage::Completing => {}
            }
        }
        self.stage = stage;
        self.stage_entered_us = now;
    }

    fn complete(&mut self, skeleton: &Skeleton) -> P::Output {
        let input = AnalysisInput {
            skeleton,
            histories: &self.histories,
            limb: self.limb,
            timestamp_us: skeleton.timestamp_us,
            trace: self.trace,
        };
        let result = self.profile.analyze(&input);
        log::info!("{} completed: {:?}", P::NAME, result);

        for listener in self.listeners.iter_mut() {
            listener.on_action(result);
        }
        self.completed += 1;
        self.reset();
        result
    }

    fn update_limb(&mut self) {
        let candidate = self.profile.select_limb(&self.histories, self.limb);
        if candidate == self.limb {
            self.pending_limb = None;
            return;
        }

        let hold = self.profile.limb_switch_hold_frames();
        if hold == 0 || !self.limb.is_known() {
            self.limb = candidate;
            self.pending_limb = None;
            return;
        }

        let frames = match self.pending_limb {
            Some((limb, frames)) if limb == candidate => frames + 1,
            _ => 1,
        };
        if frames >= hold {
            log::debug!("{} dominant limb {:?} -> {:?}", P::NAME, self.limb, candidate);
            self.limb = candidate;
            self.pending_limb = None;
        } else {
            self.pending_limb = Some((candidate, frames));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhaseTimings;
    use crate::skeleton::Confidence;
    use std::sync::{Arc, Mutex};

    /// Minimal profile over one joint: moves forward through every stage on speed alone.
    struct ProbeProfile {
        timings: PhaseTimings,
    }

    impl ProbeProfile {
        fn new() -> Self {
            Self {
                timings: PhaseTimings {
                    min_arming_us: 0,
                    arming_timeout_us: 1_000_000,
                    min_driving_us: 0,
                    driving_timeout_us: 1_000_000,
                    min_contact_us: 0,
                    contact_timeout_us: 1_000_000,
                    completion_dwell_us: 100_000,
                },
            }
        }
    }

    impl ActionProfile for ProbeProfile {
        type Phase = Stage;
        type Output = f32;
        const NAME: &'static str = "probe";

        fn phase(stage: Stage) -> Stage {
            stage
        }
        fn tracked_joints(&self) -> &'static [JointId] {
            &[JointId::HandRight]
        }
        fn timings(&self) -> &PhaseTimings {
            &self.timings
        }
        fn direction_frames(&self) -> usize {
            2
        }
        fn trigger_joint(&self, _: DominantLimb) -> JointId {
            JointId::HandRight
        }
        fn motion_joint(&self, _: DominantLimb) -> JointId {
            JointId::HandRight
        }
        fn should_arm(&self, h: &MotionHistory) -> bool {
            h.current_speed() > 0.5
        }
        fn should_drive(&self, h: &MotionHistory) -> bool {
            h.current_speed() > 1.0
        }
        fn should_contact(&self, h: &MotionHistory) -> bool {
            h.current_speed() < 0.5
        }
        fn should_complete(&self, h: &MotionHistory) -> bool {
            h.current_speed() < 0.1
        }
        fn analyze(&self, input: &AnalysisInput<'_>) -> f32 {
            input.trace.peak_speed
        }
    }

    const FRAME_US: u64 = 100_000;

    fn frame(i: u64, z_mm: f32) -> Skeleton {
        Skeleton::new(i * FRAME_US).with_joint(JointId::HandRight, Vec3::new(0.0, 0.0, z_mm), Confidence::High)
    }

    /// z positions (mm) at 10 Hz: idle, arm at 0.6 m/s, drive up to 2 m/s, stop.
    const PATH: [f32; 10] = [0.0, 0.0, 0.0, 60.0, 180.0, 380.0, 400.0, 400.0, 400.0, 400.0];

    #[test]
    fn test_runs_through_every_stage_once() {
        let mut detector = PhaseDetector::new(ProbeProfile::new(), &HistoryConfig::default());
        let mut stages = Vec::new();
        let mut results = Vec::new();
        for (i, z) in PATH.iter().enumerate() {
            if let Some(peak) = detector.process_frame(&frame(i as u64, *z)) {
                results.push(peak);
            }
            if stages.last() != Some(&detector.stage()) {
                stages.push(detector.stage());
            }
        }
        assert_eq!(
            stages,
            vec![Stage::Idle, Stage::Arming, Stage::Driving, Stage::Contact, Stage::Completing, Stage::Idle]
        );
        assert_eq!(results.len(), 1);
        assert!((results[0] - 2.0).abs() < 1e-3);
        assert_eq!(detector.completed_count(), 1);
    }

    #[test]
    fn test_listeners_receive_result() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut detector = PhaseDetector::new(ProbeProfile::new(), &HistoryConfig::default());
        detector.add_listener(move |peak: f32| sink.lock().unwrap().push(peak));
        for (i, z) in PATH.iter().enumerate() {
            detector.process_frame(&frame(i as u64, *z));
        }
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_stalled_stage_times_out() {
        let mut detector = PhaseDetector::new(ProbeProfile::new(), &HistoryConfig::default());
        // arm, then creep forward at 0.6 m/s forever
        for i in 0..30u64 {
            let z = if i < 3 { 0.0 } else { (i - 2) as f32 * 60.0 };
            assert!(detector.process_frame(&frame(i, z)).is_none());
            if i == 4 {
                assert_eq!(detector.stage(), Stage::Arming);
            }
        }
        assert_eq!(detector.stage(), Stage::Arming);
        // timed out at least once and re-armed
        assert_eq!(detector.completed_count(), 0);
    }

    #[test]
    fn test_timeout_resolves_without_new_data() {
        let mut detector = PhaseDetector::new(ProbeProfile::new(), &HistoryConfig::default());
        for i in 0..5u64 {
            detector.process_frame(&frame(i, if i < 3 { 0.0 } else { (i - 2) as f32 * 60.0 }));
        }
        assert_eq!(detector.stage(), Stage::Arming);
        // tracking lost: empty snapshots only
        detector.process_frame(&Skeleton::new(20 * FRAME_US));
        assert_eq!(detector.stage(), Stage::Idle);
    }

    #[test]
    fn test_reset_keeps_history() {
        let mut detector = PhaseDetector::new(ProbeProfile::new(), &HistoryConfig::default());
        for i in 0..5u64 {
            detector.process_frame(&frame(i, i as f32 * 60.0));
        }
        let len = detector.history(JointId::HandRight).map(MotionHistory::len);
        detector.reset();
        assert_eq!(detector.stage(), Stage::Idle);
        assert_eq!(detector.peak_speed(), 0.0);
        assert_eq!(detector.history(JointId::HandRight).map(MotionHistory::len), len);
        assert_eq!(len, Some(5));
    }
}
