//! Per-joint motion history
//!
//! Bounded FIFO of confidence-gated samples with finite-difference velocity.
//! Positions are stored in millimetres as reported by the tracker; velocities
//! are in metres per second.

use crate::config::HistoryConfig;
use crate::math::{Vec3, MM_PER_M, US_PER_S};
use crate::skeleton::{JointId, JointReading, Skeleton};
use fxhash::FxHashMap;
use std::collections::VecDeque;

/// One accepted joint observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSample {
    /// Position (mm)
    pub position: Vec3,
    /// Velocity relative to the previous accepted sample (m/s)
    pub velocity: Vec3,
    pub timestamp_us: u64,
    pub confidence: f32,
}

#[derive(Debug, Clone)]
pub struct MotionHistory {
    samples: VecDeque<JointSample>,
    capacity: usize,
    min_confidence: f32,
    min_samples: usize,
}

impl Default for MotionHistory {
    fn default() -> Self {
        Self::new(&HistoryConfig::default())
    }
}

impl MotionHistory {
    pub fn new(config: &HistoryConfig) -> Self {
        let capacity = config.capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
            min_confidence: config.min_confidence,
            min_samples: config.min_samples,
        }
    }

    /// Appends a sample; returns `false` (and changes nothing) when the
    /// confidence is below the acceptance threshold.
    pub fn add_sample(&mut self, position: Vec3, timestamp_us: u64, confidence: f32) -> bool {
        if confidence.is_nan() || confidence < self.min_confidence {
            return false;
        }

        let velocity = match self.samples.back() {
            Some(prev) if timestamp_us > prev.timestamp_us => {
                let dt = (timestamp_us - prev.timestamp_us) as f32 / US_PER_S;
                (position - prev.position) / MM_PER_M / dt
            }
            _ => Vec3::zeros(),
        };

        self.samples.push_back(JointSample { position, velocity, timestamp_us, confidence });
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        true
    }

    /// [`MotionHistory::add_sample`] for a tracker reading.
    pub fn add_reading(&mut self, reading: &JointReading, timestamp_us: u64) -> bool {
        self.add_sample(reading.position, timestamp_us, reading.confidence.as_f32())
    }

    pub fn current_velocity(&self) -> Vec3 {
        self.samples.back().map(|s| s.velocity).unwrap_or_else(Vec3::zeros)
    }

    pub fn current_speed(&self) -> f32 {
        self.current_velocity().norm()
    }

    /// Velocity of the sample `n` steps back (0 = newest).
    pub fn velocity_n_frames_ago(&self, n: usize) -> Option<Vec3> {
        self.nth_back(n).map(|s| s.velocity)
    }

    pub fn position_n_frames_ago(&self, n: usize) -> Option<Vec3> {
        self.nth_back(n).map(|s| s.position)
    }

    /// Mean of the most recent `last_n` velocities.
    pub fn average_velocity(&self, last_n: usize) -> Vec3 {
        let count = last_n.min(self.samples.len());
        if count == 0 {
            return Vec3::zeros();
        }
        let sum = self.samples.iter().rev().take(count).fold(Vec3::zeros(), |acc, s| acc + s.velocity);
        sum / count as f32
    }

    /// Highest speed anywhere in the buffer.
    pub fn peak_speed(&self) -> f32 {
        self.samples.iter().map(|s| s.velocity.norm()).fold(0.0, f32::max)
    }

    /// Change of velocity between the two newest samples (m/s²).
    pub fn current_acceleration(&self) -> Vec3 {
        match (self.nth_back(0), self.nth_back(1)) {
            (Some(cur), Some(prev)) if cur.timestamp_us > prev.timestamp_us => {
                let dt = (cur.timestamp_us - prev.timestamp_us) as f32 / US_PER_S;
                (cur.velocity - prev.velocity) / dt
            }
            _ => Vec3::zeros(),
        }
    }

    /// Seconds between the oldest and newest retained samples.
    pub fn time_span_secs(&self) -> f32 {
        match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) => last.timestamp_us.saturating_sub(first.timestamp_us) as f32 / US_PER_S,
            _ => 0.0,
        }
    }

    pub fn has_enough_data(&self) -> bool {
        self.samples.len() >= self.min_samples
    }

    pub fn latest(&self) -> Option<&JointSample> {
        self.samples.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &JointSample> + ExactSizeIterator {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    fn nth_back(&self, n: usize) -> Option<&JointSample> {
        let len = self.samples.len();
        if n >= len {
            return None;
        }
        self.samples.get(len - 1 - n)
    }
}

// ============================================================================
// Joint set
// ============================================================================

/// One history per tracked joint, owned by a single detector.
#[derive(Debug, Clone)]
pub struct JointHistories {
    histories: FxHashMap<JointId, MotionHistory>,
}

impl JointHistories {
    pub fn new(config: &HistoryConfig, joints: &[JointId]) -> Self {
        let histories = joints.iter().map(|&id| (id, MotionHistory::new(config))).collect();
        Self { histories }
    }

    /// Pushes every tracked joint of the snapshot; returns how many samples were accepted.
    pub fn ingest(&mut self, skeleton: &Skeleton) -> usize {
        let mut accepted = 0;
        for (id, history) in self.histories.iter_mut() {
            if history.add_reading(skeleton.joint(*id), skeleton.timestamp_us) {
                accepted += 1;
            }
        }
        accepted
    }

    pub fn get(&self, id: JointId) -> Option<&MotionHistory> {
        self.histories.get(&id)
    }

    /// Current speed of `id`, zero for untracked joints.
    pub fn speed(&self, id: JointId) -> f32 {
        self.get(id).map(MotionHistory::current_speed).unwrap_or(0.0)
    }

    pub fn has_enough_data(&self, id: JointId) -> bool {
        self.get(id).is_some_and(MotionHistory::has_enough_data)
    }

    pub fn joints(&self) -> impl Iterator<Item = JointId> + '_ {
        self.histories.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    pub fn clear(&mut self) {
        for history in self.histories.values_mut() {
            history.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FRAME_US: u64 = 33_333;

    fn history() -> MotionHistory {
        MotionHistory::default()
    }

    #[test]
    fn test_velocity_in_metres_per_second() {
        let mut h = history();
        assert!(h.add_sample(Vec3::zeros(), 0, 1.0));
        // 100mm in 0.1s = 1 m/s forward
        assert!(h.add_sample(Vec3::new(0.0, 0.0, 100.0), 100_000, 1.0));
        let v = h.current_velocity();
        assert!((v.z - 1.0).abs() < 1e-5);
        assert!((h.current_speed() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_first_sample_and_non_increasing_time_have_zero_velocity() {
        let mut h = history();
        h.add_sample(Vec3::new(5.0, 5.0, 5.0), 1_000, 1.0);
        assert_eq!(h.current_velocity(), Vec3::zeros());
        h.add_sample(Vec3::new(500.0, 5.0, 5.0), 1_000, 1.0);
        assert_eq!(h.current_velocity(), Vec3::zeros());
        h.add_sample(Vec3::new(900.0, 5.0, 5.0), 500, 1.0);
        assert_eq!(h.current_velocity(), Vec3::zeros());
    }

    #[test]
    fn test_low_confidence_rejected() {
        let mut h = history();
        assert!(!h.add_sample(Vec3::zeros(), 0, 0.25));
        assert!(h.is_empty());
        assert!(h.add_sample(Vec3::zeros(), 0, 0.5));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut h = history();
        for i in 0..40u64 {
            h.add_sample(Vec3::new(i as f32, 0.0, 0.0), i * FRAME_US, 1.0);
        }
        assert_eq!(h.len(), 30);
        assert_eq!(h.iter().next().map(|s| s.timestamp_us), Some(10 * FRAME_US));
    }

    #[test]
    fn test_n_frames_ago_bounds() {
        let mut h = history();
        for i in 0..3u64 {
            h.add_sample(Vec3::new(0.0, 0.0, i as f32 * 10.0), i * FRAME_US, 1.0);
        }
        assert_eq!(h.position_n_frames_ago(0).map(|p| p.z), Some(20.0));
        assert_eq!(h.position_n_frames_ago(2).map(|p| p.z), Some(0.0));
        assert_eq!(h.position_n_frames_ago(3), None);
        assert_eq!(h.velocity_n_frames_ago(2), Some(Vec3::zeros()));
    }

    #[test]
    fn test_average_velocity_clamps_count() {
        let mut h = history();
        h.add_sample(Vec3::zeros(), 0, 1.0);
        h.add_sample(Vec3::new(0.0, 0.0, 100.0), 100_000, 1.0); // 1 m/s
        h.add_sample(Vec3::new(0.0, 0.0, 400.0), 200_000, 1.0); // 3 m/s
        let avg = h.average_velocity(2);
        assert!((avg.z - 2.0).abs() < 1e-4);
        let all = h.average_velocity(100);
        assert!((all.z - 4.0 / 3.0).abs() < 1e-4);
        assert_eq!(h.average_velocity(0), Vec3::zeros());
    }

    #[test]
    fn test_peak_speed_includes_old_samples() {
        let mut h = history();
        h.add_sample(Vec3::zeros(), 0, 1.0);
        h.add_sample(Vec3::new(0.0, 0.0, 500.0), 100_000, 1.0); // 5 m/s
        for i in 2..10u64 {
            h.add_sample(Vec3::new(0.0, 0.0, 500.0 + i as f32), i * 100_000, 1.0);
        }
        assert!((h.peak_speed() - 5.0).abs() < 1e-4);
        assert!(h.current_speed() < 0.1);
    }

    #[test]
    fn test_confidence_gap_uses_elapsed_time() {
        let mut h = history();
        h.add_sample(Vec3::zeros(), 0, 1.0);
        assert!(!h.add_sample(Vec3::new(0.0, 0.0, 100.0), 100_000, 0.0));
        h.add_sample(Vec3::new(0.0, 0.0, 200.0), 200_000, 1.0);
        // 200mm over 0.2s, not 100mm over 0.1s from the dropped sample
        assert!((h.current_velocity().z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_acceleration_and_span() {
        let mut h = history();
        h.add_sample(Vec3::zeros(), 0, 1.0);
        h.add_sample(Vec3::new(0.0, 0.0, 100.0), 100_000, 1.0); // 1 m/s
        h.add_sample(Vec3::new(0.0, 0.0, 300.0), 200_000, 1.0); // 2 m/s
        assert!((h.current_acceleration().z - 10.0).abs() < 1e-3);
        assert!((h.time_span_secs() - 0.2).abs() < 1e-6);
        assert!(h.has_enough_data());
    }

    #[test]
    fn test_joint_histories_ingest_skips_untracked() {
        use crate::skeleton::Confidence;

        let mut set = JointHistories::new(&HistoryConfig::default(), &[JointId::Head, JointId::FootLeft]);
        let skel = Skeleton::new(0)
            .with_joint(JointId::Head, Vec3::new(0.0, 1700.0, 0.0), Confidence::High)
            .with_joint(JointId::FootLeft, Vec3::zeros(), Confidence::Low);
        assert_eq!(set.ingest(&skel), 1);
        assert_eq!(set.get(JointId::Head).map(MotionHistory::len), Some(1));
        assert_eq!(set.get(JointId::FootLeft).map(MotionHistory::len), Some(0));
        assert!(set.get(JointId::Pelvis).is_none());
        assert_eq!(set.speed(JointId::Pelvis), 0.0);
        assert!(!set.has_enough_data(JointId::Head));
    }

    #[test]
    fn test_clear() {
        let mut h = history();
        h.add_sample(Vec3::zeros(), 0, 1.0);
        h.clear();
        assert!(h.is_empty());
        assert!(!h.has_enough_data());
        assert_eq!(h.current_speed(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_rejected_sample_changes_nothing(
            steps in prop::collection::vec((-500.0f32..500.0, -500.0f32..500.0, -500.0f32..500.0), 1..20),
            x in -1000.0f32..1000.0,
            conf in 0.0f32..0.49,
        ) {
            let mut h = history();
            for (i, (dx, dy, dz)) in steps.iter().enumerate() {
                h.add_sample(Vec3::new(*dx, *dy, *dz), i as u64 * FRAME_US, 1.0);
            }
            let velocity = h.current_velocity();
            let speed = h.current_speed();
            let peak = h.peak_speed();
            let len = h.len();

            let accepted = h.add_sample(Vec3::new(x, x, x), steps.len() as u64 * FRAME_US, conf);
            prop_assert!(!accepted);
            prop_assert_eq!(h.current_velocity(), velocity);
            prop_assert_eq!(h.current_speed(), speed);
            prop_assert_eq!(h.peak_speed(), peak);
            prop_assert_eq!(h.len(), len);
        }

        #[test]
        fn prop_peak_is_max_over_retained(
            zs in prop::collection::vec(-2000.0f32..2000.0, 2..60),
        ) {
            let mut h = history();
            for (i, z) in zs.iter().enumerate() {
                h.add_sample(Vec3::new(0.0, 0.0, *z), i as u64 * FRAME_US, 1.0);
            }
            let expected = h.iter().map(|s| s.velocity.norm()).fold(0.0f32, f32::max);
            prop_assert_eq!(h.peak_speed(), expected);
            prop_assert!(h.len() <= h.capacity());
        }
    }
}
