//! Deterministic skeleton sequences
//!
//! Hand-tuned 30 Hz trajectories for tests, benchmarks and the CLI `synth`
//! command. Positions are in millimetres, the player faces +Z.

use crate::math::Vec3;
use crate::motion::DominantLimb;
use crate::skeleton::{Confidence, JointId, Skeleton};

/// Frame interval at 30 Hz (µs)
pub const FRAME_US: u64 = 33_333;

/// Still frames before any motion so histories fill up.
const LEAD_IN: usize = 5;

/// Per-frame Z steps (mm) of the kicking foot.
/// Wind-up at 1.5 m/s, swing peaking at 6 m/s, sharp slowdown at contact,
/// then a fading follow-through.
const KICK_STEPS: [f32; 19] = [
    -50.0, -50.0, -50.0, -50.0, -50.0, -50.0, -50.0, -50.0, // wind-up
    100.0, 150.0, 200.0, 200.0, 200.0, // acceleration
    60.0,  // contact
    40.0, 30.0, 20.0, 10.0, 5.0, // follow-through
];

/// Per-frame Z steps (mm) of the whole body for a lunging header.
const HEADER_STEPS: [f32; 11] = [25.0, 25.0, 50.0, 70.0, 90.0, 100.0, 100.0, 100.0, 30.0, 10.0, 5.0];

/// Upright player at the sensor origin, every tracked joint High.
pub fn standing(timestamp_us: u64) -> Skeleton {
    use JointId::*;
    let joints: [(JointId, [f32; 3]); 22] = [
        (Pelvis, [0.0, 950.0, 0.0]),
        (SpineNavel, [0.0, 1150.0, 10.0]),
        (SpineChest, [0.0, 1350.0, 20.0]),
        (Neck, [0.0, 1520.0, 20.0]),
        (Head, [0.0, 1680.0, 30.0]),
        (Nose, [0.0, 1670.0, 120.0]),
        (ShoulderLeft, [-200.0, 1450.0, 20.0]),
        (ShoulderRight, [200.0, 1450.0, 20.0]),
        (ElbowLeft, [-250.0, 1200.0, 20.0]),
        (ElbowRight, [250.0, 1200.0, 20.0]),
        (WristLeft, [-270.0, 950.0, 40.0]),
        (WristRight, [270.0, 950.0, 40.0]),
        (HipLeft, [-150.0, 900.0, 0.0]),
        (HipRight, [150.0, 900.0, 0.0]),
        (KneeLeft, [-150.0, 500.0, 0.0]),
        (KneeRight, [150.0, 500.0, 0.0]),
        (AnkleLeft, [-150.0, 100.0, 0.0]),
        (AnkleRight, [150.0, 100.0, 0.0]),
        (FootLeft, [-150.0, 60.0, 120.0]),
        (FootRight, [150.0, 60.0, 120.0]),
        (EarLeft, [-80.0, 1680.0, 30.0]),
        (EarRight, [80.0, 1680.0, 30.0]),
    ];
    let mut skeleton = Skeleton::new(timestamp_us);
    for (id, [x, y, z]) in joints {
        skeleton.set_joint(id, Vec3::new(x, y, z), Confidence::High);
    }
    skeleton
}

/// Straight-legged instep kick with `limb`, followed by a still tail.
pub fn kick(limb: DominantLimb) -> Vec<Skeleton> {
    let mut z = 0.0;
    let mut offsets = vec![0.0; LEAD_IN];
    for step in KICK_STEPS {
        z += step;
        offsets.push(z);
    }
    offsets.extend(std::iter::repeat(z).take(12));

    offsets
        .iter()
        .enumerate()
        .map(|(i, &dz)| swing_leg(standing(i as u64 * FRAME_US), limb, dz))
        .collect()
}

/// Leg swings back, then the player freezes until the wind-up times out.
pub fn abandoned_windup(limb: DominantLimb) -> Vec<Skeleton> {
    let mut z = 0.0;
    let mut offsets = vec![0.0; LEAD_IN];
    for step in &KICK_STEPS[..8] {
        z += step;
        offsets.push(z);
    }
    // 70 frames ≈ 2.3s, past the 2s wind-up timeout
    offsets.extend(std::iter::repeat(z).take(70));

    offsets
        .iter()
        .enumerate()
        .map(|(i, &dz)| swing_leg(standing(i as u64 * FRAME_US), limb, dz))
        .collect()
}

/// Forward lunge header, followed by a still tail.
pub fn header() -> Vec<Skeleton> {
    let mut z = 0.0;
    let mut offsets = vec![0.0; LEAD_IN];
    for step in HEADER_STEPS {
        z += step;
        offsets.push(z);
    }
    offsets.extend(std::iter::repeat(z).take(16));

    offsets
        .iter()
        .enumerate()
        .map(|(i, &dz)| standing(i as u64 * FRAME_US).translated(Vec3::new(0.0, 0.0, dz)))
        .collect()
}

/// Shifts every frame's timestamp by `start_us`.
pub fn starting_at(frames: Vec<Skeleton>, start_us: u64) -> Vec<Skeleton> {
    frames
        .into_iter()
        .map(|mut frame| {
            frame.timestamp_us += start_us;
            frame
        })
        .collect()
}

/// Pause between actions in [`session`]; long enough that the pose jump
/// back to the start position reads as slow drift.
pub const SESSION_GAP_US: u64 = 3_000_000;

/// Right kick, header, abandoned left wind-up and left kick, separated by
/// [`SESSION_GAP_US`].
pub fn session() -> Vec<Skeleton> {
    let mut frames = kick(DominantLimb::Right);
    let next = |frames: &Vec<Skeleton>| frames.last().map(|f| f.timestamp_us + SESSION_GAP_US).unwrap_or(0);

    let start = next(&frames);
    frames.extend(starting_at(header(), start));
    let start = next(&frames);
    frames.extend(starting_at(abandoned_windup(DominantLimb::Left), start));
    let start = next(&frames);
    frames.extend(starting_at(kick(DominantLimb::Left), start));
    frames
}

/// Moves ankle and foot of `limb` by `dz` along Z; the knee stays on the
/// hip-ankle line so the leg is straight.
fn swing_leg(mut skeleton: Skeleton, limb: DominantLimb, dz: f32) -> Skeleton {
    let (hip, knee, ankle, foot) = match limb {
        DominantLimb::Left => (JointId::HipLeft, JointId::KneeLeft, JointId::AnkleLeft, JointId::FootLeft),
        _ => (JointId::HipRight, JointId::KneeRight, JointId::AnkleRight, JointId::FootRight),
    };
    let offset = Vec3::new(0.0, 0.0, dz);
    let ankle_pos = skeleton.position(ankle) + offset;
    let knee_pos = (skeleton.position(hip) + ankle_pos) * 0.5;
    let foot_pos = skeleton.position(foot) + offset;
    skeleton.set_joint(ankle, ankle_pos, Confidence::High);
    skeleton.set_joint(knee, knee_pos, Confidence::High);
    skeleton.set_joint(foot, foot_pos, Confidence::High);
    skeleton
}
