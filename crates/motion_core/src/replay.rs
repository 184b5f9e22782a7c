//! Frame recording and batch replay
//!
//! Frames are stored as JSON Lines, one tracked body per line. Only joints
//! with some confidence are written. Replay pushes records through a fresh
//! [`BodyPipelines`] and summarizes what was detected.

use crate::config::MotionConfig;
use crate::error::{MotionError, Result};
use crate::events::{ActionEvent, ActionKind};
use crate::math::Vec3;
use crate::pipeline::BodyPipelines;
use crate::skeleton::{Confidence, JointId, Skeleton};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointRecord {
    pub joint: JointId,
    /// Position (mm)
    pub position: [f32; 3],
    pub confidence: Confidence,
}

/// One body in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    #[serde(default)]
    pub body_id: u32,
    pub timestamp_us: u64,
    pub joints: Vec<JointRecord>,
}

impl FrameRecord {
    pub fn from_skeleton(body_id: u32, skeleton: &Skeleton) -> Self {
        let joints = JointId::ALL
            .iter()
            .filter_map(|&joint| {
                let reading = skeleton.joint(joint);
                (reading.confidence != Confidence::None).then(|| JointRecord {
                    joint,
                    position: [reading.position.x, reading.position.y, reading.position.z],
                    confidence: reading.confidence,
                })
            })
            .collect();
        Self { body_id, timestamp_us: skeleton.timestamp_us, joints }
    }

    /// Joints missing from the record come back untracked.
    pub fn to_skeleton(&self) -> Skeleton {
        let mut skeleton = Skeleton::new(self.timestamp_us);
        for record in &self.joints {
            let [x, y, z] = record.position;
            skeleton.set_joint(record.joint, Vec3::new(x, y, z), record.confidence);
        }
        skeleton
    }
}

/// Parses JSON Lines; blank lines are skipped.
pub fn read_frames<R: BufRead>(reader: R) -> Result<Vec<FrameRecord>> {
    let mut frames = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .map_err(|source| MotionError::Replay { line: index + 1, source })?;
        frames.push(record);
    }
    Ok(frames)
}

pub fn write_frames<W: Write>(mut writer: W, frames: &[FrameRecord]) -> Result<()> {
    for frame in frames {
        serde_json::to_writer(&mut writer, frame)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_frames_from_path(path: impl AsRef<Path>) -> Result<Vec<FrameRecord>> {
    let file = File::open(path.as_ref())?;
    read_frames(BufReader::new(file))
}

pub fn write_frames_to_path(path: impl AsRef<Path>, frames: &[FrameRecord]) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_frames(BufWriter::new(file), frames)
}

/// Runs every record through fresh per-body pipelines, in order.
pub fn replay_frames(frames: &[FrameRecord], config: &MotionConfig) -> Vec<ActionEvent> {
    let mut bodies = BodyPipelines::new(config.clone());
    let mut events = Vec::new();
    for frame in frames {
        events.extend(bodies.process_frame(frame.body_id, &frame.to_skeleton()));
    }
    log::info!("replayed {} frames, {} actions", frames.len(), events.len());
    events
}

// ============================================================================
// Summary
// ============================================================================

/// Aggregate over a replayed session
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SessionSummary {
    pub kicks: usize,
    pub headers: usize,
    /// Completed actions per type name
    pub by_type: BTreeMap<String, usize>,
    pub average_ball_speed_kmh: f32,
    pub best_ball_speed_kmh: f32,
    pub average_kick_score: f32,
    pub average_header_score: f32,
    pub best_score: f32,
}

impl SessionSummary {
    pub fn from_events(events: &[ActionEvent]) -> Self {
        let mut summary = SessionSummary::default();
        let mut ball_speed_sum = 0.0;
        let mut kick_score_sum = 0.0;
        let mut header_score_sum = 0.0;

        for event in events {
            let type_name = match &event.action {
                ActionKind::Kick(kick) => {
                    summary.kicks += 1;
                    ball_speed_sum += kick.quality.ball_speed_kmh;
                    kick_score_sum += kick.quality.overall;
                    summary.best_ball_speed_kmh = summary.best_ball_speed_kmh.max(kick.quality.ball_speed_kmh);
                    kick.kick_type.name()
                }
                ActionKind::Header(header) => {
                    summary.headers += 1;
                    header_score_sum += header.quality.overall;
                    header.header_type.name()
                }
            };
            *summary.by_type.entry(type_name.to_string()).or_insert(0) += 1;
            summary.best_score = summary.best_score.max(event.action.overall_score());
        }

        if summary.kicks > 0 {
            summary.average_ball_speed_kmh = ball_speed_sum / summary.kicks as f32;
            summary.average_kick_score = kick_score_sum / summary.kicks as f32;
        }
        if summary.headers > 0 {
            summary.average_header_score = header_score_sum / summary.headers as f32;
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.kicks + self.headers
    }
}
