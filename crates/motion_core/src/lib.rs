//! # motion_core - Kiosk Football Motion Core
//!
//! Turns a stream of tracked skeletons (~30Hz) into classified, scored
//! kicks and headers.
//!
//! ## Features
//! - Confidence-gated per-joint motion history
//! - One generic phase engine, with kick and header profiles
//! - Decision-tree classification and a weighted 0~100 quality model
//! - Listener callbacks, per-body pipelines and JSONL replay
//!
//! ## Usage
//! ```rust
//! use motion_core::{synthetic, DominantLimb, KickDetector};
//!
//! let mut detector = KickDetector::default();
//! let results: Vec<_> = synthetic::kick(DominantLimb::Right)
//!     .iter()
//!     .filter_map(|frame| detector.process_frame(frame))
//!     .collect();
//! assert_eq!(results.len(), 1);
//! ```

// Presets tweak a few fields of a default config
#![allow(clippy::field_reassign_with_default)]
// Doc formatting lints - purely cosmetic
#![allow(clippy::doc_lazy_continuation)]

pub mod config;
pub mod error;
pub mod events;
pub mod math;
pub mod motion;
pub mod pipeline;
pub mod replay;
pub mod skeleton;
pub mod synthetic;

pub use config::{HeaderConfig, HistoryConfig, KickConfig, MotionConfig, PhaseTimings, TargetZone};
pub use error::{MotionError, Result};
pub use events::{ActionEvent, ActionKind, ActionListener};
pub use math::Vec3;
pub use motion::{
    ActionProfile, AxisScores, DominantLimb, HeaderDetector, HeaderPhase, HeaderResult, HeaderType,
    KickDetector, KickPhase, KickResult, KickType, MotionHistory, PhaseDetector, ScoreWeights,
};
pub use pipeline::{BodyPipelines, MotionPipeline};
pub use replay::{FrameRecord, SessionSummary};
pub use skeleton::{Confidence, JointId, Skeleton};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
