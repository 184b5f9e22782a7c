//! Motion phase detection and scoring
//!
//! ## Structure
//! - `history`: per-joint bounded sample buffers
//! - `profile`: canonical stages and the `ActionProfile` strategy trait
//! - `detector`: generic phase engine
//! - `kick` / `header`: profiles, analyzers and result types
//! - `scoring`: axis scores and weights

pub mod detector;
pub mod header;
pub mod history;
pub mod kick;
pub mod profile;
pub mod scoring;

pub use detector::PhaseDetector;
pub use header::{
    HeaderAnalyzer, HeaderDetector, HeaderPhase, HeaderProfile, HeaderQuality, HeaderResult, HeaderType,
};
pub use history::{JointHistories, JointSample, MotionHistory};
pub use kick::{KickAnalyzer, KickDetector, KickPhase, KickProfile, KickQuality, KickResult, KickType};
pub use profile::{ActionProfile, ActionTrace, AnalysisInput, DominantLimb, Stage};
pub use scoring::{AxisScores, ScoreWeights, TechniqueWeights};
