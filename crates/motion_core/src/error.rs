use thiserror::Error;

/// Errors raised outside the per-frame hot path.
///
/// Frame processing itself never fails: bad sensor data is skipped, stalls
/// are abandoned by timeout and ambiguous motions fall back to a default
/// classification. Only configuration and the replay/IO surface report errors.
#[derive(Error, Debug)]
pub enum MotionError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] validator::ValidationErrors),

    #[error("Invalid {name} weights: expected sum 1.0, found {sum:.4}")]
    InvalidWeights { name: &'static str, sum: f32 },

    #[error("Negative {name} weight: {value}")]
    NegativeWeight { name: &'static str, value: f32 },

    #[error("Conflicting settings: {0}")]
    ConflictingSettings(String),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed frame record on line {line}: {source}")]
    Replay {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, MotionError>;
