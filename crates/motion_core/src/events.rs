//! Result delivery
//!
//! Detectors hand every completed action to their listeners by value. The
//! game layer, a UI thread or a recorder subscribe here; the core keeps no
//! reference to what it emitted.

use crate::motion::header::HeaderResult;
use crate::motion::kick::KickResult;
use serde::Serialize;
use std::sync::mpsc::Sender;

/// Receives one value per completed action.
pub trait ActionListener<T> {
    fn on_action(&mut self, result: T);
}

impl<T, F> ActionListener<T> for F
where
    F: FnMut(T),
{
    fn on_action(&mut self, result: T) {
        self(result)
    }
}

/// Forwards results to another thread. A dropped receiver is logged, not fatal.
impl<T> ActionListener<T> for Sender<T> {
    fn on_action(&mut self, result: T) {
        if self.send(result).is_err() {
            log::warn!("action listener channel closed; result dropped");
        }
    }
}

/// Boxed listener as stored by detectors and pipelines.
pub type BoxedListener<T> = Box<dyn ActionListener<T> + Send>;

/// Completed action of either kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum ActionKind {
    Kick(KickResult),
    Header(HeaderResult),
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Kick(_) => "kick",
            ActionKind::Header(_) => "header",
        }
    }

    pub fn timestamp_us(&self) -> u64 {
        match self {
            ActionKind::Kick(k) => k.timestamp_us,
            ActionKind::Header(h) => h.timestamp_us,
        }
    }

    pub fn overall_score(&self) -> f32 {
        match self {
            ActionKind::Kick(k) => k.quality.overall,
            ActionKind::Header(h) => h.quality.overall,
        }
    }
}

/// Action attributed to a tracked body
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActionEvent {
    pub body_id: u32,
    pub action: ActionKind,
}
