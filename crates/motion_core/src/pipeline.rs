//! Per-body pipelines
//!
//! A [`MotionPipeline`] runs the kick and header detectors side by side on
//! one tracked body. [`BodyPipelines`] keeps one pipeline per body id so
//! several players never share history.

use crate::config::MotionConfig;
use crate::events::{ActionEvent, ActionKind, ActionListener, BoxedListener};
use crate::motion::{HeaderDetector, KickDetector};
use crate::skeleton::Skeleton;
use fxhash::FxHashMap;

pub struct MotionPipeline {
    body_id: u32,
    kick: KickDetector,
    header: HeaderDetector,
    listeners: Vec<BoxedListener<ActionEvent>>,
    frames: u64,
}

impl MotionPipeline {
    pub fn new(body_id: u32, config: &MotionConfig) -> Self {
        Self {
            body_id,
            kick: KickDetector::with_config(config.kick, &config.history),
            header: HeaderDetector::with_config(config.header, &config.history),
            listeners: Vec::new(),
            frames: 0,
        }
    }

    /// Runs both detectors; returns the actions completed on this frame.
    pub fn process_frame(&mut self, skeleton: &Skeleton) -> Vec<ActionEvent> {
        self.frames += 1;
        let mut events = Vec::new();

        if let Some(kick) = self.kick.process_frame(skeleton) {
            events.push(ActionEvent { body_id: self.body_id, action: ActionKind::Kick(kick) });
        }
        if let Some(header) = self.header.process_frame(skeleton) {
            events.push(ActionEvent { body_id: self.body_id, action: ActionKind::Header(header) });
        }

        for event in &events {
            for listener in self.listeners.iter_mut() {
                listener.on_action(*event);
            }
        }
        events
    }

    pub fn add_listener<L>(&mut self, listener: L)
    where
        L: ActionListener<ActionEvent> + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn body_id(&self) -> u32 {
        self.body_id
    }

    pub fn kick(&self) -> &KickDetector {
        &self.kick
    }

    pub fn kick_mut(&mut self) -> &mut KickDetector {
        &mut self.kick
    }

    pub fn header(&self) -> &HeaderDetector {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut HeaderDetector {
        &mut self.header
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    /// Resets both detectors; histories survive.
    pub fn reset(&mut self) {
        self.kick.reset();
        self.header.reset();
    }
}

/// One pipeline per tracked body id
pub struct BodyPipelines {
    config: MotionConfig,
    pipelines: FxHashMap<u32, MotionPipeline>,
    listeners: Vec<BoxedListener<ActionEvent>>,
}

impl BodyPipelines {
    pub fn new(config: MotionConfig) -> Self {
        Self { config, pipelines: FxHashMap::default(), listeners: Vec::new() }
    }

    /// Routes a snapshot to its body's pipeline, creating it on first sight.
    pub fn process_frame(&mut self, body_id: u32, skeleton: &Skeleton) -> Vec<ActionEvent> {
        let config = &self.config;
        let pipeline = self.pipelines.entry(body_id).or_insert_with(|| {
            log::debug!("tracking new body {}", body_id);
            MotionPipeline::new(body_id, config)
        });

        let events = pipeline.process_frame(skeleton);
        for event in &events {
            for listener in self.listeners.iter_mut() {
                listener.on_action(*event);
            }
        }
        events
    }

    /// Listener for every body, including ones not yet seen.
    pub fn add_listener<L>(&mut self, listener: L)
    where
        L: ActionListener<ActionEvent> + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Drops a body that left the scene. Returns whether it was tracked.
    pub fn remove(&mut self, body_id: u32) -> bool {
        let removed = self.pipelines.remove(&body_id).is_some();
        if removed {
            log::debug!("body {} left", body_id);
        }
        removed
    }

    /// Keeps only the listed bodies.
    pub fn retain_bodies(&mut self, active: &[u32]) {
        self.pipelines.retain(|id, _| active.contains(id));
    }

    pub fn get(&self, body_id: u32) -> Option<&MotionPipeline> {
        self.pipelines.get(&body_id)
    }

    pub fn get_mut(&mut self, body_id: u32) -> Option<&mut MotionPipeline> {
        self.pipelines.get_mut(&body_id)
    }

    /// Sorted ascending.
    pub fn body_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.pipelines.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }
}
