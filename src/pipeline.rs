//! Pipeline orchestration
//!
//! This module provides the per-frame entry point. It runs one frame through
//! the full pipeline: landmark detection → normalization → classification →
//! stabilization → interpretation, while holding the session lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::catalog::ProductCatalog;
use crate::classifier::{ClassifierAdapter, GestureClassifier};
use crate::config::PipelineConfig;
use crate::debouncer::StabilizationDebouncer;
use crate::detector::LandmarkDetector;
use crate::error::GestureError;
use crate::interpreter::SymbolInterpreter;
use crate::normalizer::FeatureNormalizer;
use crate::session::{SessionState, SharedSession};
use crate::speech::SpeechDispatcher;
use crate::types::{FrameOutcome, LandmarkSet};

/// Frame processor owning the detector and classifier
pub struct FramePipeline<D, C> {
    detector: D,
    normalizer: FeatureNormalizer,
    classifier: ClassifierAdapter<C>,
    interpreter: SymbolInterpreter,
    session: SharedSession,
    placeholder: String,
}

impl<D, C> FramePipeline<D, C>
where
    D: LandmarkDetector,
    C: GestureClassifier,
{
    /// Build a pipeline and a fresh session from `config`.
    ///
    /// The first commit cooldown starts at `started_at`.
    pub fn new(
        config: &PipelineConfig,
        detector: D,
        classifier: C,
        speech: SpeechDispatcher,
        started_at: DateTime<Utc>,
    ) -> Result<Self, GestureError> {
        config.validate()?;

        let catalog = Arc::new(config.catalog.clone());
        let debouncer = StabilizationDebouncer::new(
            config.window_capacity,
            config.commit_threshold,
            config.cooldown(),
            started_at,
        );
        let session = SharedSession::new(
            SessionState::new(debouncer),
            Arc::clone(&catalog),
            speech.clone(),
        );

        Ok(Self {
            detector,
            normalizer: FeatureNormalizer::with_length(config.feature_length),
            classifier: ClassifierAdapter::new(
                classifier,
                config.labels.clone(),
                config.feature_length,
            ),
            interpreter: SymbolInterpreter::new(catalog, speech),
            session,
            placeholder: config.placeholder.clone(),
        })
    }

    /// Handle for request handlers; shares state with this pipeline
    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    pub fn catalog(&self) -> &ProductCatalog {
        self.session.catalog()
    }

    /// Process one frame using the wall clock
    pub fn process_frame(&self, frame: D::Frame) -> FrameOutcome<D::Frame> {
        self.process_frame_at(frame, Utc::now())
    }

    /// Process one frame as if it arrived at `now`.
    ///
    /// Per-frame failures are logged and dropped; the frame is always returned.
    pub fn process_frame_at(&self, frame: D::Frame, now: DateTime<Utc>) -> FrameOutcome<D::Frame> {
        let mut state = self.session.lock();

        if state.paused {
            return self.passthrough(frame, None);
        }

        // Stage 1: Detect hand landmarks
        let landmarks = match self.detector.detect(&frame) {
            Some(landmarks) => landmarks,
            None => return self.passthrough(frame, None),
        };

        // Stage 2: Normalize into a fixed-length feature vector
        let features = self.normalizer.normalize(&landmarks);

        // Stage 3: Classify
        let label = match self.classifier.classify(&features) {
            Ok(label) => label,
            Err(e) => {
                warn!(error = %e, "frame dropped: classification failed");
                return self.passthrough(frame, Some(landmarks));
            }
        };

        // Stage 4: Stabilize
        let commit = match state.debouncer.observe(&label, now) {
            Some(commit) => commit,
            None => return self.passthrough(frame, Some(landmarks)),
        };

        debug!(label = %commit.label, at = %commit.committed_at, "symbol committed");

        // Stage 5: Interpret
        let interpretation = self.interpreter.interpret(&mut state, &commit.label);

        FrameOutcome {
            frame,
            overlay: Some(landmarks),
            symbol: commit.label,
            interpretation: Some(interpretation),
        }
    }

    fn passthrough(
        &self,
        frame: D::Frame,
        overlay: Option<LandmarkSet>,
    ) -> FrameOutcome<D::Frame> {
        FrameOutcome {
            frame,
            overlay,
            symbol: self.placeholder.clone(),
            interpretation: None,
        }
    }
}
