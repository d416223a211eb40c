//! Landmark normalization
//!
//! This module turns a hand's landmark geometry into the fixed-length feature
//! vector the classifier expects.
//! - Coordinates are shifted by the per-axis minimum (translation invariance)
//! - Output is zero-padded or truncated to the target length

use crate::types::{FeatureVector, LandmarkSet};

/// Feature length expected by the classifier (21 landmarks × 2 axes)
pub const DEFAULT_FEATURE_LENGTH: usize = 42;

/// Largest feature vector a configuration may ask for
pub const MAX_FEATURE_LENGTH: usize = 4096;

/// Normalizer for converting landmark sets to feature vectors
#[derive(Debug, Clone, Copy)]
pub struct FeatureNormalizer {
    target_length: usize,
}

impl Default for FeatureNormalizer {
    fn default() -> Self {
        Self::with_length(DEFAULT_FEATURE_LENGTH)
    }
}

impl FeatureNormalizer {
    /// Create a normalizer producing vectors of `target_length` values
    pub fn with_length(target_length: usize) -> Self {
        Self { target_length }
    }

    pub fn target_length(&self) -> usize {
        self.target_length
    }

    /// Normalize a landmark set. Never fails; an empty set yields all zeros.
    pub fn normalize(&self, landmarks: &LandmarkSet) -> FeatureVector {
        let points = landmarks.points();
        let min_x = axis_min(points.iter().map(|p| p.x));
        let min_y = axis_min(points.iter().map(|p| p.y));

        let mut values: Vec<f64> = points
            .iter()
            .flat_map(|p| [p.x - min_x, p.y - min_y])
            .collect();

        // Detector landmark count is not guaranteed
        values.resize(self.target_length, 0.0);

        FeatureVector::from_values(values)
    }
}

/// Minimum of one axis, 0.0 when there are no points
fn axis_min(values: impl Iterator<Item = f64>) -> f64 {
    values
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.min(v))))
        .unwrap_or(0.0)
}
