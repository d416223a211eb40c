//! Pipeline configuration
//!
//! Every field has a default matching the trained model and the shop floor
//! setup, so an empty JSON object is a valid configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::ProductCatalog;
use crate::classifier::LabelTable;
use crate::debouncer::{
    DEFAULT_COMMIT_THRESHOLD, DEFAULT_COOLDOWN_MS, DEFAULT_WINDOW_CAPACITY, MAX_WINDOW_CAPACITY,
};
use crate::error::GestureError;
use crate::normalizer::{DEFAULT_FEATURE_LENGTH, MAX_FEATURE_LENGTH};

/// Symbol reported for frames that commit nothing
pub const DEFAULT_PLACEHOLDER: &str = "---";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Length of the feature vector fed to the classifier
    pub feature_length: usize,
    /// Number of recent labels kept for the majority vote
    pub window_capacity: usize,
    /// A label commits when it occurs more than this many times in the window
    pub commit_threshold: usize,
    /// Minimum time between two commits
    pub cooldown_ms: u64,
    /// Classifier index → label table
    pub labels: LabelTable,
    pub catalog: ProductCatalog,
    pub placeholder: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            feature_length: DEFAULT_FEATURE_LENGTH,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            commit_threshold: DEFAULT_COMMIT_THRESHOLD,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            labels: LabelTable::default(),
            catalog: ProductCatalog::default(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self, GestureError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, GestureError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn validate(&self) -> Result<(), GestureError> {
        if self.feature_length == 0 {
            return Err(GestureError::Config(
                "feature_length must be positive".to_string(),
            ));
        }
        if self.feature_length > MAX_FEATURE_LENGTH {
            return Err(GestureError::Config(format!(
                "feature_length ({}) exceeds {}",
                self.feature_length, MAX_FEATURE_LENGTH
            )));
        }
        if self.window_capacity == 0 {
            return Err(GestureError::Config(
                "window_capacity must be positive".to_string(),
            ));
        }
        if self.window_capacity > MAX_WINDOW_CAPACITY {
            return Err(GestureError::Config(format!(
                "window_capacity ({}) exceeds {}",
                self.window_capacity, MAX_WINDOW_CAPACITY
            )));
        }
        if self.commit_threshold >= self.window_capacity {
            return Err(GestureError::Config(format!(
                "commit_threshold ({}) must be below window_capacity ({})",
                self.commit_threshold, self.window_capacity
            )));
        }
        if self.labels.is_empty() {
            return Err(GestureError::Config("labels must not be empty".to_string()));
        }
        Ok(())
    }
}
