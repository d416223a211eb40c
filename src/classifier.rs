//! Gesture classification
//!
//! The trained model is a black box behind [`GestureClassifier`]: it maps a
//! feature vector to a class index. [`ClassifierAdapter`] validates the input,
//! calls the model and maps the index to a label through a fixed [`LabelTable`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GestureError;
use crate::types::{FeatureVector, Label, ADD_SYMBOL, REMOVE_SYMBOL};

/// A trained model mapping a feature vector to a class index
pub trait GestureClassifier: Send {
    fn predict(&self, features: &[f64]) -> Result<usize, GestureError>;
}

impl<C: GestureClassifier + ?Sized> GestureClassifier for Box<C> {
    fn predict(&self, features: &[f64]) -> Result<usize, GestureError> {
        (**self).predict(features)
    }
}

/// Class index → label lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelTable {
    labels: Vec<Label>,
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::new(
            [
                "Apple", "Banana", "Potatoes", "Milk", "Bread", "Carrot", "Tomato", "Orange",
                ADD_SYMBOL, REMOVE_SYMBOL,
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
    }
}

impl LabelTable {
    pub fn new(labels: Vec<Label>) -> Self {
        Self { labels }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

/// Wraps a classifier with input validation and label lookup
pub struct ClassifierAdapter<C> {
    classifier: C,
    labels: LabelTable,
    feature_length: usize,
}

impl<C: GestureClassifier> ClassifierAdapter<C> {
    pub fn new(classifier: C, labels: LabelTable, feature_length: usize) -> Self {
        Self {
            classifier,
            labels,
            feature_length,
        }
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Classify one feature vector into a label
    pub fn classify(&self, features: &FeatureVector) -> Result<Label, GestureError> {
        if features.len() != self.feature_length {
            return Err(GestureError::InvalidFeatureLength {
                expected: self.feature_length,
                actual: features.len(),
            });
        }

        let index = self.classifier.predict(features.as_slice())?;

        self.labels
            .get(index)
            .map(str::to_string)
            .ok_or(GestureError::UnknownLabelIndex(index))
    }
}

/// Nearest-centroid model loaded from JSON
///
/// Each centroid is the mean feature vector of one class, in class index order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidClassifier {
    centroids: Vec<Vec<f64>>,
}

impl CentroidClassifier {
    pub fn new(centroids: Vec<Vec<f64>>) -> Self {
        Self { centroids }
    }

    pub fn from_json(json: &str) -> Result<Self, GestureError> {
        let model: Self = serde_json::from_str(json)?;
        if model.centroids.is_empty() {
            return Err(GestureError::Classification(
                "model has no centroids".to_string(),
            ));
        }
        Ok(model)
    }

    pub fn from_file(path: &Path) -> Result<Self, GestureError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn class_count(&self) -> usize {
        self.centroids.len()
    }

    /// Feature length of the first centroid
    pub fn feature_length(&self) -> Option<usize> {
        self.centroids.first().map(Vec::len)
    }
}

impl GestureClassifier for CentroidClassifier {
    fn predict(&self, features: &[f64]) -> Result<usize, GestureError> {
        let mut best: Option<(usize, f64)> = None;

        for (index, centroid) in self.centroids.iter().enumerate() {
            if centroid.len() != features.len() {
                return Err(GestureError::Classification(format!(
                    "centroid {} has {} features, input has {}",
                    index,
                    centroid.len(),
                    features.len()
                )));
            }

            let distance: f64 = centroid
                .iter()
                .zip(features)
                .map(|(c, f)| (c - f) * (c - f))
                .sum();

            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }

        best.map(|(index, _)| index)
            .ok_or_else(|| GestureError::Classification("model has no centroids".to_string()))
    }
}
