//! Core types for the gesture pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: landmarks, feature vectors, labels, commits and the read-only
//! snapshots handed to the boundary layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Control symbol that confirms the pending product
pub const ADD_SYMBOL: &str = "Add";

/// Control symbol that pops the most recent basket item
pub const REMOVE_SYMBOL: &str = "Remove";

/// Word separator symbol
pub const SPACE_SYMBOL: &str = " ";

/// Sentence terminator symbol
pub const PERIOD_SYMBOL: &str = ".";

/// A single tracked hand point in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Landmark {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Landmarks for one detected hand, in detector order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<(f64, f64)> for LandmarkSet {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().map(Landmark::from).collect(),
        }
    }
}

/// Translation-invariant feature vector of fixed length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub(crate) fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A symbol from the gesture alphabet
pub type Label = String;

/// A committed symbol emitted by the debouncer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub label: Label,
    pub committed_at: DateTime<Utc>,
}

/// Effect of interpreting a committed symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Interpretation {
    /// A product was selected and awaits confirmation
    ProductSelected { product: String },
    /// The pending product was appended to the basket
    ProductAdded { product: String },
    /// "Add" arrived with nothing pending
    NothingPending,
    /// The last basket item was removed
    ProductRemoved { product: String },
    /// "Remove" arrived with an empty basket
    BasketEmpty,
    /// The word buffer was flushed into the sentence and spoken
    WordFlushed { word: String, terminator: String },
    /// A separator arrived with a blank word buffer
    BlankWord,
    /// A character was appended to the word buffer
    CharacterAppended { character: String },
}

/// A basket entry resolved against the product catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketItem {
    pub name: String,
    pub image: String,
    pub price: f64,
}

/// Read-only view of the session handed to the boundary layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub pending_product: Option<String>,
    pub basket: Vec<BasketItem>,
    pub word_buffer: String,
    pub sentence: String,
    pub last_committed: Option<Label>,
    pub paused: bool,
    pub taken_at: DateTime<Utc>,
}

/// Result of running one frame through the pipeline
#[derive(Debug, Clone)]
pub struct FrameOutcome<F> {
    /// The frame, passed through unchanged
    pub frame: F,
    /// Landmarks to draw over the frame, if a hand was detected
    pub overlay: Option<LandmarkSet>,
    /// Symbol committed on this frame, or the placeholder
    pub symbol: String,
    /// Effect of the commit, if one happened
    pub interpretation: Option<Interpretation>,
}

impl<F> FrameOutcome<F> {
    pub fn committed(&self) -> bool {
        self.interpretation.is_some()
    }
}
