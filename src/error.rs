//! Error types for the gesture pipeline

use thiserror::Error;

/// Errors that can occur while processing frames or driving collaborators
#[derive(Debug, Error)]
pub enum GestureError {
    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("Classifier returned unknown label index: {0}")]
    UnknownLabelIndex(usize),

    #[error("Invalid feature length: expected {expected}, got {actual}")]
    InvalidFeatureLength { expected: usize, actual: usize },

    #[error("Speech synthesis failed: {0}")]
    Speech(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
