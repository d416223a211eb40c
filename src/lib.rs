//! Gesture Basket - debounced hand-gesture symbols for a shopping basket
//!
//! Gesture Basket turns a noisy per-frame stream of hand-gesture classifications
//! into discrete symbol commits through a deterministic pipeline: landmark
//! detection → normalization → classification → stabilization → interpretation.
//!
//! ## Modules
//!
//! - **Pipeline**: Per-frame entry point holding the session lock for a whole frame
//! - **Session**: Shared basket/text state and the accessors request handlers use
//! - **Collaborators**: Detector, classifier and speech seams for external services

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod debouncer;
pub mod detector;
pub mod error;
pub mod interpreter;
pub mod normalizer;
pub mod pipeline;
pub mod session;
pub mod speech;
pub mod types;

pub use catalog::{Product, ProductCatalog};
pub use classifier::{CentroidClassifier, ClassifierAdapter, GestureClassifier, LabelTable};
pub use config::PipelineConfig;
pub use debouncer::StabilizationDebouncer;
pub use detector::{LandmarkDetector, RecordedFrame, RecordedLandmarks};
pub use error::GestureError;
pub use interpreter::SymbolInterpreter;
pub use normalizer::FeatureNormalizer;
pub use pipeline::FramePipeline;
pub use session::{SessionState, SharedSession};
pub use speech::{CommandSpeech, LogSpeech, SpeechDispatcher, SpeechService};
pub use types::{BasketItem, FrameOutcome, Interpretation, LandmarkSet, SessionSnapshot};

/// Crate version reported by the CLI
pub const BASKET_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "gesture-basket";
