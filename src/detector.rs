//! Hand landmark detection boundary
//!
//! The detector that turns a video frame into hand landmarks lives outside this
//! crate. [`LandmarkDetector`] is the seam; [`RecordedLandmarks`] replays frames
//! whose landmarks were captured ahead of time (NDJSON, one frame per line).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GestureError;
use crate::types::LandmarkSet;

/// Produces the landmarks of one hand from a frame, or `None` when no hand is visible
pub trait LandmarkDetector {
    type Frame;

    fn detect(&self, frame: &Self::Frame) -> Option<LandmarkSet>;
}

/// A frame with pre-computed landmarks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Capture time; replay uses it as the pipeline clock
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// `[x, y]` pairs in detector order; absent or null when no hand was found
    #[serde(default)]
    pub landmarks: Option<Vec<[f64; 2]>>,
    /// Opaque reference to the encoded image, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl RecordedFrame {
    pub fn new(timestamp: DateTime<Utc>, landmarks: Option<Vec<[f64; 2]>>) -> Self {
        Self {
            timestamp: Some(timestamp),
            landmarks,
            image: None,
        }
    }

    /// Reject coordinates that are NaN or infinite
    pub fn validate(&self) -> Result<(), GestureError> {
        if let Some(points) = &self.landmarks {
            if let Some(index) = points
                .iter()
                .position(|[x, y]| !x.is_finite() || !y.is_finite())
            {
                return Err(GestureError::ParseError(format!(
                    "landmark {} is not a finite coordinate",
                    index
                )));
            }
        }
        Ok(())
    }
}

/// Detector that reads the landmarks stored in a [`RecordedFrame`]
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordedLandmarks;

impl LandmarkDetector for RecordedLandmarks {
    type Frame = RecordedFrame;

    fn detect(&self, frame: &RecordedFrame) -> Option<LandmarkSet> {
        frame
            .landmarks
            .as_ref()
            .map(|points| points.iter().map(|[x, y]| (*x, *y)).collect())
    }
}

/// Parse one frame record per non-empty line
pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RecordedFrame>, GestureError> {
    let mut frames = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let frame: RecordedFrame = serde_json::from_str(trimmed).map_err(|e| {
            GestureError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
        })?;
        frame.validate().map_err(|e| {
            GestureError::ParseError(format!("Invalid frame on line {}: {}", line_num + 1, e))
        })?;
        frames.push(frame);
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_recorded_hand() {
        let frame: RecordedFrame =
            serde_json::from_str(r#"{"landmarks": [[0.5, 0.5], [0.7, 0.9]]}"#).unwrap();
        let landmarks = RecordedLandmarks.detect(&frame).unwrap();
        assert_eq!(landmarks.len(), 2);
        assert_eq!(landmarks.points()[1].y, 0.9);
    }

    #[test]
    fn test_no_hand() {
        let frame: RecordedFrame =
            serde_json::from_str(r#"{"timestamp": "2024-01-15T12:00:00Z", "landmarks": null}"#)
                .unwrap();
        assert!(RecordedLandmarks.detect(&frame).is_none());

        let bare: RecordedFrame = serde_json::from_str("{}").unwrap();
        assert!(RecordedLandmarks.detect(&bare).is_none());
    }

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let input = r#"
{"timestamp": "2024-01-15T12:00:00Z", "landmarks": [[0.1, 0.2]]}

{"timestamp": "2024-01-15T12:00:00.033Z"}
"#;
        let frames = parse_ndjson(input).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames[1].landmarks.is_none());
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let input = "{\"landmarks\": []}\nnot json\n";
        let err = parse_ndjson(input).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
