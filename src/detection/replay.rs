//! Detector that replays recorded raw detections from JSON.

use std::path::Path;

use image::DynamicImage;
use serde_json::Value;
use tracing::warn;

use crate::detection::FaceDetector;
use crate::error::DetectorError;
use crate::models::RawDetection;

/// Returns the same recorded detections for every image.
///
/// The document is a JSON array of raw detections. Elements that don't match
/// the raw detection shape are dropped on load; one bad record never costs
/// the rest of the pass.
#[derive(Debug, Clone, Default)]
pub struct ReplayDetector {
    detections: Vec<RawDetection>,
}

impl ReplayDetector {
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self { detections }
    }

    pub fn from_json(json: &str) -> Result<Self, DetectorError> {
        let values: Vec<Value> = serde_json::from_str(json)?;
        let detections = values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value::<RawDetection>(value) {
                Ok(raw) => Some(raw),
                Err(e) => {
                    warn!(index, error = %e, "skipping malformed raw detection");
                    None
                }
            })
            .collect();
        Ok(Self { detections })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DetectorError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn detections(&self) -> &[RawDetection] {
        &self.detections
    }
}

impl FaceDetector for ReplayDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<RawDetection>, DetectorError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DetectorError::EmptyImage);
        }
        Ok(self.detections.clone())
    }

    fn name(&self) -> &str {
        "replay"
    }
}
