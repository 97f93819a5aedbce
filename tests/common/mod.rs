#![allow(dead_code, unused_imports)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from facemark for tests
pub use facemark::{
    Detection, DetectionOutcome, DetectionSession, DetectorError, DisplaySize, FaceDetector,
    FeatureKind, ImageSize, LandmarkSet, Point, RawDetection, Rect, ReplayDetector,
};
