pub mod normalize;
pub mod quality;
pub mod replay;
#[cfg(feature = "rustface")]
pub mod rustface_backend;
pub mod scale;

use image::DynamicImage;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{DetectorError, GeometryError};
use crate::models::{Detection, DisplaySize, ImageSize, RawDetection};
use scale::ScaledDetection;

/// External face/landmark detection capability.
///
/// Implementations report boxes normalized to the whole image and landmark
/// points normalized to their box, both with a bottom-left origin.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<RawDetection>, DetectorError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "detector"
    }
}

/// How a detection pass ended.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetectionOutcome {
    /// No pass has finished yet.
    #[default]
    Idle,
    Completed { faces: usize },
    Failed { reason: String },
}

/// Run the detector, keeping failure distinguishable from "no faces".
pub fn run_detection(detector: &dyn FaceDetector, image: &DynamicImage) -> (Vec<RawDetection>, DetectionOutcome) {
    if ImageSize::of(image).is_empty() {
        warn!(detector = detector.name(), "face detection skipped: image has no pixels");
        let reason = DetectorError::EmptyImage.to_string();
        return (Vec::new(), DetectionOutcome::Failed { reason });
    }
    match detector.detect(image) {
        Ok(raws) => {
            let faces = raws.len();
            (raws, DetectionOutcome::Completed { faces })
        }
        Err(e) => {
            warn!(detector = detector.name(), error = %e, "face detection failed");
            (Vec::new(), DetectionOutcome::Failed { reason: e.to_string() })
        }
    }
}

/// Adapter boundary: any failure is reported as zero detections.
pub fn detect_faces(detector: &dyn FaceDetector, image: &DynamicImage) -> Vec<RawDetection> {
    run_detection(detector, image).0
}

/// Detect, normalize and scale faces for a still image.
pub struct FacePipeline {
    detector: Box<dyn FaceDetector>,
}

impl FacePipeline {
    pub fn new(detector: Box<dyn FaceDetector>) -> Self {
        Self { detector }
    }

    pub fn detector(&self) -> &dyn FaceDetector {
        self.detector.as_ref()
    }

    /// Detect faces and convert them to image pixels, top-left origin.
    pub fn detect(&self, image: &DynamicImage) -> Vec<Detection> {
        let size = ImageSize::of(image);
        let raws = detect_faces(self.detector.as_ref(), image);
        let detections = normalize::normalize_all(&raws, size);
        info!(
            detector = self.detector.name(),
            width = size.width,
            height = size.height,
            faces = detections.len(),
            "detected {} face(s)",
            detections.len()
        );
        detections
    }

    /// Map detections of an image into a display region of the given size.
    pub fn layout(
        &self,
        detections: &[Detection],
        image: ImageSize,
        display: DisplaySize,
    ) -> Result<Vec<ScaledDetection>, GeometryError> {
        scale::scale_detections(detections, image, display)
    }

    /// Detect and lay out in one go.
    pub fn run(&self, image: &DynamicImage, display: DisplaySize) -> Result<Vec<ScaledDetection>, GeometryError> {
        let detections = self.detect(image);
        self.layout(&detections, ImageSize::of(image), display)
    }
}
