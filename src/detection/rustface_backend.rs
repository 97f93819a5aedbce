use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::DynamicImage;

use crate::detection::FaceDetector;
use crate::error::DetectorError;
use crate::models::{RawDetection, Rect};

/// SeetaFace frontal detector from the `rustface` crate.
///
/// SeetaFace reports top-left pixel boxes and no landmarks, so results are
/// re-expressed in the normalized bottom-left convention every other
/// detector uses.
pub struct RustfaceDetector {
    model: rustface::Model,
    min_face_size: u32,
}

impl RustfaceDetector {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DetectorError> {
        let reader = BufReader::new(File::open(path)?);
        let model = rustface::read_model(reader).map_err(|e| DetectorError::Model(e.to_string()))?;
        Ok(Self {
            model,
            min_face_size: 20,
        })
    }

    pub fn with_min_face_size(mut self, size: u32) -> Self {
        self.min_face_size = size;
        self
    }
}

/// Pixel box with a top-left origin to the detector-native normalized form.
fn to_native(x: f64, y: f64, width: f64, height: f64, image_w: f64, image_h: f64) -> Rect {
    Rect {
        x: x / image_w,
        y: 1.0 - (y + height) / image_h,
        width: width / image_w,
        height: height / image_h,
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<RawDetection>, DetectorError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(DetectorError::EmptyImage);
        }

        let gray = image.to_luma8();
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                RawDetection {
                    bounding_box: to_native(
                        bbox.x() as f64,
                        bbox.y() as f64,
                        bbox.width() as f64,
                        bbox.height() as f64,
                        width as f64,
                        height as f64,
                    ),
                    // SeetaFace scores are unbounded; squash into (0, 1).
                    confidence: (1.0 - (-face.score() / 10.0).exp()).max(0.0) as f32,
                    landmarks: None,
                }
            })
            .collect())
    }

    fn name(&self) -> &str {
        "rustface"
    }
}
