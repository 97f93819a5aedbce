use serde::Serialize;
use uuid::Uuid;

use crate::detection::quality::DetectionQuality;
use crate::error::GeometryError;
use crate::models::{DisplaySize, Detection, ImageSize, LandmarkSet, Point, Rect};

/// Per-axis factors from image pixels to display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleFactor {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactor {
    /// Axes scale independently; a display region with a different aspect
    /// ratio than the image distorts the overlay accordingly.
    pub fn between(image: ImageSize, display: DisplaySize) -> Result<Self, GeometryError> {
        if image.is_empty() {
            return Err(GeometryError::EmptyImage);
        }
        Ok(Self {
            x: display.width / image.width as f64,
            y: display.height / image.height as f64,
        })
    }

    pub fn apply_point(&self, p: Point) -> Point {
        Point::new(p.x * self.x, p.y * self.y)
    }

    pub fn apply_rect(&self, r: &Rect) -> Rect {
        Rect::new(r.x * self.x, r.y * self.y, r.width * self.x, r.height * self.y)
    }
}

/// A detection in display coordinates, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledDetection {
    pub id: Uuid,
    pub bounding_box: Rect,
    pub landmarks: Option<LandmarkSet>,
    pub confidence: f32,
    pub quality: DetectionQuality,
}

impl ScaledDetection {
    pub fn color(&self) -> image::Rgba<u8> {
        self.quality.color()
    }
}

pub fn scale_detection(detection: &Detection, factor: ScaleFactor) -> ScaledDetection {
    ScaledDetection {
        id: detection.id,
        bounding_box: factor.apply_rect(&detection.bounding_box),
        landmarks: detection
            .landmarks
            .as_ref()
            .map(|set| set.map_points(|p| factor.apply_point(p))),
        confidence: detection.confidence,
        quality: DetectionQuality::from_confidence(detection.confidence),
    }
}

/// Scale every detection of one image into a display region. Recomputed on
/// every call; nothing is cached between layouts.
pub fn scale_detections(
    detections: &[Detection],
    image: ImageSize,
    display: DisplaySize,
) -> Result<Vec<ScaledDetection>, GeometryError> {
    let factor = ScaleFactor::between(image, display)?;
    Ok(detections.iter().map(|d| scale_detection(d, factor)).collect())
}
