use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A 2D point. Which space it lives in depends on the owner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle given by its origin corner and extent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn mid_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn mid_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Zero or negative extent on either axis.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Pixel dimensions of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn of(image: &image::DynamicImage) -> Self {
        Self::new(image.width(), image.height())
    }
}

/// Size of the region an image is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplaySize {
    pub width: f64,
    pub height: f64,
}

impl DisplaySize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Display size equal to the image's own pixel size (scale 1:1).
    pub fn native(image: ImageSize) -> Self {
        Self::new(image.width as f64, image.height as f64)
    }

    /// Largest size with the image's aspect ratio that fits inside `bounds`.
    pub fn fit_within(image: ImageSize, bounds: DisplaySize) -> Self {
        if image.is_empty() {
            return Self::new(0.0, 0.0);
        }
        let scale = (bounds.width / image.width as f64).min(bounds.height / image.height as f64);
        Self::new(image.width as f64 * scale, image.height as f64 * scale)
    }
}

/// The named point groups a landmark detector can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    LeftEye,
    RightEye,
    Nose,
    OuterLips,
    InnerLips,
    LeftEyebrow,
    RightEyebrow,
    FaceContour,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 8] = [
        FeatureKind::LeftEye,
        FeatureKind::RightEye,
        FeatureKind::LeftEyebrow,
        FeatureKind::RightEyebrow,
        FeatureKind::Nose,
        FeatureKind::OuterLips,
        FeatureKind::InnerLips,
        FeatureKind::FaceContour,
    ];

    /// Lip outlines and the face contour are drawn as paths through their points.
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            FeatureKind::OuterLips | FeatureKind::InnerLips | FeatureKind::FaceContour
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            FeatureKind::LeftEye => "left eye",
            FeatureKind::RightEye => "right eye",
            FeatureKind::Nose => "nose",
            FeatureKind::OuterLips => "outer lips",
            FeatureKind::InnerLips => "inner lips",
            FeatureKind::LeftEyebrow => "left eyebrow",
            FeatureKind::RightEyebrow => "right eyebrow",
            FeatureKind::FaceContour => "face contour",
        }
    }
}

/// Ordered landmark point groups of one face. A `None` group was not reported.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_eye: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_eye: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nose: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outer_lips: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_lips: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_eyebrow: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_eyebrow: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_contour: Option<Vec<Point>>,
}

impl LandmarkSet {
    pub fn group(&self, kind: FeatureKind) -> Option<&[Point]> {
        let group = match kind {
            FeatureKind::LeftEye => &self.left_eye,
            FeatureKind::RightEye => &self.right_eye,
            FeatureKind::Nose => &self.nose,
            FeatureKind::OuterLips => &self.outer_lips,
            FeatureKind::InnerLips => &self.inner_lips,
            FeatureKind::LeftEyebrow => &self.left_eyebrow,
            FeatureKind::RightEyebrow => &self.right_eyebrow,
            FeatureKind::FaceContour => &self.face_contour,
        };
        group.as_deref()
    }

    fn group_mut(&mut self, kind: FeatureKind) -> &mut Option<Vec<Point>> {
        match kind {
            FeatureKind::LeftEye => &mut self.left_eye,
            FeatureKind::RightEye => &mut self.right_eye,
            FeatureKind::Nose => &mut self.nose,
            FeatureKind::OuterLips => &mut self.outer_lips,
            FeatureKind::InnerLips => &mut self.inner_lips,
            FeatureKind::LeftEyebrow => &mut self.left_eyebrow,
            FeatureKind::RightEyebrow => &mut self.right_eyebrow,
            FeatureKind::FaceContour => &mut self.face_contour,
        }
    }

    pub fn with_group(mut self, kind: FeatureKind, points: Vec<Point>) -> Self {
        *self.group_mut(kind) = Some(points);
        self
    }

    /// Present groups in drawing order.
    pub fn groups(&self) -> impl Iterator<Item = (FeatureKind, &[Point])> + '_ {
        FeatureKind::ALL
            .into_iter()
            .filter_map(move |kind| self.group(kind).map(|points| (kind, points)))
    }

    pub fn is_empty(&self) -> bool {
        self.groups().next().is_none()
    }

    pub fn point_count(&self) -> usize {
        self.groups().map(|(_, points)| points.len()).sum()
    }

    /// Apply `f` to every point, keeping group presence and point order.
    pub fn map_points(&self, f: impl Fn(Point) -> Point) -> LandmarkSet {
        let mut out = LandmarkSet::default();
        for (kind, points) in self.groups() {
            *out.group_mut(kind) = Some(points.iter().map(|p| f(*p)).collect());
        }
        out
    }

    pub fn is_finite(&self) -> bool {
        self.groups().all(|(_, points)| points.iter().all(Point::is_finite))
    }
}

/// One face as reported by a detector, still in the detector's convention:
/// the box is normalized to the whole image with a bottom-left origin, and
/// landmark points are normalized to the box, also bottom-left origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub bounding_box: Rect,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<LandmarkSet>,
}

/// One face in absolute image pixels with a top-left origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: Uuid,
    pub bounding_box: Rect,
    pub confidence: f32,
    pub landmarks: Option<LandmarkSet>,
}
