//! Conversion from detector-native coordinates to image pixels.
//!
//! Detectors report boxes normalized to the whole image and landmark points
//! normalized to their own box, both with a bottom-left origin. Everything
//! leaving this module is in absolute pixels with a top-left origin.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::GeometryError;
use crate::models::{Detection, ImageSize, Point, RawDetection, Rect};

/// Convert a normalized bottom-left-origin box into a top-left-origin pixel box.
pub fn convert_box(raw: &Rect, image: ImageSize) -> Rect {
    let w = image.width as f64;
    let h = image.height as f64;
    Rect {
        x: raw.x * w,
        y: (1.0 - raw.y - raw.height) * h,
        width: raw.width * w,
        height: raw.height * h,
    }
}

/// Convert a box-relative landmark point using the raw (unconverted) box.
pub fn convert_point(point: Point, raw_box: &Rect, image: ImageSize) -> Point {
    let w = image.width as f64;
    let h = image.height as f64;
    Point {
        x: raw_box.x * w + point.x * raw_box.width * w,
        y: (1.0 - raw_box.y - raw_box.height) * h + (1.0 - point.y) * raw_box.height * h,
    }
}

/// Convert one raw detection into image space.
///
/// Degenerate boxes pass through as zero-area output. Confidence is copied
/// as-is, even outside `[0, 1]`. Fails only when the raw geometry holds a
/// NaN or infinity, since nothing meaningful can be drawn from it.
pub fn normalize_detection(raw: &RawDetection, image: ImageSize) -> Result<Detection, GeometryError> {
    let landmarks_finite = raw.landmarks.as_ref().is_none_or(|set| set.is_finite());
    if !raw.bounding_box.is_finite() || !landmarks_finite {
        return Err(GeometryError::NonFinite);
    }

    let bounding_box = convert_box(&raw.bounding_box, image);
    let landmarks = raw
        .landmarks
        .as_ref()
        .map(|set| set.map_points(|p| convert_point(p, &raw.bounding_box, image)));

    let detection = Detection {
        id: Uuid::new_v4(),
        bounding_box,
        confidence: raw.confidence,
        landmarks,
    };

    debug!(
        confidence = detection.confidence,
        x = bounding_box.x,
        y = bounding_box.y,
        width = bounding_box.width,
        height = bounding_box.height,
        landmark_points = detection.landmarks.as_ref().map_or(0, |l| l.point_count()),
        "converted detection"
    );

    Ok(detection)
}

/// Convert a whole detector pass. Detections that cannot be converted are
/// dropped; the rest of the batch is unaffected.
pub fn normalize_all(raws: &[RawDetection], image: ImageSize) -> Vec<Detection> {
    raws.iter()
        .enumerate()
        .filter_map(|(index, raw)| match normalize_detection(raw, image) {
            Ok(detection) => Some(detection),
            Err(e) => {
                warn!(index, error = %e, "dropping detection");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureKind, LandmarkSet};

    const EPS: f64 = 1e-9;

    fn raw(bx: f64, by: f64, bw: f64, bh: f64) -> RawDetection {
        RawDetection {
            bounding_box: Rect::new(bx, by, bw, bh),
            confidence: 0.9,
            landmarks: None,
        }
    }

    #[test]
    fn symmetric_box_maps_to_itself() {
        let d = normalize_detection(&raw(0.25, 0.25, 0.5, 0.5), ImageSize::new(400, 400)).unwrap();
        assert_eq!(d.bounding_box, Rect::new(100.0, 100.0, 200.0, 200.0));
    }

    #[test]
    fn full_height_box_starts_at_top() {
        for (bx, bw) in [(0.0, 1.0), (0.3, 0.2), (0.9, 0.1)] {
            let b = convert_box(&Rect::new(bx, 0.0, bw, 1.0), ImageSize::new(640, 480));
            assert!(b.y.abs() < EPS, "y = {}", b.y);
            assert!((b.height - 480.0).abs() < EPS);
        }
    }

    #[test]
    fn bottom_box_lands_at_bottom() {
        // Bottom quarter in detector terms is the bottom quarter on screen too.
        let b = convert_box(&Rect::new(0.0, 0.0, 1.0, 0.25), ImageSize::new(100, 200));
        assert!((b.y - 150.0).abs() < EPS);
        assert!((b.max_y() - 200.0).abs() < EPS);
    }

    #[test]
    fn vertical_flip_round_trips() {
        let image = ImageSize::new(320, 240);
        let h = image.height as f64;
        for &(by, bh) in &[(0.0, 0.5), (0.1, 0.3), (0.42, 0.17), (0.7, 0.3)] {
            let raw_box = Rect::new(0.2, by, 0.3, bh);
            let converted = convert_box(&raw_box, image);
            let raw_center_bottom_left = (by + bh / 2.0) * h;
            assert!((converted.mid_y() - (h - raw_center_bottom_left)).abs() < 1e-6);
            // Inverse transform recovers the detector's y.
            let back = 1.0 - converted.y / h - converted.height / h;
            assert!((back - by).abs() < 1e-9);
        }
    }

    #[test]
    fn landmark_corners_flip() {
        let image = ImageSize::new(100, 100);
        let raw_box = Rect::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(convert_point(Point::new(0.0, 0.0), &raw_box, image), Point::new(0.0, 100.0));
        assert_eq!(convert_point(Point::new(0.0, 1.0), &raw_box, image), Point::new(0.0, 0.0));
        assert_eq!(convert_point(Point::new(1.0, 1.0), &raw_box, image), Point::new(100.0, 0.0));
    }

    #[test]
    fn landmark_is_relative_to_its_box() {
        let image = ImageSize::new(200, 100);
        let raw_box = Rect::new(0.5, 0.5, 0.25, 0.5);
        // Box center in detector terms is box center on screen.
        let p = convert_point(Point::new(0.5, 0.5), &raw_box, image);
        let b = convert_box(&raw_box, image);
        assert!((p.x - b.mid_x()).abs() < EPS);
        assert!((p.y - b.mid_y()).abs() < EPS);
    }

    #[test]
    fn landmark_groups_keep_order_and_absence() {
        let landmarks = LandmarkSet::default().with_group(
            FeatureKind::FaceContour,
            vec![Point::new(0.0, 1.0), Point::new(0.5, 0.5), Point::new(1.0, 0.0)],
        );
        let r = RawDetection {
            landmarks: Some(landmarks),
            ..raw(0.0, 0.0, 1.0, 1.0)
        };
        let d = normalize_detection(&r, ImageSize::new(10, 10)).unwrap();
        let set = d.landmarks.unwrap();
        assert_eq!(
            set.face_contour,
            Some(vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0), Point::new(10.0, 10.0)])
        );
        assert!(set.left_eye.is_none());
        assert!(set.nose.is_none());
    }

    #[test]
    fn empty_landmark_set_stays_present() {
        let r = RawDetection {
            landmarks: Some(LandmarkSet::default()),
            ..raw(0.1, 0.1, 0.2, 0.2)
        };
        let d = normalize_detection(&r, ImageSize::new(50, 50)).unwrap();
        let set = d.landmarks.expect("landmarks should stay present");
        assert!(set.is_empty());
    }

    #[test]
    fn degenerate_box_passes_through() {
        let d = normalize_detection(&raw(0.5, 0.5, 0.0, 0.0), ImageSize::new(100, 100)).unwrap();
        assert_eq!(d.bounding_box, Rect::new(50.0, 50.0, 0.0, 0.0));
    }

    #[test]
    fn confidence_is_not_clamped() {
        let mut r = raw(0.0, 0.0, 0.5, 0.5);
        r.confidence = 1.7;
        let d = normalize_detection(&r, ImageSize::new(10, 10)).unwrap();
        assert_eq!(d.confidence, 1.7);
    }

    #[test]
    fn non_finite_detection_is_dropped_from_batch() {
        let bad_landmarks = LandmarkSet::default().with_group(FeatureKind::Nose, vec![Point::new(f64::NAN, 0.5)]);
        let raws = vec![
            raw(0.0, 0.0, 0.5, 0.5),
            raw(f64::NAN, 0.0, 0.5, 0.5),
            RawDetection {
                landmarks: Some(bad_landmarks),
                ..raw(0.1, 0.1, 0.1, 0.1)
            },
            raw(0.5, 0.5, 0.5, 0.5),
        ];
        let detections = normalize_all(&raws, ImageSize::new(100, 100));
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[1].bounding_box, Rect::new(50.0, 0.0, 50.0, 50.0));
    }

    #[test]
    fn empty_batch_yields_nothing() {
        assert!(normalize_all(&[], ImageSize::new(100, 100)).is_empty());
    }

    #[test]
    fn each_detection_gets_its_own_id() {
        let raws = vec![raw(0.0, 0.0, 0.5, 0.5), raw(0.0, 0.0, 0.5, 0.5)];
        let detections = normalize_all(&raws, ImageSize::new(100, 100));
        assert_ne!(detections[0].id, detections[1].id);
    }
}
