use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use facemark::{DetectorError, FaceDetector, FeatureKind, LandmarkSet, Point, RawDetection, Rect};
use image::DynamicImage;

/// Creates a blank RGB image of the given size.
pub fn blank_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::new_rgb8(width, height)
}

/// Raw detection without landmarks.
pub fn raw_box(x: f64, y: f64, width: f64, height: f64, confidence: f32) -> RawDetection {
    RawDetection {
        bounding_box: Rect::new(x, y, width, height),
        confidence,
        landmarks: None,
    }
}

/// Raw detection covering the centre of the image with a full landmark set.
pub fn raw_face_with_landmarks() -> RawDetection {
    let landmarks = LandmarkSet::default()
        .with_group(FeatureKind::LeftEye, vec![Point::new(0.25, 0.75), Point::new(0.35, 0.75)])
        .with_group(FeatureKind::RightEye, vec![Point::new(0.65, 0.75), Point::new(0.75, 0.75)])
        .with_group(FeatureKind::Nose, vec![Point::new(0.5, 0.5)])
        .with_group(
            FeatureKind::OuterLips,
            vec![Point::new(0.3, 0.25), Point::new(0.5, 0.2), Point::new(0.7, 0.25)],
        )
        .with_group(
            FeatureKind::FaceContour,
            vec![Point::new(0.0, 1.0), Point::new(0.5, 0.0), Point::new(1.0, 1.0)],
        );
    RawDetection {
        bounding_box: Rect::new(0.25, 0.25, 0.5, 0.5),
        confidence: 0.92,
        landmarks: Some(landmarks),
    }
}

/// Answers with a different batch on every call, sleeping per call first.
pub struct ScriptedDetector {
    script: Vec<(Duration, Vec<RawDetection>)>,
    calls: AtomicUsize,
}

impl ScriptedDetector {
    pub fn new(script: Vec<(Duration, Vec<RawDetection>)>) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FaceDetector for ScriptedDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<RawDetection>, DetectorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, batch) = self
            .script
            .get(call)
            .cloned()
            .unwrap_or((Duration::ZERO, Vec::new()));
        std::thread::sleep(delay);
        Ok(batch)
    }
}

/// Blocks inside `detect` until the test opens the gate.
pub struct GatedDetector {
    gate: Mutex<Receiver<()>>,
    batch: Vec<RawDetection>,
}

impl GatedDetector {
    pub fn new(batch: Vec<RawDetection>) -> (Self, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                gate: Mutex::new(rx),
                batch,
            },
            tx,
        )
    }
}

impl FaceDetector for GatedDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<RawDetection>, DetectorError> {
        let gate = self.gate.lock().expect("gate poisoned");
        let _ = gate.recv_timeout(Duration::from_secs(5));
        Ok(self.batch.clone())
    }
}

/// Always fails.
pub struct BrokenDetector;

impl FaceDetector for BrokenDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<RawDetection>, DetectorError> {
        Err(DetectorError::Model("model file missing".to_string()))
    }
}
