pub mod detection;
pub mod error;
pub mod models;
pub mod render;
pub mod session;

pub use detection::quality::{DetectionQuality, confidence_label};
pub use detection::replay::ReplayDetector;
pub use detection::scale::{ScaleFactor, ScaledDetection};
pub use detection::{DetectionOutcome, FaceDetector, FacePipeline, detect_faces, run_detection};
pub use error::{DetectorError, GeometryError, SessionError};
pub use models::{
    Detection, DisplaySize, FeatureKind, ImageSize, LandmarkSet, Point, RawDetection, Rect,
};
pub use render::{OverlayRenderer, OverlayStyle};
pub use session::{DetectionSession, SessionState};

#[cfg(feature = "rustface")]
pub use detection::rustface_backend::RustfaceDetector;
