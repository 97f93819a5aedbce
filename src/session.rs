//! Detection state owned by one capture/review screen.
//!
//! The session runs detector passes in the background and publishes whole
//! [`SessionState`] snapshots through a `watch` channel, so observers never
//! see a half-updated detection list. Overlapping requests cancel and replace
//! each other: every request carries a sequence number and a result is only
//! committed while its number is still the latest.

use std::sync::Arc;

use image::DynamicImage;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::detection::normalize::normalize_all;
use crate::detection::scale::{ScaledDetection, scale_detections};
use crate::detection::{DetectionOutcome, FaceDetector, run_detection};
use crate::error::{GeometryError, SessionError};
use crate::models::{Detection, DisplaySize, ImageSize};

/// Snapshot of a session, replaced as a unit on every change.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub enabled: bool,
    /// A detector pass is in flight.
    pub processing: bool,
    pub image_size: Option<ImageSize>,
    pub detections: Arc<[Detection]>,
    /// Sequence number of the newest request; 0 before the first one.
    pub request: u64,
    pub outcome: DetectionOutcome,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            enabled: false,
            processing: false,
            image_size: None,
            detections: Arc::from(Vec::new()),
            request: 0,
            outcome: DetectionOutcome::Idle,
        }
    }
}

pub struct DetectionSession {
    detector: Arc<dyn FaceDetector>,
    state: Arc<watch::Sender<SessionState>>,
    image: Option<Arc<DynamicImage>>,
    next_request: u64,
    in_flight: Option<JoinHandle<()>>,
}

impl DetectionSession {
    pub fn new(detector: Arc<dyn FaceDetector>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            detector,
            state: Arc::new(state),
            image: None,
            next_request: 0,
            in_flight: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    pub fn is_processing(&self) -> bool {
        self.state.borrow().processing
    }

    pub fn detections(&self) -> Arc<[Detection]> {
        Arc::clone(&self.state.borrow().detections)
    }

    pub fn enable(&mut self) {
        self.state.send_modify(|s| s.enabled = true);
        info!("face detection enabled");
    }

    /// Turn detection off, dropping any pending pass and the current overlays.
    pub fn disable(&mut self) {
        self.abort_in_flight();
        let request = self.bump_request();
        self.state.send_modify(|s| {
            s.enabled = false;
            s.processing = false;
            s.request = request;
            s.detections = Arc::from(Vec::new());
            s.outcome = DetectionOutcome::Idle;
        });
        info!("face detection disabled");
    }

    pub fn toggle(&mut self) {
        if self.is_enabled() {
            self.disable();
        } else {
            self.enable();
        }
    }

    /// Switch to a new source image. Overlays computed for a different image
    /// are cleared and a pass still running for it is cancelled.
    pub fn set_image(&mut self, image: Arc<DynamicImage>) {
        if self.image.as_ref().is_some_and(|current| Arc::ptr_eq(current, &image)) {
            return;
        }
        self.cancel();
        let size = ImageSize::of(&image);
        self.image = Some(image);
        self.state.send_modify(|s| {
            s.image_size = Some(size);
            s.detections = Arc::from(Vec::new());
            s.outcome = DetectionOutcome::Idle;
        });
    }

    /// Drop the current overlays without touching the enabled flag.
    pub fn clear(&mut self) {
        self.cancel();
        self.state.send_modify(|s| {
            s.detections = Arc::from(Vec::new());
            s.outcome = DetectionOutcome::Idle;
        });
    }

    /// Start a detector pass on `image`, replacing any pass still running.
    ///
    /// Must be called from within a tokio runtime. Returns the request's
    /// sequence number.
    pub fn request_detection(&mut self, image: Arc<DynamicImage>) -> Result<u64, SessionError> {
        if !self.is_enabled() {
            return Err(SessionError::DetectionDisabled);
        }

        self.set_image(Arc::clone(&image));
        self.abort_in_flight();

        let request = self.bump_request();
        let size = ImageSize::of(&image);
        self.state.send_modify(|s| {
            s.processing = true;
            s.request = request;
        });
        debug!(request, width = size.width, height = size.height, "starting detection pass");

        let detector = Arc::clone(&self.detector);
        let state = Arc::clone(&self.state);
        self.in_flight = Some(tokio::spawn(async move {
            let joined = tokio::task::spawn_blocking(move || {
                let (raws, outcome) = run_detection(detector.as_ref(), &image);
                (normalize_all(&raws, size), outcome)
            })
            .await;

            let (detections, outcome) = match joined {
                Ok(result) => result,
                Err(e) => (
                    Vec::new(),
                    DetectionOutcome::Failed {
                        reason: format!("detector task ended abnormally: {e}"),
                    },
                ),
            };
            commit(&state, request, detections, outcome);
        }));

        Ok(request)
    }

    /// Stop waiting on the pending pass, if any. Its result will be ignored.
    pub fn cancel(&mut self) {
        if self.in_flight.is_none() && !self.is_processing() {
            return;
        }
        self.abort_in_flight();
        let request = self.bump_request();
        self.state.send_modify(|s| {
            s.processing = false;
            s.request = request;
        });
        debug!(request, "detection pass cancelled");
    }

    /// Wait until no pass is in flight and return the settled state.
    pub async fn settled(&self) -> SessionState {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|s| !s.processing).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Current detections mapped into a display region.
    pub fn layout(&self, display: DisplaySize) -> Result<Vec<ScaledDetection>, GeometryError> {
        let state = self.snapshot();
        match state.image_size {
            Some(size) => scale_detections(&state.detections, size, display),
            None => Ok(Vec::new()),
        }
    }

    fn bump_request(&mut self) -> u64 {
        self.next_request += 1;
        self.next_request
    }

    fn abort_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

impl Drop for DetectionSession {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}

/// Publish a finished pass unless a newer request or a disable superseded it.
fn commit(
    state: &watch::Sender<SessionState>,
    request: u64,
    detections: Vec<Detection>,
    outcome: DetectionOutcome,
) {
    let committed = state.send_if_modified(|s| {
        if s.request != request || !s.enabled {
            return false;
        }
        s.detections = Arc::from(detections);
        s.outcome = outcome;
        s.processing = false;
        true
    });
    if committed {
        info!(request, "detection pass committed");
    } else {
        debug!(request, "discarding superseded detection result");
    }
}
