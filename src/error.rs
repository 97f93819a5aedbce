use thiserror::Error;

/// Why a detector could not produce results for an image.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid detection data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to load detector model: {0}")]
    Model(String),

    #[error("image dimensions are zero")]
    EmptyImage,
}

/// Geometry that cannot be converted between coordinate spaces.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("detection geometry contains a non-finite value")]
    NonFinite,

    #[error("image dimensions are zero")]
    EmptyImage,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("face detection is disabled")]
    DetectionDisabled,
}
