use thiserror::Error;

/// Fatal failures only. Absence of a manifest, a watermark, or a registry
/// record is never an error; service contracts express it as `None`.
#[derive(Error, Debug)]
pub enum CredlensError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, CredlensError>;
