//! Capture-side error taxonomy. Wraps the shared core error plus the
//! device-level failures that only make sense on the edge.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Core(#[from] vox_core::Error),

    #[error("no default input device available")]
    NoInputDevice,

    #[error("failed to query input device config: {0}")]
    DeviceConfig(String),

    #[error("failed to build input stream: {0}")]
    BuildStream(String),

    #[error("failed to start input stream: {0}")]
    StartStream(String),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
