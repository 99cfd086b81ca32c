use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Core(#[from] vox_core::Error),

    #[error("no default output device available")]
    NoOutputDevice,

    #[error("failed to create audio sink: {0}")]
    Sink(String),
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
