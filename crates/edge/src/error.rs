use thiserror::Error;

#[derive(Debug, Error)]
pub enum EdgeError {
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error(transparent)]
    Capture(#[from] vox_edge_capture::CaptureError),

    #[error(transparent)]
    Playback(#[from] vox_edge_playback::PlaybackError),

    #[error("connection closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, EdgeError>;
