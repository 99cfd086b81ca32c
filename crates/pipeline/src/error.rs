//! Pipeline-local error type. Every stage converts this into
//! `vox_core::Error` at the boundary where it hands control back to the
//! session orchestrator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stt error: {0}")]
    Stt(String),

    #[error("tts error: {0}")]
    Tts(String),

    #[error("router error: {0}")]
    Router(String),

    #[error("buffer overflow")]
    BufferOverflow,

    #[error("not initialized")]
    NotInitialized,
}

impl From<PipelineError> for vox_core::Error {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Stt(msg) => vox_core::Error::ProviderStt(msg),
            PipelineError::Tts(msg) => vox_core::Error::ProviderTts(msg),
            PipelineError::Router(msg) => vox_core::Error::ProviderLlm(msg),
            PipelineError::BufferOverflow => vox_core::Error::BufferOverflow,
            PipelineError::NotInitialized => {
                vox_core::Error::StateViolation("stage not initialized".into())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
