//! Error taxonomy shared across the pipeline.
//!
//! Every stage converts provider-specific failures into one of these kinds
//! at its boundary; only `TransportClosed` and unrecoverable provider errors
//! are expected to surface to the user as an `error` control frame.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport closed")]
    TransportClosed,

    #[error("stt provider error: {0}")]
    ProviderStt(String),

    #[error("llm provider error: {0}")]
    ProviderLlm(String),

    #[error("tts provider error: {0}")]
    ProviderTts(String),

    #[error("audio buffer overflow")]
    BufferOverflow,

    #[error("invalid control message: {0}")]
    InvalidMessage(String),

    #[error("state violation: {0}")]
    StateViolation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
