//! Ollama-compatible reference language model backend.
//!
//! The real provider is an external collaborator behind `vox_core::LanguageModel`;
//! this crate supplies one working implementation plus the adapter that
//! bridges it to that trait.

pub mod adapter;
pub mod backend;
pub mod prompt;

pub use adapter::LanguageModelAdapter;
pub use backend::{FinishReason, GenerationResult, LlmBackend, LlmConfig, OllamaBackend};
pub use prompt::{Message, PromptBuilder, Role};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("generation error: {0}")]
    Generation(String),

    #[error("api error: {0}")]
    Api(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timeout")]
    Timeout,

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

impl From<LlmError> for vox_core::Error {
    fn from(err: LlmError) -> Self {
        vox_core::Error::ProviderLlm(err.to_string())
    }
}
