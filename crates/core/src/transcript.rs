//! Uniform transcript event shape produced by the STT bridge, independent
//! of which streaming transcription provider is behind it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub text: String,
    pub confidence: f32,
    /// Provider has committed this text; will not be revised further.
    pub is_final: bool,
    /// Provider's own endpointing fired (end of speech), distinct from `is_final`.
    pub speech_final: bool,
    pub words: Vec<WordTiming>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordTiming {
    pub word: String,
    pub start_ms: u32,
    pub end_ms: u32,
}
