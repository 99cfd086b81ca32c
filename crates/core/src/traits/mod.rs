//! Core traits for the voice pipeline.
//!
//! ```text
//! Speech Processing:
//!   - SpeechToText: Audio -> Text transcription
//!   - TextToSpeech: Text -> Audio synthesis
//!
//! Language Models:
//!   - LanguageModel: text generation
//! ```

mod llm;
mod speech;

pub use llm::LanguageModel;
pub use speech::{SpeechToText, TextToSpeech};
