//! Core traits and types shared across the voice pipeline.
//!
//! This crate provides the foundational, provider-agnostic types used by
//! every other crate in the workspace: audio frame representations, the
//! transcript and error shapes, and the trait boundaries (`SpeechToText`,
//! `TextToSpeech`, `LanguageModel`) that keep concrete providers out of the
//! pipeline's own code.

pub mod agent_descriptor;
pub mod audio;
pub mod conversation;
pub mod error;
pub mod language;
pub mod llm_types;
pub mod traits;
pub mod transcript;

pub use agent_descriptor::AgentDescriptor;
pub use audio::{AudioEncoding, AudioFrame, Channels, SampleRate};
pub use conversation::{Conversation, Role, Turn};
pub use error::{Error, Result};
pub use language::Language;
pub use llm_types::{VoiceConfig, VoiceInfo};
pub use transcript::{TranscriptResult, WordTiming};

pub use traits::{LanguageModel, SpeechToText, TextToSpeech};
