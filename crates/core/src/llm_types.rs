//! Voice and completion request/response shapes shared by the TTS and LLM
//! trait boundaries.

use crate::Language;

#[derive(Debug, Clone)]
pub struct VoiceConfig {
    pub language: Language,
    pub voice_id: Option<String>,
    pub speed: f32,
    pub pitch: f32,
}

impl VoiceConfig {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            voice_id: None,
            speed: 1.0,
            pitch: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VoiceInfo {
    pub id: String,
    pub name: String,
    pub language: Language,
}
