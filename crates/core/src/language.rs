//! Language tagging for transcripts, voices, and TTS requests.

use serde::{Deserialize, Serialize};

/// BCP-47 language tag (e.g. "en-US"). Kept as an opaque string rather than
/// a fixed enum of supported locales: which languages a given STT/TTS
/// provider supports is a property of that provider, not of this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Language(String);

impl Language {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::new("en-US")
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
