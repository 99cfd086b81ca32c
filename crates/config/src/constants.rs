//! Centralized constants: generic infrastructure defaults only.
//!
//! Anything that varies per deployment (provider endpoints, timeouts) lives
//! here with an env-var override; anything that is actually business logic
//! has no place in this crate at all.

/// Service endpoints (loaded from env vars with fallback defaults).
pub mod endpoints {
    use once_cell::sync::Lazy;

    /// Reference LLM endpoint (env: OLLAMA_URL). The teacher's own default:
    /// a local Ollama instance requires no secrets to exercise in tests.
    pub static OLLAMA_DEFAULT: Lazy<String> = Lazy::new(|| {
        std::env::var("OLLAMA_URL").unwrap_or_else(|_| "http://localhost:11434".to_string())
    });
}

/// Timeouts, in milliseconds unless noted.
pub mod timeouts {
    pub const LLM_REQUEST_MS: u64 = 60_000;
    pub const STT_TIMEOUT_MS: u64 = 10_000;
    pub const TTS_TIMEOUT_MS: u64 = 15_000;

    /// Grace period after closing the STT send-side before forcing a state
    /// transition with the last interim transcript.
    pub const STT_CLOSE_GRACE_MS: u64 = 100;

    /// Grace period waiting for the STT provider to open before the
    /// deferred-start buffer is considered stalled.
    pub const STT_OPEN_GRACE_MS: u64 = 100;
}

/// Audio processing defaults.
pub mod audio {
    pub const SAMPLE_RATE: u32 = 16_000;
    pub const CHANNELS: u16 = 1;
    pub const CHUNK_MS: u32 = 30;
    pub const BUFFER_MAX_BYTES: usize = 1024 * 1024;

    pub const PCM16_NORMALIZE: f32 = 32768.0;
    pub const PCM16_SCALE: f32 = 32767.0;
}

/// Capture controller defaults.
pub mod capture {
    pub const SILENCE_DURATION_MS: u32 = 2_000;
    pub const LISTENING_TIMEOUT_S: u32 = 10;
    pub const RELATIVE_SILENCE_RATIO: f32 = 0.35;
    pub const BASELINE_WINDOW_MS: u32 = 2_000;
}

/// Playback engine defaults.
pub mod playback {
    pub const JITTER_BUFFERING_CHUNKS: usize = 2;
    pub const FADE_SAMPLES: usize = 100;
}

/// Transport reconnect defaults.
pub mod reconnect {
    pub const INITIAL_DELAY_S: u64 = 1;
    pub const MAX_DELAY_S: u64 = 60;
    pub const MAX_RETRIES: Option<u32> = Some(10);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_constants_valid() {
        assert!(audio::SAMPLE_RATE > 0);
        assert_eq!(audio::CHANNELS, 1);
    }

    #[test]
    fn test_reconnect_bounds() {
        assert!(reconnect::INITIAL_DELAY_S < reconnect::MAX_DELAY_S);
    }
}
