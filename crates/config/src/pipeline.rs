//! Pipeline-tunable configuration: the enumerated options a session needs
//! at startup, independent of how they're sourced (file/env/default).

use serde::{Deserialize, Serialize};

use crate::constants::{audio, capture, playback, reconnect};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub wake_word: WakeWordConfig,
    #[serde(default = "default_latency_budget_ms")]
    pub latency_budget_ms: u32,
    #[serde(default = "default_chunk_words")]
    pub chunk_words: usize,
    #[serde(default = "default_voice_cap_sentences")]
    pub voice_cap_sentences: usize,
    #[serde(default = "default_voice_cap_words")]
    pub voice_cap_words: usize,
    #[serde(default = "default_early_intent_min_words")]
    pub early_intent_min_words: usize,
    #[serde(default = "default_conversation_capacity")]
    pub conversation_capacity: usize,
}

fn default_latency_budget_ms() -> u32 {
    500
}
fn default_chunk_words() -> usize {
    20
}
fn default_voice_cap_sentences() -> usize {
    3
}
fn default_voice_cap_words() -> usize {
    50
}
fn default_early_intent_min_words() -> usize {
    3
}
fn default_conversation_capacity() -> usize {
    20
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            capture: CaptureConfig::default(),
            playback: PlaybackConfig::default(),
            reconnect: ReconnectConfig::default(),
            wake_word: WakeWordConfig::default(),
            latency_budget_ms: default_latency_budget_ms(),
            chunk_words: default_chunk_words(),
            voice_cap_sentences: default_voice_cap_sentences(),
            voice_cap_words: default_voice_cap_words(),
            early_intent_min_words: default_early_intent_min_words(),
            conversation_capacity: default_conversation_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_channels")]
    pub channels: u16,
    #[serde(default = "default_chunk_ms")]
    pub chunk_ms: u32,
    #[serde(default = "default_buffer_max_bytes")]
    pub buffer_max_bytes: usize,
}

fn default_sample_rate() -> u32 {
    audio::SAMPLE_RATE
}
fn default_channels() -> u16 {
    audio::CHANNELS
}
fn default_chunk_ms() -> u32 {
    audio::CHUNK_MS
}
fn default_buffer_max_bytes() -> usize {
    audio::BUFFER_MAX_BYTES
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            chunk_ms: default_chunk_ms(),
            buffer_max_bytes: default_buffer_max_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_silence_duration_ms")]
    pub silence_duration_ms: u32,
    #[serde(default = "default_listening_timeout_s")]
    pub listening_timeout_s: u32,
    #[serde(default = "default_relative_silence_ratio")]
    pub relative_silence_ratio: f32,
    #[serde(default = "default_baseline_window_ms")]
    pub baseline_window_ms: u32,
}

fn default_silence_duration_ms() -> u32 {
    capture::SILENCE_DURATION_MS
}
fn default_listening_timeout_s() -> u32 {
    capture::LISTENING_TIMEOUT_S
}
fn default_relative_silence_ratio() -> f32 {
    capture::RELATIVE_SILENCE_RATIO
}
fn default_baseline_window_ms() -> u32 {
    capture::BASELINE_WINDOW_MS
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            silence_duration_ms: default_silence_duration_ms(),
            listening_timeout_s: default_listening_timeout_s(),
            relative_silence_ratio: default_relative_silence_ratio(),
            baseline_window_ms: default_baseline_window_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_jitter_buffering_chunks")]
    pub jitter_buffering_chunks: usize,
    #[serde(default = "default_fade_samples")]
    pub fade_samples: usize,
    #[serde(default = "default_jitter_capacity_chunks")]
    pub jitter_capacity_chunks: usize,
}

fn default_jitter_buffering_chunks() -> usize {
    playback::JITTER_BUFFERING_CHUNKS
}
fn default_fade_samples() -> usize {
    playback::FADE_SAMPLES
}
fn default_jitter_capacity_chunks() -> usize {
    32
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            jitter_buffering_chunks: default_jitter_buffering_chunks(),
            fade_samples: default_fade_samples(),
            jitter_capacity_chunks: default_jitter_capacity_chunks(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_initial_delay_s")]
    pub initial_delay_s: u64,
    #[serde(default = "default_max_delay_s")]
    pub max_delay_s: u64,
    #[serde(default)]
    pub max_retries: Option<u32>,
}

fn default_initial_delay_s() -> u64 {
    reconnect::INITIAL_DELAY_S
}
fn default_max_delay_s() -> u64 {
    reconnect::MAX_DELAY_S
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_s: default_initial_delay_s(),
            max_delay_s: default_max_delay_s(),
            max_retries: reconnect::MAX_RETRIES,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WakeWordConfig {
    #[serde(default)]
    pub phrase: Option<String>,
    #[serde(default)]
    pub model_path: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
}
