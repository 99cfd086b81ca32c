//! Thin `reqwest`-based TTS client against an external HTTP synthesis
//! service. Text is POSTed as JSON; the response body is raw PCM16LE at a
//! fixed sample rate, turned into an `AudioFrame`.
//!
//! The real production provider is an external collaborator behind
//! `vox_core::TextToSpeech`; this is one working reference implementation,
//! not the only one that could exist.

use async_trait::async_trait;
use futures::Stream;
use serde::Serialize;
use std::pin::Pin;

use vox_core::{AudioFrame, Channels, Result, SampleRate, TextToSpeech, VoiceConfig, VoiceInfo};

use crate::error::PipelineError;

#[derive(Debug, Clone)]
pub struct HttpTtsConfig {
    pub url: String,
    pub timeout_ms: u64,
    pub sample_rate: SampleRate,
}

impl Default for HttpTtsConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8091".to_string(),
            timeout_ms: 10_000,
            sample_rate: SampleRate::Hz22050,
        }
    }
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    language: &'a str,
    voice_id: Option<&'a str>,
    speed: f32,
    pitch: f32,
}

pub struct HttpStreamingTts {
    config: HttpTtsConfig,
    client: reqwest::Client,
    voices: Vec<VoiceInfo>,
}

impl HttpStreamingTts {
    pub fn new(config: HttpTtsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| vox_core::Error::ProviderTts(e.to_string()))?;
        Ok(Self { config, client, voices: Vec::new() })
    }

    async fn synthesize_pcm(&self, text: &str, voice: &VoiceConfig) -> std::result::Result<Vec<u8>, PipelineError> {
        let request = SynthesizeRequest {
            text,
            language: voice.language.code(),
            voice_id: voice.voice_id.as_deref(),
            speed: voice.speed,
            pitch: voice.pitch,
        };

        let url = format!("{}/synthesize", self.config.url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Tts(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PipelineError::Tts(format!("service returned {}", response.status())));
        }

        response.bytes().await.map(|b| b.to_vec()).map_err(|e| PipelineError::Tts(format!("invalid response: {e}")))
    }
}

#[async_trait]
impl TextToSpeech for HttpStreamingTts {
    async fn synthesize(&self, text: &str, config: &VoiceConfig) -> Result<AudioFrame> {
        let pcm = self.synthesize_pcm(text, config).await.map_err(vox_core::Error::from)?;
        Ok(AudioFrame::from_pcm16(&pcm, self.config.sample_rate, Channels::Mono, 0))
    }

    fn synthesize_stream<'a>(
        &'a self,
        text_stream: Pin<Box<dyn Stream<Item = String> + Send + 'a>>,
        config: &'a VoiceConfig,
    ) -> Pin<Box<dyn Stream<Item = Result<AudioFrame>> + Send + 'a>> {
        Box::pin(async_stream::stream! {
            use futures::StreamExt;
            futures::pin_mut!(text_stream);
            let mut seq = 0u64;
            while let Some(chunk) = text_stream.next().await {
                match self.synthesize_pcm(&chunk, config).await {
                    Ok(pcm) => {
                        yield Ok(AudioFrame::from_pcm16(&pcm, self.config.sample_rate, Channels::Mono, seq));
                        seq += 1;
                    }
                    Err(e) => yield Err(vox_core::Error::from(e)),
                }
            }
        })
    }

    fn available_voices(&self) -> &[VoiceInfo] {
        &self.voices
    }

    fn model_name(&self) -> &str {
        "http-tts"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpTtsConfig::default();
        assert_eq!(config.url, "http://127.0.0.1:8091");
        assert_eq!(config.sample_rate, SampleRate::Hz22050);
    }
}
