//! Thin `reqwest`-based streaming STT client against an external HTTP
//! transcription service. Audio is buffered to a chunk size and POSTed as
//! raw PCM16LE; the response is normalised into a `TranscriptResult`.
//!
//! The real production provider is an external collaborator behind
//! `vox_core::SpeechToText`; this is one working reference implementation,
//! not the only one that could exist.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::pin::Pin;
use std::time::Instant;

use vox_core::{AudioFrame, Language, Result, SpeechToText, TranscriptResult};

use crate::error::PipelineError;

#[derive(Debug, Clone)]
pub struct HttpSttConfig {
    pub url: String,
    pub language: String,
    pub timeout_ms: u64,
    pub min_audio_samples: usize,
    pub buffer_size: usize,
}

impl Default for HttpSttConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8090".to_string(),
            language: "en".to_string(),
            timeout_ms: 30000,
            min_audio_samples: 1600,
            buffer_size: 16000,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SttResponse {
    text: String,
    confidence: f32,
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpStreamingStt {
    config: HttpSttConfig,
    client: reqwest::Client,
}

impl HttpStreamingStt {
    pub fn new(config: HttpSttConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| vox_core::Error::ProviderStt(e.to_string()))?;
        Ok(Self { config, client })
    }

    async fn transcribe_pcm(&self, audio: &[f32]) -> std::result::Result<SttResponse, PipelineError> {
        if audio.len() < self.config.min_audio_samples {
            return Ok(SttResponse { text: String::new(), confidence: 0.0, error: Some("audio too short".into()) });
        }

        let pcm16: Vec<i16> = audio.iter().map(|&s| (s * 32767.0) as i16).collect();
        let pcm_bytes: Vec<u8> = pcm16.iter().flat_map(|&s| s.to_le_bytes()).collect();

        let url = format!("{}/transcribe", self.config.url);
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "audio/pcm")
            .header("X-Language", &self.config.language)
            .body(pcm_bytes)
            .send()
            .await
            .map_err(|e| PipelineError::Stt(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PipelineError::Stt(format!("service returned {}", response.status())));
        }

        response.json().await.map_err(|e| PipelineError::Stt(format!("invalid response: {e}")))
    }
}

#[async_trait]
impl SpeechToText for HttpStreamingStt {
    async fn transcribe(&self, audio: &AudioFrame) -> Result<TranscriptResult> {
        let response = self
            .transcribe_pcm(&audio.samples)
            .await
            .map_err(vox_core::Error::from)?;
        if let Some(err) = &response.error {
            tracing::warn!(error = %err, "stt service reported an error");
        }
        Ok(TranscriptResult {
            text: response.text,
            confidence: response.confidence,
            is_final: true,
            speech_final: true,
            words: vec![],
        })
    }

    fn transcribe_stream<'a>(
        &'a self,
        audio_stream: Pin<Box<dyn Stream<Item = AudioFrame> + Send + 'a>>,
    ) -> Pin<Box<dyn Stream<Item = Result<TranscriptResult>> + Send + 'a>> {
        Box::pin(async_stream::stream! {
            futures::pin_mut!(audio_stream);
            let mut buffer: Vec<f32> = Vec::with_capacity(self.config.buffer_size);
            let utterance_start = Instant::now();

            while let Some(frame) = audio_stream.next().await {
                buffer.extend_from_slice(&frame.samples);

                if buffer.len() >= self.config.buffer_size {
                    match self.transcribe_pcm(&buffer).await {
                        Ok(response) if !response.text.is_empty() => {
                            yield Ok(TranscriptResult {
                                text: response.text,
                                confidence: response.confidence,
                                is_final: false,
                                speech_final: false,
                                words: vec![],
                            });
                        }
                        Ok(_) => {}
                        Err(e) => yield Err(vox_core::Error::from(e)),
                    }
                }
            }

            if !buffer.is_empty() {
                match self.transcribe_pcm(&buffer).await {
                    Ok(response) => {
                        yield Ok(TranscriptResult {
                            text: response.text,
                            confidence: response.confidence,
                            is_final: true,
                            speech_final: true,
                            words: vec![],
                        });
                    }
                    Err(e) => yield Err(vox_core::Error::from(e)),
                }
            }

            tracing::debug!(elapsed_ms = utterance_start.elapsed().as_millis() as u64, "stt stream finished");
        })
    }

    fn supported_languages(&self) -> &[Language] {
        static LANGS: &[Language] = &[];
        LANGS
    }

    fn model_name(&self) -> &str {
        "http-stt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpSttConfig::default();
        assert_eq!(config.url, "http://127.0.0.1:8090");
        assert_eq!(config.timeout_ms, 30000);
    }
}
