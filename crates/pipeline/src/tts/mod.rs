//! TTS bridge: synthesises a complete response one sentence at a time, so
//! the first chunk of audio is available as early as possible. Never
//! applies fade shaping — that is the edge playback engine's job.

pub mod http_backend;
pub mod sentence_split;

pub use http_backend::{HttpStreamingTts, HttpTtsConfig};

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;

use vox_core::{AudioFrame, TextToSpeech, VoiceConfig};

#[derive(Debug, Clone)]
pub struct TtsBridgeConfig {
    pub voice: VoiceConfig,
}

impl Default for TtsBridgeConfig {
    fn default() -> Self {
        Self { voice: VoiceConfig::new(Default::default()) }
    }
}

pub struct TtsBridge {
    provider: Arc<dyn TextToSpeech>,
    config: TtsBridgeConfig,
}

impl TtsBridge {
    pub fn new(provider: Arc<dyn TextToSpeech>, config: TtsBridgeConfig) -> Self {
        Self { provider, config }
    }

    /// Splits `text` into sentences and synthesises each in turn. A
    /// provider error on one sentence is logged and the next sentence is
    /// still attempted; the whole response is never aborted for a single
    /// bad sentence.
    pub fn synthesise<'a>(&'a self, text: &'a str) -> Pin<Box<dyn Stream<Item = vox_core::Result<AudioFrame>> + Send + 'a>> {
        let sentences = sentence_split::split_sentences(text);
        Box::pin(async_stream::stream! {
            for sentence in sentences {
                match self.provider.synthesize(&sentence, &self.config.voice).await {
                    Ok(frame) => yield Ok(frame),
                    Err(e) => {
                        tracing::warn!(error = %e, sentence = %sentence, "tts provider failed on sentence, continuing");
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::StreamExt;
    use vox_core::{Language, Result, VoiceInfo};

    struct StubTts;

    #[async_trait]
    impl TextToSpeech for StubTts {
        async fn synthesize(&self, text: &str, _config: &VoiceConfig) -> Result<AudioFrame> {
            Ok(AudioFrame::new(vec![0.0; text.len()], Default::default(), Default::default(), 0))
        }

        fn synthesize_stream<'a>(
            &'a self,
            _text_stream: Pin<Box<dyn Stream<Item = String> + Send + 'a>>,
            _config: &'a VoiceConfig,
        ) -> Pin<Box<dyn Stream<Item = Result<AudioFrame>> + Send + 'a>> {
            Box::pin(futures::stream::empty())
        }

        fn available_voices(&self) -> &[VoiceInfo] {
            static VOICES: &[VoiceInfo] = &[];
            VOICES
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    #[tokio::test]
    async fn test_synthesise_one_frame_per_sentence() {
        let bridge = TtsBridge::new(Arc::new(StubTts), TtsBridgeConfig::default());
        let frames: Vec<_> = bridge.synthesise("Hi there. How are you?").collect().await;
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_default_language() {
        let config = TtsBridgeConfig::default();
        assert_eq!(config.voice.language, Language::default());
    }
}
