//! Deterministic `SpeechToText` used in tests and as the default when no
//! real provider is configured. Counts incoming frames and emits the
//! configured text as a single final transcript once the stream ends.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;

use vox_core::{AudioFrame, Language, Result, SpeechToText, TranscriptResult};

pub struct MockStreamingStt {
    text: String,
}

impl MockStreamingStt {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl SpeechToText for MockStreamingStt {
    async fn transcribe(&self, _audio: &AudioFrame) -> Result<TranscriptResult> {
        Ok(TranscriptResult {
            text: self.text.clone(),
            confidence: 1.0,
            is_final: true,
            speech_final: true,
            words: vec![],
        })
    }

    fn transcribe_stream<'a>(
        &'a self,
        audio_stream: Pin<Box<dyn Stream<Item = AudioFrame> + Send + 'a>>,
    ) -> Pin<Box<dyn Stream<Item = Result<TranscriptResult>> + Send + 'a>> {
        let text = self.text.clone();
        Box::pin(async_stream::stream! {
            futures::pin_mut!(audio_stream);
            let mut frames = 0usize;
            while audio_stream.next().await.is_some() {
                frames += 1;
            }
            if frames > 0 {
                yield Ok(TranscriptResult {
                    text,
                    confidence: 1.0,
                    is_final: true,
                    speech_final: true,
                    words: vec![],
                });
            }
        })
    }

    fn supported_languages(&self) -> &[Language] {
        static LANGS: &[Language] = &[];
        LANGS
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transcribe_returns_configured_text() {
        let stt = MockStreamingStt::new("testing one two");
        let frame = AudioFrame::new(vec![0.0; 10], Default::default(), Default::default(), 0);
        let result = stt.transcribe(&frame).await.unwrap();
        assert_eq!(result.text, "testing one two");
        assert!(result.is_final);
    }
}
