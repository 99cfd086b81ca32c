//! Integration tests for the server-side pipeline (STT -> Router ->
//! ResponseStreamer -> TTS), exercising full turns across the four stage
//! types the way `vox_server::websocket` wires them together.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use vox_core::{AudioFrame, Conversation, LanguageModel, Result, TextToSpeech, VoiceConfig, VoiceInfo};
use vox_pipeline::stt::MockStreamingStt;
use vox_pipeline::{ResponseStreamer, ResponseStreamerConfig, Route, Router, RouterConfig, SttBridge, SttBridgeConfig, SttEvent, TtsBridge, TtsBridgeConfig};

struct StubLlm(String);

#[async_trait]
impl LanguageModel for StubLlm {
    async fn generate(&self, _prompt: &str, _history: &Conversation) -> Result<String> {
        Ok(self.0.clone())
    }

    fn generate_stream<'a>(
        &'a self,
        _prompt: &'a str,
        _history: &'a Conversation,
    ) -> Pin<Box<dyn Stream<Item = Result<String>> + Send + 'a>> {
        Box::pin(futures::stream::empty())
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

struct StubTts;

#[async_trait]
impl TextToSpeech for StubTts {
    async fn synthesize(&self, text: &str, _config: &VoiceConfig) -> Result<AudioFrame> {
        Ok(AudioFrame::new(vec![0.0; text.len().max(1)], Default::default(), Default::default(), 0))
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

/// Fails synthesis on whichever sentence (0-indexed) it is constructed with.
struct FlakyTts {
    fail_on: usize,
}

#[async_trait]
impl TextToSpeech for FlakyTts {
    async fn synthesize(&self, text: &str, _config: &VoiceConfig) -> Result<AudioFrame> {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let call = CALLS.fetch_add(1, Ordering::SeqCst);
        if call == self.fail_on {
            return Err(vox_core::Error::ProviderTts("synthesis failed".into()));
        }
        Ok(AudioFrame::new(vec![0.0; text.len().max(1)], Default::default(), Default::default(), 0))
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
        "flaky"
    }
}

/// S1: direct Q&A, full turn from raw audio to synthesized audio frames,
/// with no agent registered so routing always lands on `Direct`.
#[tokio::test]
async fn test_direct_qa_full_turn() {
    let stt = Arc::new(MockStreamingStt::new("what is the capital of india"));
    let bridge = SttBridge::new(stt, SttBridgeConfig::default());
    let mut events = bridge.start();
    bridge.send(AudioFrame::new(vec![0.0; 160], Default::default(), Default::default(), 0)).await.unwrap();
    bridge.close().await;

    let mut final_text = None;
    while let Some(event) = events.recv().await {
        if let SttEvent::Final { text, .. } = event {
            final_text = Some(text);
        }
    }
    let final_text = final_text.expect("stt must produce a final transcript");
    assert_eq!(final_text, "what is the capital of india");

    let router = Router::new(RouterConfig::default(), vec![]);
    let llm = StubLlm("The capital of India is New Delhi.".into());
    let history = Conversation::default();
    let route = router.decide_final(&final_text, &history, &llm, None).await;
    assert_eq!(route, Route::Direct);

    let reply = llm.generate(&final_text, &history).await.unwrap();

    let streamer = ResponseStreamer::new(ResponseStreamerConfig::default());
    let (frag_tx, frag_rx) = mpsc::channel(4);
    let (chunk_tx, mut chunk_rx) = mpsc::channel(4);
    frag_tx.send(reply.clone()).await.unwrap();
    drop(frag_tx);
    streamer.stream_tokens(frag_rx, chunk_tx, CancellationToken::new()).await;

    let mut chunks = Vec::new();
    while let Some(chunk) = chunk_rx.recv().await {
        chunks.push(chunk.text);
    }
    assert_eq!(chunks, vec!["The capital of India is New Delhi."]);

    let tts = TtsBridge::new(Arc::new(StubTts), TtsBridgeConfig::default());
    let frames: Vec<_> = tts.synthesise(&chunks.join(" ")).collect().await;
    assert_eq!(frames.len(), 1);
    assert!(frames[0].is_ok());
}

/// S3 analog: a barge-in cancels the shared `CancellationToken` mid-stream,
/// so no further response chunks reach the TTS bridge even though more
/// fragments are already buffered.
#[tokio::test]
async fn test_barge_in_cancels_in_flight_generation() {
    let streamer = ResponseStreamer::new(ResponseStreamerConfig::default());
    let (frag_tx, frag_rx) = mpsc::channel(8);
    let (chunk_tx, mut chunk_rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();

    frag_tx.send("The weather today is ".into()).await.unwrap();
    frag_tx.send("sunny with a gentle breeze.".into()).await.unwrap();
    cancel.cancel();

    streamer.stream_tokens(frag_rx, chunk_tx, cancel).await;

    assert!(chunk_rx.recv().await.is_none(), "cancelled stream must not flush any chunk to tts");
}

/// S6: one sentence's synthesis fails, the rest still stream in order.
#[tokio::test]
async fn test_tts_partial_failure_skips_one_sentence() {
    let tts = TtsBridge::new(Arc::new(FlakyTts { fail_on: 1 }), TtsBridgeConfig::default());
    let full_text = "First sentence. Second sentence. Third sentence.";

    let results: Vec<_> = tts.synthesise(full_text).collect().await;
    let ok_frames: Vec<_> = results.into_iter().filter_map(|r| r.ok()).collect();

    // three sentences go in, the middle one errors and is dropped, the
    // response text reported to the client is unaffected since it comes
    // from `full_text`, not from the synthesised frame count.
    assert_eq!(ok_frames.len(), 2);
    assert_eq!(full_text.split(". ").count(), 3);
}
