//! Transport client: connects to the server over `tokio-tungstenite`, runs
//! one session to completion (or failure), and hands control back to the
//! caller's reconnect loop. One writer task owns the socket's write half;
//! every other task (the capture poll loop, control replies, the playback
//! feed loop) only ever pushes onto its `mpsc::Sender`, matching the single-
//! writer-task shared-resource rule for the transport socket.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use vox_config::{EdgeSettings, PipelineConfig};
use vox_core::{AudioFrame, Channels, SampleRate};
use vox_edge_capture::{AlwaysSilentDetector, CaptureController, CaptureEvent, CaptureMode, RmsThresholdDetector, WakeWordDetector};
use vox_edge_playback::{PlaybackEngine, PlaybackState};
use vox_transport::control::AudioInputConfig;
use vox_transport::{ClientControlMessage, ServerControlMessage};

use crate::error::Result;
use crate::metrics;
use crate::push_to_talk::PushToTalkSource;

/// Runs connect -> session -> (disconnect | error) forever, applying
/// exponential backoff between attempts. Returns only if the reconnect
/// budget is exhausted.
pub async fn run_with_reconnect(settings: EdgeSettings) -> Result<()> {
    let reconnect_cfg = settings.pipeline.reconnect.clone();
    let mut backoff = Duration::from_secs(reconnect_cfg.initial_delay_s);
    let max_backoff = Duration::from_secs(reconnect_cfg.max_delay_s);
    let mut attempt: u32 = 0;

    loop {
        match run_session(&settings).await {
            Ok(()) => {
                info!("session ended cleanly, reconnecting");
                attempt = 0;
                backoff = Duration::from_secs(reconnect_cfg.initial_delay_s);
            }
            Err(e) => {
                warn!(error = %e, attempt, "edge session failed");
                attempt += 1;
                if let Some(max) = reconnect_cfg.max_retries {
                    if attempt > max {
                        return Err(e);
                    }
                }
                metrics::record_reconnect_attempt();
                info!(?backoff, "reconnecting after backoff");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(max_backoff);
            }
        }
    }
}

/// One connection's lifetime: wires the capture controller and playback
/// engine to a single websocket, runs until the socket closes or a fatal
/// error occurs.
async fn run_session(settings: &EdgeSettings) -> Result<()> {
    let (ws_stream, _) = tokio_tungstenite::connect_async(&settings.transport.endpoint).await?;
    info!(endpoint = %settings.transport.endpoint, "connected");
    let (mut write, mut read) = ws_stream.split();

    let pipeline_cfg = settings.pipeline.clone();
    let playback = PlaybackEngine::new(pipeline_cfg.playback.clone());

    let wake_word: Arc<dyn WakeWordDetector> = match &pipeline_cfg.wake_word.phrase {
        Some(_) => Arc::new(RmsThresholdDetector::new(0.2)),
        None => Arc::new(AlwaysSilentDetector),
    };
    let mode = if pipeline_cfg.wake_word.phrase.is_some() { CaptureMode::WakeWord } else { CaptureMode::PushToTalk };
    let mut capture = CaptureController::new(mode, wake_word, &pipeline_cfg.audio, pipeline_cfg.capture.clone())?;

    let (writer_tx, mut writer_rx) = mpsc::channel::<WsMessage>(64);
    let (audio_tx, mut audio_rx) = mpsc::channel::<Vec<u8>>(32);

    // Single writer task: the only place that ever calls `write.send`.
    let writer = tokio::spawn(async move {
        while let Some(msg) = writer_rx.recv().await {
            if let Err(e) = write.send(msg).await {
                warn!(error = %e, "writer task send failed, stopping");
                break;
            }
        }
    });

    // Converts capture's raw PCM16 bytes into binary frames on the shared
    // writer channel; not a second writer onto the socket itself.
    let audio_forward_tx = writer_tx.clone();
    let audio_forwarder = tokio::spawn(async move {
        while let Some(bytes) = audio_rx.recv().await {
            if audio_forward_tx.send(WsMessage::Binary(bytes)).await.is_err() {
                break;
            }
        }
    });

    let mut push_to_talk = if mode == CaptureMode::PushToTalk { Some(PushToTalkSource::spawn()) } else { None };

    // `capture` owns a `cpal::Stream`, which is not guaranteed `Send` on
    // every platform backend, so it stays on this task rather than going
    // through `tokio::spawn`; it runs concurrently with the read loop via
    // `select!` within the same future instead.
    let capture_loop = run_capture_loop(&mut capture, &playback, &writer_tx, &audio_tx, &mut push_to_talk, &pipeline_cfg);
    let read_loop = run_read_loop(&mut read, &playback, &writer_tx);

    let result = tokio::select! {
        r = read_loop => r,
        _ = capture_loop => Ok(()),
    };

    drop(audio_tx);
    drop(writer_tx);
    let _ = audio_forwarder.await;
    let _ = writer.await;

    result
}

async fn run_capture_loop(
    capture: &mut CaptureController,
    playback: &Arc<PlaybackEngine>,
    writer_tx: &mpsc::Sender<WsMessage>,
    audio_tx: &mpsc::Sender<Vec<u8>>,
    push_to_talk: &mut Option<PushToTalkSource>,
    pipeline_cfg: &PipelineConfig,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(pipeline_cfg.audio.chunk_ms as u64));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let playback_active = playback.state() != PlaybackState::Idle;
                let events = capture.poll(playback_active, audio_tx);
                for event in events {
                    handle_capture_event(event, capture, playback, writer_tx, pipeline_cfg).await;
                }
                metrics::record_jitter_depth(playback.jitter_depth());
            }
            toggled = recv_push_to_talk(push_to_talk) => {
                if !toggled {
                    continue;
                }
                let events = if capture.is_capturing() { capture.stop_push_to_talk() } else { capture.start_push_to_talk() };
                for event in events {
                    handle_capture_event(event, capture, playback, writer_tx, pipeline_cfg).await;
                }
            }
        }
    }
}

async fn recv_push_to_talk(source: &mut Option<PushToTalkSource>) -> bool {
    match source {
        Some(s) => s.recv().await,
        None => std::future::pending().await,
    }
}

async fn handle_capture_event(
    event: CaptureEvent,
    capture: &CaptureController,
    playback: &Arc<PlaybackEngine>,
    writer_tx: &mpsc::Sender<WsMessage>,
    pipeline_cfg: &PipelineConfig,
) {
    match event {
        CaptureEvent::BargeIn => {
            debug!("wake word fired during playback, barging in");
            metrics::record_barge_in();
            playback.interrupt();
            send_control(writer_tx, ClientControlMessage::Interrupt).await;
        }
        CaptureEvent::SessionStarted => {
            let config = AudioInputConfig {
                sample_rate: pipeline_cfg.audio.sample_rate,
                channels: pipeline_cfg.audio.channels as u8,
                encoding: "linear16".to_string(),
                language: "en-US".to_string(),
            };
            send_control(writer_tx, ClientControlMessage::StartAudioInput { config }).await;
        }
        CaptureEvent::SessionStopped(reason) => {
            debug!(?reason, capturing = capture.is_capturing(), "capture session stopped");
            send_control(writer_tx, ClientControlMessage::StopAudioInput).await;
        }
    }
}

async fn run_read_loop(
    read: &mut (impl Stream<Item = std::result::Result<WsMessage, tokio_tungstenite::tungstenite::Error>> + Unpin),
    playback: &Arc<PlaybackEngine>,
    writer_tx: &mpsc::Sender<WsMessage>,
) -> Result<()> {
    let mut input_sample_rate = SampleRate::Hz16000;

    while let Some(msg) = read.next().await {
        match msg? {
            WsMessage::Text(text) => match ServerControlMessage::from_json(&text) {
                Ok(ServerControlMessage::Connected { session_id, message }) => {
                    info!(%session_id, %message, "server connected");
                }
                Ok(ServerControlMessage::Transcript { text, is_final, .. }) => {
                    debug!(%text, is_final, "transcript");
                }
                Ok(ServerControlMessage::IntentDetected { route }) => {
                    debug!(%route, "intent detected");
                }
                Ok(ServerControlMessage::RouteDecision { route }) => {
                    debug!(%route, "route decided");
                }
                Ok(ServerControlMessage::ResponseComplete { text }) => {
                    debug!(%text, "response complete");
                }
                Ok(ServerControlMessage::StreamStart { stream_id, sample_rate }) => {
                    input_sample_rate = sample_rate_from_u32(sample_rate);
                    playback.begin_session(stream_id, sample_rate);
                }
                Ok(ServerControlMessage::StreamEnd { stream_id }) => {
                    debug!(%stream_id, "stream end");
                    let playback = Arc::clone(playback);
                    tokio::spawn(async move { playback.end_session().await });
                }
                Ok(ServerControlMessage::StopPlayback) => {
                    playback.interrupt();
                }
                Ok(ServerControlMessage::Error { message }) => {
                    warn!(%message, "server reported error");
                }
                Err(e) => {
                    warn!(error = %e, "unparseable control message from server");
                }
            },
            WsMessage::Binary(data) => {
                let frame = AudioFrame::from_pcm16(&data, input_sample_rate, Channels::Mono, 0);
                playback.feed(frame.samples.to_vec());
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) => {}
            WsMessage::Close(_) => break,
            WsMessage::Frame(_) => {}
        }
    }

    Ok(())
}

async fn send_control(writer_tx: &mpsc::Sender<WsMessage>, msg: ClientControlMessage) {
    if writer_tx.send(WsMessage::Text(msg.to_json())).await.is_err() {
        warn!("writer channel closed, dropping control message");
    }
}

fn sample_rate_from_u32(value: u32) -> SampleRate {
    match value {
        8_000 => SampleRate::Hz8000,
        22_050 => SampleRate::Hz22050,
        44_100 => SampleRate::Hz44100,
        48_000 => SampleRate::Hz48000,
        _ => SampleRate::Hz16000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rate_from_u32_falls_back_to_16k() {
        assert_eq!(sample_rate_from_u32(44_100), SampleRate::Hz44100);
        assert_eq!(sample_rate_from_u32(12_345), SampleRate::Hz16000);
    }
}
