//! The websocket connection handler: reads control/audio frames from one
//! edge connection, drives the session state machine through `vox_pipeline`
//! and `vox_agent`, and writes transcript/route/audio frames back.
//!
//! The read side runs in the connection's own task and owns the session's
//! visible state; once a final transcript is in it spawns a turn task that
//! shares the write half (`Arc<Mutex<_>>`, same pattern the read loop uses
//! to hand the sink to that task) so routing/generation/synthesis can run
//! without blocking the read loop from noticing a barge-in.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use vox_core::{AudioFrame, Channels, Conversation, SampleRate, Turn};
use vox_pipeline::{
    Route, ResponseChunk, ResponseStreamer, ResponseStreamerConfig, SttBridge, SttBridgeConfig,
    SttEvent, TtsBridge, TtsBridgeConfig,
};
use vox_transport::{validate_alignment, ClientControlMessage, ServerControlMessage};

use crate::session::{Session, SessionState};
use crate::state::AppState;
use crate::ServerError;

type Sink = SplitSink<WebSocket, Message>;
type SharedSink = Arc<Mutex<Sink>>;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let session = match state.sessions.create() {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting connection, session table full");
            return;
        }
    };
    tracing::info!(session_id = %session.id, "session connected");

    let (sender, mut receiver) = socket.split();
    let sender: SharedSink = Arc::new(Mutex::new(sender));

    send_control(
        &sender,
        ServerControlMessage::Connected { session_id: session.id.clone(), message: "ready".into() },
    )
    .await;

    let mut stt_bridge: Option<Arc<SttBridge>> = None;
    let mut stt_events: Option<mpsc::Receiver<SttEvent>> = None;
    let mut turn_task: Option<JoinHandle<()>> = None;
    let mut input_sample_rate = SampleRate::Hz16000;
    let mut input_channels = Channels::Mono;
    let mut frame_seq: u64 = 0;

    loop {
        tokio::select! {
            biased;

            maybe_event = recv_stt_event(&mut stt_events), if stt_events.is_some() => {
                match maybe_event {
                    Some(SttEvent::Interim { text, confidence }) => {
                        session.record_interim(text.clone());
                        send_control(
                            &sender,
                            ServerControlMessage::Transcript { text: text.clone(), is_final: false, speech_final: false, confidence },
                        )
                        .await;
                        if let Some(route) = state.router.early_intent(&text) {
                            session.record_early_intent(route.clone());
                            send_control(&sender, ServerControlMessage::IntentDetected { route: route_label(&route) }).await;
                        }
                    }
                    Some(SttEvent::Final { text, speech_final, confidence }) => {
                        send_control(
                            &sender,
                            ServerControlMessage::Transcript { text: text.clone(), is_final: true, speech_final, confidence },
                        )
                        .await;
                        stt_events = None;
                        stt_bridge = None;

                        if session.state() == SessionState::Listening {
                            if let Err(e) = session.begin_transcribing() {
                                tracing::warn!(session_id = %session.id, error = %e, "transcribing transition rejected");
                                continue;
                            }
                        }
                        if text.trim().is_empty() {
                            if let Err(e) = session.abort_turn() {
                                tracing::warn!(session_id = %session.id, error = %e, "abort_turn transition rejected");
                            }
                            continue;
                        }
                        if let Err(e) = session.begin_routing(text.clone()) {
                            tracing::warn!(session_id = %session.id, error = %e, "routing transition rejected");
                            continue;
                        }
                        turn_task = Some(spawn_turn(state.clone(), session.clone(), sender.clone(), text));
                    }
                    Some(SttEvent::Error(message)) => {
                        tracing::warn!(session_id = %session.id, error = %message, "stt provider error");
                        session.fail(message.clone());
                        send_control(&sender, ServerControlMessage::Error { message }).await;
                        let _ = session.recover();
                        stt_events = None;
                        stt_bridge = None;
                    }
                    Some(SttEvent::Closed) | None => {
                        stt_events = None;
                    }
                }
            }

            msg = receiver.next() => {
                let Some(msg) = msg else { break };
                match msg {
                    Ok(Message::Text(text)) => {
                        match ClientControlMessage::from_json(&text) {
                            Ok(ClientControlMessage::StartAudioInput { config }) => {
                                if matches!(session.state(), SessionState::Generating | SessionState::Speaking) {
                                    barge_in(&session, &sender, &mut turn_task, &mut stt_bridge, &mut stt_events).await;
                                }
                                input_sample_rate = sample_rate_from_u32(config.sample_rate);
                                input_channels = if config.channels > 1 { Channels::Stereo } else { Channels::Mono };
                                frame_seq = 0;

                                let utterance_id = uuid::Uuid::new_v4().to_string();
                                if let Err(e) = session.begin_listening(utterance_id) {
                                    send_control(&sender, ServerControlMessage::Error { message: e.to_string() }).await;
                                    continue;
                                }
                                let bridge = Arc::new(SttBridge::new(
                                    state.stt.clone(),
                                    SttBridgeConfig { language: Some(config.language.clone()), ..Default::default() },
                                ));
                                stt_events = Some(bridge.start());
                                stt_bridge = Some(bridge);
                            }
                            Ok(ClientControlMessage::StopAudioInput) => {
                                if session.state() == SessionState::Listening {
                                    let _ = session.begin_transcribing();
                                }
                                if let Some(bridge) = stt_bridge.take() {
                                    bridge.close().await;
                                    stt_bridge = Some(bridge);
                                }
                            }
                            Ok(ClientControlMessage::Interrupt) => {
                                barge_in(&session, &sender, &mut turn_task, &mut stt_bridge, &mut stt_events).await;
                            }
                            Err(e) => {
                                send_control(&sender, ServerControlMessage::Error { message: format!("invalid control message: {e}") }).await;
                            }
                        }
                    }
                    Ok(Message::Binary(data)) => {
                        if session.state() != SessionState::Listening {
                            continue;
                        }
                        if let Err(e) = validate_alignment(&data) {
                            send_control(&sender, ServerControlMessage::Error { message: e.to_string() }).await;
                            continue;
                        }
                        if let Some(bridge) = &stt_bridge {
                            let frame = AudioFrame::from_pcm16(&data, input_sample_rate, input_channels, frame_seq);
                            frame_seq += 1;
                            if bridge.send(frame).await.is_err() {
                                tracing::warn!(session_id = %session.id, "dropping audio chunk, stt buffer full");
                            }
                        }
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                    Ok(Message::Close(_)) => break,
                    Err(e) => {
                        tracing::warn!(session_id = %session.id, error = %e, "websocket read error");
                        break;
                    }
                }
            }
        }
    }

    tracing::info!(session_id = %session.id, "session disconnected");
    if let Some(task) = turn_task.take() {
        task.abort();
    }
    if let Some(bridge) = stt_bridge.take() {
        bridge.close().await;
    }
    state.sessions.remove(&session.id);
}

async fn recv_stt_event(events: &mut Option<mpsc::Receiver<SttEvent>>) -> Option<SttEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Cancels the in-flight turn (if any) and the open STT bridge (if any),
/// waits for the turn task to notice and settle, then moves the session
/// back to idle. Shared by an explicit `interrupt` message and an implicit
/// barge-in (`start_audio_input` while still generating/speaking).
async fn barge_in(
    session: &Arc<Session>,
    sender: &SharedSink,
    turn_task: &mut Option<JoinHandle<()>>,
    stt_bridge: &mut Option<Arc<SttBridge>>,
    stt_events: &mut Option<mpsc::Receiver<SttEvent>>,
) {
    if session.interrupt().is_err() {
        return;
    }
    send_control(sender, ServerControlMessage::StopPlayback).await;
    if let Some(bridge) = stt_bridge.take() {
        bridge.close().await;
    }
    *stt_events = None;
    if let Some(task) = turn_task.take() {
        let _ = task.await;
    }
    let _ = session.finish_interrupt();
}

fn spawn_turn(state: AppState, session: Arc<Session>, sender: SharedSink, final_text: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = run_turn(&state, &session, &sender, final_text).await {
            tracing::warn!(session_id = %session.id, error = %e, "turn failed");
            session.fail(e.to_string());
            send_control(&sender, ServerControlMessage::Error { message: e.to_string() }).await;
            let _ = session.recover();
        }
    })
}

async fn run_turn(state: &AppState, session: &Arc<Session>, sender: &SharedSink, final_text: String) -> Result<(), ServerError> {
    let history = session.conversation.read().clone();
    let hint = session.early_intent_hint();
    let route = state.router.decide_final(&final_text, &history, state.llm.as_ref(), hint.as_ref()).await;
    send_control(sender, ServerControlMessage::RouteDecision { route: route_label(&route) }).await;

    let cancel = session.begin_generating(route.clone())?;
    session.conversation.write().push(Turn::user(final_text.clone()));

    let streamer_config = {
        let config = state.config.read();
        ResponseStreamerConfig {
            max_words_without_terminator: config.pipeline.chunk_words,
            cap_sentences: config.pipeline.voice_cap_sentences,
            cap_words: config.pipeline.voice_cap_words,
        }
    };
    let tts_bridge = TtsBridge::new(state.tts.clone(), TtsBridgeConfig::default());

    let full_text = match route {
        Route::Direct => {
            run_direct_turn(state, session, sender, &final_text, &history, &streamer_config, &tts_bridge, cancel).await?
        }
        Route::Agent(name) => {
            run_agent_turn(state, session, sender, &name, &final_text, &history, &streamer_config, &tts_bridge, cancel).await?
        }
    };

    session.conversation.write().push(Turn::assistant(full_text.clone()));
    send_control(sender, ServerControlMessage::ResponseComplete { text: full_text }).await;
    session.finish_turn()?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_direct_turn(
    state: &AppState,
    session: &Arc<Session>,
    sender: &SharedSink,
    final_text: &str,
    history: &Conversation,
    streamer_config: &ResponseStreamerConfig,
    tts_bridge: &TtsBridge,
    cancel: CancellationToken,
) -> Result<String, ServerError> {
    let (frag_tx, frag_rx) = mpsc::channel::<String>(32);
    let (chunk_tx, mut chunk_rx) = mpsc::channel::<ResponseChunk>(32);

    let llm = state.llm.clone();
    let prompt = final_text.to_string();
    let history_owned = history.clone();
    let gen_task = tokio::spawn(async move {
        let stream = llm.generate_stream(&prompt, &history_owned);
        futures::pin_mut!(stream);
        while let Some(item) = stream.next().await {
            match item {
                Ok(token) => {
                    if frag_tx.send(token).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "llm generation failed mid-stream");
                    break;
                }
            }
        }
    });

    let streamer = ResponseStreamer::new(streamer_config.clone());
    let streamer_cancel = cancel.clone();
    let streamer_task = tokio::spawn(async move {
        streamer.stream_tokens(frag_rx, chunk_tx, streamer_cancel).await;
    });

    let mut full_text = String::new();
    let mut stream_id: Option<String> = None;
    while let Some(chunk) = chunk_rx.recv().await {
        if cancel.is_cancelled() {
            break;
        }
        if !full_text.is_empty() {
            full_text.push(' ');
        }
        full_text.push_str(&chunk.text);
        speak_chunk(session, sender, tts_bridge, &chunk.text, &mut stream_id, &cancel).await?;
    }

    let _ = gen_task.await;
    let _ = streamer_task.await;

    if let Some(id) = stream_id {
        send_control(sender, ServerControlMessage::StreamEnd { stream_id: id }).await;
    }
    Ok(full_text)
}

#[allow(clippy::too_many_arguments)]
async fn run_agent_turn(
    state: &AppState,
    session: &Arc<Session>,
    sender: &SharedSink,
    agent_name: &str,
    final_text: &str,
    history: &Conversation,
    streamer_config: &ResponseStreamerConfig,
    tts_bridge: &TtsBridge,
    cancel: CancellationToken,
) -> Result<String, ServerError> {
    let agent = state
        .agents
        .get(agent_name)
        .ok_or_else(|| ServerError::Internal(format!("routed to unknown agent {agent_name}")))?;

    let raw = agent.handle(final_text, history).await.map_err(ServerError::Pipeline)?;
    let streamer = ResponseStreamer::new(streamer_config.clone());
    let capped = streamer.cap_for_voice(&raw);

    let mut stream_id: Option<String> = None;
    speak_chunk(session, sender, tts_bridge, &capped, &mut stream_id, &cancel).await?;
    if let Some(id) = stream_id {
        send_control(sender, ServerControlMessage::StreamEnd { stream_id: id }).await;
    }
    Ok(capped)
}

async fn speak_chunk(
    session: &Arc<Session>,
    sender: &SharedSink,
    tts_bridge: &TtsBridge,
    text: &str,
    stream_id: &mut Option<String>,
    cancel: &CancellationToken,
) -> Result<(), ServerError> {
    if text.trim().is_empty() {
        return Ok(());
    }
    let mut frames = tts_bridge.synthesise(text);
    while let Some(frame) = frames.next().await {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let frame = frame.map_err(ServerError::Pipeline)?;
        if stream_id.is_none() {
            let id = uuid::Uuid::new_v4().to_string();
            if session.state() == SessionState::Generating {
                let _ = session.begin_speaking(id.clone(), frame.sample_rate.as_u32());
            }
            send_control(
                sender,
                ServerControlMessage::StreamStart { stream_id: id.clone(), sample_rate: frame.sample_rate.as_u32() },
            )
            .await;
            *stream_id = Some(id);
        }
        send_binary(sender, frame.to_pcm16()).await;
        session.record_chunk_sent();
    }
    Ok(())
}

fn route_label(route: &Route) -> String {
    match route {
        Route::Direct => "direct".to_string(),
        Route::Agent(name) => format!("agent:{name}"),
    }
}

fn sample_rate_from_u32(value: u32) -> SampleRate {
    match value {
        8000 => SampleRate::Hz8000,
        22050 => SampleRate::Hz22050,
        44100 => SampleRate::Hz44100,
        48000 => SampleRate::Hz48000,
        _ => SampleRate::Hz16000,
    }
}

async fn send_control(sender: &SharedSink, msg: ServerControlMessage) {
    let json = msg.to_json();
    let mut sink = sender.lock().await;
    if let Err(e) = sink.send(Message::Text(json)).await {
        tracing::warn!(error = %e, "failed to send control message");
    }
}

async fn send_binary(sender: &SharedSink, bytes: Vec<u8>) {
    let mut sink = sender.lock().await;
    if let Err(e) = sink.send(Message::Binary(bytes)).await {
        tracing::warn!(error = %e, "failed to send audio frame");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label() {
        assert_eq!(route_label(&Route::Direct), "direct");
        assert_eq!(route_label(&Route::Agent("weather".into())), "agent:weather");
    }

    #[test]
    fn test_sample_rate_from_u32_falls_back_to_16k() {
        assert_eq!(sample_rate_from_u32(44100), SampleRate::Hz44100);
        assert_eq!(sample_rate_from_u32(12345), SampleRate::Hz16000);
    }
}
