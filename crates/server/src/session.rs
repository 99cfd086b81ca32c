//! Session state machine.
//!
//! `Session` owns the `idle -> listening -> transcribing -> routing ->
//! generating -> speaking -> idle` transitions for one connection, plus the
//! `interrupting` and `error` states reachable from most of them. It holds
//! no pipeline stages itself — `websocket.rs` drives `vox_pipeline`'s
//! `SttBridge`/`Router`/`ResponseStreamer`/`TtsBridge` and calls back into
//! these transition methods to keep the visible state consistent with what
//! is actually happening.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use vox_core::Conversation;
use vox_pipeline::Route;

use crate::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Listening,
    Transcribing,
    Routing,
    Generating,
    Speaking,
    Interrupting,
    Error,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub struct UtteranceCtx {
    pub utterance_id: String,
    pub start_time: Instant,
    pub last_interim_text: String,
    pub last_final_text: Option<String>,
    pub detected_route: Option<Route>,
    pub cancel: CancellationToken,
}

impl UtteranceCtx {
    fn new(utterance_id: impl Into<String>) -> Self {
        Self {
            utterance_id: utterance_id.into(),
            start_time: Instant::now(),
            last_interim_text: String::new(),
            last_final_text: None,
            detected_route: None,
            cancel: CancellationToken::new(),
        }
    }
}

pub struct AudioOutCtx {
    pub stream_id: String,
    pub sample_rate: u32,
    pub chunks_sent: u64,
    pub cancel: CancellationToken,
}

impl AudioOutCtx {
    fn new(stream_id: impl Into<String>, sample_rate: u32) -> Self {
        Self { stream_id: stream_id.into(), sample_rate, chunks_sent: 0, cancel: CancellationToken::new() }
    }
}

/// Per-connection state. Every mutable field is guarded by its own lock
/// rather than one lock over the whole session, since the websocket
/// handler's read side (forwarding transcript/audio events) and write side
/// (handling incoming control messages) run as concurrent tasks.
pub struct Session {
    pub id: String,
    state: RwLock<SessionState>,
    utterance: RwLock<Option<UtteranceCtx>>,
    audio_out: RwLock<Option<AudioOutCtx>>,
    pub conversation: RwLock<Conversation>,
    created_at: Instant,
    last_activity: RwLock<Instant>,
}

impl Session {
    pub fn new(id: impl Into<String>, conversation_capacity: usize) -> Self {
        Self {
            id: id.into(),
            state: RwLock::new(SessionState::Idle),
            utterance: RwLock::new(None),
            audio_out: RwLock::new(None),
            conversation: RwLock::new(Conversation::new(conversation_capacity)),
            created_at: Instant::now(),
            last_activity: RwLock::new(Instant::now()),
        }
    }

    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.read().elapsed()
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    pub fn current_utterance_id(&self) -> Option<String> {
        self.utterance.read().as_ref().map(|u| u.utterance_id.clone())
    }

    fn transition(&self, allowed_from: &[SessionState], to: SessionState) -> Result<(), ServerError> {
        let mut state = self.state.write();
        if !allowed_from.contains(&*state) {
            return Err(ServerError::Session(format!(
                "cannot move to {to} from {state} (expected one of {allowed_from:?})"
            )));
        }
        *state = to;
        Ok(())
    }

    /// `idle -> listening`. Barge-in (a new `start_audio_input` while the
    /// session is still `speaking`/`generating`) is handled by the caller:
    /// it must call `interrupt()` first and wait for it to settle before
    /// calling this.
    pub fn begin_listening(&self, utterance_id: impl Into<String>) -> Result<(), ServerError> {
        self.transition(&[SessionState::Idle], SessionState::Listening)?;
        *self.utterance.write() = Some(UtteranceCtx::new(utterance_id));
        self.touch();
        Ok(())
    }

    /// `listening -> transcribing`: input side closed (`stop_audio_input`
    /// or the provider's own endpointing), waiting on the STT bridge's
    /// final transcript.
    pub fn begin_transcribing(&self) -> Result<(), ServerError> {
        self.transition(&[SessionState::Listening], SessionState::Transcribing)
    }

    pub fn record_interim(&self, text: impl Into<String>) {
        if let Some(u) = self.utterance.write().as_mut() {
            u.last_interim_text = text.into();
        }
    }

    pub fn record_early_intent(&self, route: Route) {
        if let Some(u) = self.utterance.write().as_mut() {
            u.detected_route = Some(route);
        }
    }

    pub fn early_intent_hint(&self) -> Option<Route> {
        self.utterance.read().as_ref().and_then(|u| u.detected_route.clone())
    }

    /// `transcribing -> routing`: the final transcript is in.
    pub fn begin_routing(&self, final_text: impl Into<String>) -> Result<(), ServerError> {
        self.transition(&[SessionState::Transcribing], SessionState::Routing)?;
        if let Some(u) = self.utterance.write().as_mut() {
            u.last_final_text = Some(final_text.into());
        }
        Ok(())
    }

    /// `routing -> generating`: a route has been decided. Returns the
    /// cancellation token generation/streaming should honour for barge-in.
    pub fn begin_generating(&self, route: Route) -> Result<CancellationToken, ServerError> {
        self.transition(&[SessionState::Routing], SessionState::Generating)?;
        let mut utterance = self.utterance.write();
        let u = utterance.as_mut().ok_or_else(|| ServerError::Session("no active utterance".into()))?;
        u.detected_route = Some(route);
        Ok(u.cancel.clone())
    }

    /// `generating -> speaking`: first audio chunk of the response is
    /// about to go out. Returns the cancellation token playback streaming
    /// should honour.
    pub fn begin_speaking(&self, stream_id: impl Into<String>, sample_rate: u32) -> Result<CancellationToken, ServerError> {
        self.transition(&[SessionState::Generating], SessionState::Speaking)?;
        let ctx = AudioOutCtx::new(stream_id, sample_rate);
        let cancel = ctx.cancel.clone();
        *self.audio_out.write() = Some(ctx);
        Ok(cancel)
    }

    pub fn record_chunk_sent(&self) {
        if let Some(ctx) = self.audio_out.write().as_mut() {
            ctx.chunks_sent += 1;
        }
    }

    /// `speaking -> idle`: response fully flushed. Clears the utterance and
    /// audio-out contexts.
    pub fn finish_turn(&self) -> Result<(), ServerError> {
        self.transition(&[SessionState::Speaking, SessionState::Generating], SessionState::Idle)?;
        *self.utterance.write() = None;
        *self.audio_out.write() = None;
        Ok(())
    }

    /// `transcribing|routing -> idle`: the turn ends before generation ever
    /// starts, e.g. a final transcript that is empty or whitespace-only.
    /// Clears the utterance context; there is no audio-out context yet.
    pub fn abort_turn(&self) -> Result<(), ServerError> {
        self.transition(&[SessionState::Transcribing, SessionState::Routing], SessionState::Idle)?;
        *self.utterance.write() = None;
        Ok(())
    }

    /// Barge-in or an explicit `interrupt` control message. Valid from any
    /// state that has something worth cancelling; cancels whichever
    /// tokens exist and moves to `interrupting`. The caller is expected to
    /// follow up with `finish_interrupt()` once cleanup (closing the STT
    /// bridge, dropping the TTS stream) is done.
    pub fn interrupt(&self) -> Result<(), ServerError> {
        {
            let state = self.state.read();
            if matches!(*state, SessionState::Idle | SessionState::Error) {
                return Err(ServerError::Session(format!("nothing to interrupt in {}", *state)));
            }
        }
        *self.state.write() = SessionState::Interrupting;
        if let Some(u) = self.utterance.read().as_ref() {
            u.cancel.cancel();
        }
        if let Some(a) = self.audio_out.read().as_ref() {
            a.cancel.cancel();
        }
        Ok(())
    }

    /// `interrupting -> idle`: cleanup after `interrupt()` has settled.
    pub fn finish_interrupt(&self) -> Result<(), ServerError> {
        self.transition(&[SessionState::Interrupting], SessionState::Idle)?;
        *self.utterance.write() = None;
        *self.audio_out.write() = None;
        Ok(())
    }

    /// Any state -> `error`. Unlike the other transitions this never
    /// fails: an error can happen at any point in the pipeline.
    pub fn fail(&self, reason: impl Into<String>) {
        tracing::warn!(session_id = %self.id, reason = %reason.into(), "session entering error state");
        *self.state.write() = SessionState::Error;
        *self.utterance.write() = None;
        *self.audio_out.write() = None;
    }

    /// `error -> idle`: recover and accept new input.
    pub fn recover(&self) -> Result<(), ServerError> {
        self.transition(&[SessionState::Error], SessionState::Idle)
    }
}

/// Keeps every live session and reaps ones that have been idle too long,
/// mirroring a fixed timeout/cleanup-interval pair rather than a
/// persistent store: sessions here are purely in-process.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
    conversation_capacity: usize,
}

impl SessionManager {
    pub fn new(max_sessions: usize, conversation_capacity: usize) -> Self {
        Self::with_config(
            max_sessions,
            conversation_capacity,
            Duration::from_secs(3600),
            Duration::from_secs(300),
        )
    }

    pub fn with_config(
        max_sessions: usize,
        conversation_capacity: usize,
        session_timeout: Duration,
        cleanup_interval: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            session_timeout,
            cleanup_interval,
            conversation_capacity,
        }
    }

    pub fn create(&self) -> Result<Arc<Session>, ServerError> {
        let mut sessions = self.sessions.write();
        if sessions.len() >= self.max_sessions {
            return Err(ServerError::Session("max session count reached".into()));
        }
        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(id.clone(), self.conversation_capacity));
        sessions.insert(id, session.clone());
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    pub fn remove(&self, id: &str) {
        self.sessions.write().remove(id);
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }

    fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| session.idle_for() < self.session_timeout);
        before - sessions.len()
    }

    /// Spawns the periodic reaper task and returns a shutdown handle; drop
    /// or send on it to stop the loop.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = self.clone();
        let interval = self.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let reaped = manager.cleanup_expired();
                        if reaped > 0 {
                            tracing::info!(reaped, remaining = manager.count(), "reaped expired sessions");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let session = Session::new("s1", 20);
        session.begin_listening("u1").unwrap();
        assert_eq!(session.state(), SessionState::Listening);

        session.begin_transcribing().unwrap();
        session.begin_routing("hello").unwrap();
        assert_eq!(session.state(), SessionState::Routing);

        session.begin_generating(Route::Direct).unwrap();
        assert_eq!(session.state(), SessionState::Generating);

        session.begin_speaking("stream-1", 22050).unwrap();
        assert_eq!(session.state(), SessionState::Speaking);

        session.finish_turn().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_illegal_transition_rejected() {
        let session = Session::new("s1", 20);
        let err = session.begin_transcribing();
        assert!(err.is_err());
    }

    #[test]
    fn test_interrupt_cancels_tokens_and_settles_to_idle() {
        let session = Session::new("s1", 20);
        session.begin_listening("u1").unwrap();
        session.begin_transcribing().unwrap();
        session.begin_routing("hi").unwrap();
        let cancel = session.begin_generating(Route::Direct).unwrap();
        assert!(!cancel.is_cancelled());

        session.interrupt().unwrap();
        assert!(cancel.is_cancelled());
        assert_eq!(session.state(), SessionState::Interrupting);

        session.finish_interrupt().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.current_utterance_id().is_none());
    }

    #[test]
    fn test_abort_turn_returns_to_idle_from_transcribing() {
        let session = Session::new("s1", 20);
        session.begin_listening("u1").unwrap();
        session.begin_transcribing().unwrap();
        session.abort_turn().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.current_utterance_id().is_none());

        // session accepts a new turn right away
        session.begin_listening("u2").unwrap();
        assert_eq!(session.state(), SessionState::Listening);
    }

    #[test]
    fn test_abort_turn_rejected_outside_transcribing_or_routing() {
        let session = Session::new("s1", 20);
        assert!(session.abort_turn().is_err());
    }

    #[test]
    fn test_error_then_recover() {
        let session = Session::new("s1", 20);
        session.begin_listening("u1").unwrap();
        session.fail("stt provider crashed");
        assert_eq!(session.state(), SessionState::Error);
        session.recover().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_manager_create_get_remove() {
        let manager = Arc::new(SessionManager::new(10, 20));
        let session = manager.create().unwrap();
        assert_eq!(manager.count(), 1);
        assert!(manager.get(&session.id).is_some());
        manager.remove(&session.id);
        assert_eq!(manager.count(), 0);
    }

    #[tokio::test]
    async fn test_manager_enforces_max_sessions() {
        let manager = SessionManager::new(1, 20);
        manager.create().unwrap();
        assert!(manager.create().is_err());
    }

    #[tokio::test]
    async fn test_cleanup_reaps_expired_sessions() {
        let manager = SessionManager::with_config(10, 20, Duration::from_millis(0), Duration::from_secs(60));
        manager.create().unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let reaped = manager.cleanup_expired();
        assert_eq!(reaped, 1);
        assert_eq!(manager.count(), 0);
    }
}
