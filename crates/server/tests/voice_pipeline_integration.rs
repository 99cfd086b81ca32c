//! Integration tests for the session state machine, exercising full
//! `idle -> ... -> idle` turns the way `websocket.rs` drives `Session`.

use std::sync::Arc;
use std::time::Duration;

use vox_pipeline::Route;
use vox_server::session::{Session, SessionManager, SessionState};

/// S1-shaped happy path: a full turn from listening through speaking and
/// back to idle, ready for the next utterance.
#[test]
fn test_full_turn_returns_to_idle_and_accepts_next_turn() {
    let session = Session::new("s1", 20);

    session.begin_listening("u1").unwrap();
    assert_eq!(session.state(), SessionState::Listening);

    session.begin_transcribing().unwrap();
    session.begin_routing("what is the capital of india").unwrap();
    session.begin_generating(Route::Direct).unwrap();
    session.begin_speaking("stream-1", 22050).unwrap();
    session.finish_turn().unwrap();

    assert_eq!(session.state(), SessionState::Idle);

    // the next turn must be able to start right away
    session.begin_listening("u2").unwrap();
    assert_eq!(session.state(), SessionState::Listening);
}

/// S4: silence timeout. The edge streams only silence, STT never produces
/// usable speech, and the final transcript is empty. The session must
/// return to idle without ever entering `routing`/`generating`, and must
/// accept a new turn afterwards.
#[test]
fn test_empty_final_transcript_returns_to_idle_without_generating() {
    let session = Session::new("s1", 20);

    session.begin_listening("u1").unwrap();
    session.begin_transcribing().unwrap();
    assert_eq!(session.state(), SessionState::Transcribing);

    // empty/whitespace-only final transcript: abort rather than route
    session.abort_turn().unwrap();
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.current_utterance_id().is_none());

    // session is not stuck: a new start_audio_input succeeds
    session.begin_listening("u2").unwrap();
    assert_eq!(session.state(), SessionState::Listening);
}

/// S3: barge-in mid-response cancels generation/playback and settles back
/// to idle, ready for the next turn.
#[test]
fn test_barge_in_then_new_turn() {
    let session = Session::new("s1", 20);
    session.begin_listening("u1").unwrap();
    session.begin_transcribing().unwrap();
    session.begin_routing("tell me a long story").unwrap();
    let cancel = session.begin_generating(Route::Direct).unwrap();
    let playback_cancel = session.begin_speaking("stream-1", 22050).unwrap();

    session.interrupt().unwrap();
    assert!(cancel.is_cancelled());
    assert!(playback_cancel.is_cancelled());
    assert_eq!(session.state(), SessionState::Interrupting);

    session.finish_interrupt().unwrap();
    assert_eq!(session.state(), SessionState::Idle);

    session.begin_listening("u2").unwrap();
    assert_eq!(session.state(), SessionState::Listening);
}

#[tokio::test]
async fn test_session_manager_reaps_and_accepts_new_sessions_under_the_cap() {
    let manager = Arc::new(SessionManager::with_config(1, 20, Duration::from_millis(0), Duration::from_secs(60)));
    let first = manager.create().unwrap();
    assert_eq!(manager.count(), 1);
    assert!(manager.create().is_err(), "at the cap, a second session must be rejected");

    tokio::time::sleep(Duration::from_millis(5)).await;
    manager.remove(&first.id);
    assert_eq!(manager.count(), 0);

    let second = manager.create().unwrap();
    assert_eq!(manager.count(), 1);
    assert_ne!(second.id, first.id);
}
