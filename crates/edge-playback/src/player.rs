//! Session-oriented PCM player: `idle` / `buffering` / `playing`, jitter
//! absorption, exactly-once fade-in/out. The driver loop (async, polls the
//! jitter buffer on a timer) and the device task (`spawn_blocking`, owns
//! the `rodio::Sink`) are split the way the teacher's streaming TTS
//! playback splits synthesis from `play_chunks_rodio`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rodio::{OutputStream, Sink};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vox_config::PlaybackConfig;

use crate::error::{PlaybackError, Result};
use crate::fade::{fade_in, fade_out};
use crate::jitter::JitterBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Buffering,
    Playing,
}

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const SILENCE_CHUNK_MS: usize = 20;

struct Session {
    stream_id: String,
    jitter: Arc<JitterBuffer>,
    state: Arc<Mutex<PlaybackState>>,
    cancel: CancellationToken,
    driver: JoinHandle<()>,
}

/// A session-scoped, fade-shaped PCM player. One `PlaybackEngine` per edge
/// process; the active session (if any) owns the jitter buffer and output
/// device for its lifetime.
pub struct PlaybackEngine {
    config: PlaybackConfig,
    session: Mutex<Option<Session>>,
}

impl PlaybackEngine {
    pub fn new(config: PlaybackConfig) -> Arc<Self> {
        Arc::new(Self { config, session: Mutex::new(None) })
    }

    pub fn state(&self) -> PlaybackState {
        match self.session.lock().as_ref() {
            Some(session) => *session.state.lock(),
            None => PlaybackState::Idle,
        }
    }

    pub fn current_stream_id(&self) -> Option<String> {
        self.session.lock().as_ref().map(|s| s.stream_id.clone())
    }

    /// Depth of the active session's jitter buffer, for the
    /// `vox_edge_jitter_depth` gauge. Zero outside a session.
    pub fn jitter_depth(&self) -> usize {
        self.session.lock().as_ref().map(|s| s.jitter.len()).unwrap_or(0)
    }

    /// Transition idle -> buffering for a new stream. Any session already
    /// in flight is interrupted first (the session invariant allows at
    /// most one `AudioOutCtx` at a time).
    pub fn begin_session(self: &Arc<Self>, stream_id: String, sample_rate: u32) {
        self.interrupt();

        let jitter = Arc::new(JitterBuffer::new(self.config.jitter_capacity_chunks));
        let state = Arc::new(Mutex::new(PlaybackState::Buffering));
        let cancel = CancellationToken::new();

        let driver = tokio::spawn(drive_session(
            Arc::clone(&jitter),
            Arc::clone(&state),
            sample_rate,
            self.config.jitter_buffering_chunks,
            self.config.fade_samples,
            cancel.clone(),
        ));

        info!(%stream_id, sample_rate, "playback session started");
        *self.session.lock() = Some(Session { stream_id, jitter, state, cancel, driver });
    }

    /// Append a chunk to the jitter buffer. Returns `false` if the buffer
    /// was full and the oldest chunk had to be dropped.
    pub fn feed(&self, samples: Vec<f32>) -> bool {
        match self.session.lock().as_ref() {
            Some(session) => {
                let accepted = session.jitter.push(samples);
                if !accepted {
                    warn!(stream_id = %session.stream_id, "jitter buffer full, dropped oldest chunk");
                }
                accepted
            }
            None => false,
        }
    }

    /// No more chunks are coming: drain what remains, fade out the final
    /// chunk, then return to idle.
    pub async fn end_session(&self) {
        let session = self.session.lock().take();
        if let Some(session) = session {
            session.jitter.mark_finished();
            if session.driver.await.is_err() {
                warn!(stream_id = %session.stream_id, "playback driver task panicked");
            }
        }
    }

    /// Immediate stop: clear the buffer, fade out whatever the device is
    /// about to play, return to idle. Idempotent; a no-op outside a session.
    pub fn interrupt(&self) {
        let session = self.session.lock().take();
        if let Some(session) = session {
            info!(stream_id = %session.stream_id, "playback interrupted");
            session.jitter.clear();
            session.cancel.cancel();
        }
    }
}

async fn drive_session(
    jitter: Arc<JitterBuffer>,
    state: Arc<Mutex<PlaybackState>>,
    sample_rate: u32,
    buffering_chunks: usize,
    fade_samples: usize,
    cancel: CancellationToken,
) {
    let (chunk_tx, chunk_rx) = mpsc::channel::<Vec<f32>>(8);
    let device_cancel = cancel.clone();
    let device_task: JoinHandle<Result<()>> =
        tokio::task::spawn_blocking(move || run_device(chunk_rx, sample_rate, device_cancel));

    let mut first_chunk_sent = false;
    let mut ticker = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let current = *state.lock();
                match current {
                    PlaybackState::Idle => break,
                    PlaybackState::Buffering => {
                        if jitter.len() >= buffering_chunks || (jitter.is_finished() && !jitter.is_empty()) {
                            *state.lock() = PlaybackState::Playing;
                        } else if jitter.is_finished() && jitter.is_empty() {
                            break;
                        }
                    }
                    PlaybackState::Playing => {
                        let is_last = jitter.is_finished() && jitter.len() <= 1;
                        match jitter.pop() {
                            Some(mut chunk) => {
                                if !first_chunk_sent {
                                    fade_in(&mut chunk, fade_samples);
                                    first_chunk_sent = true;
                                }
                                if is_last {
                                    fade_out(&mut chunk, fade_samples);
                                }
                                if chunk_tx.send(chunk).await.is_err() {
                                    break;
                                }
                                if is_last {
                                    break;
                                }
                            }
                            None => {
                                if jitter.is_finished() {
                                    break;
                                }
                                let silence_len = (sample_rate as usize * SILENCE_CHUNK_MS) / 1000;
                                if chunk_tx.send(vec![0.0; silence_len]).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    drop(chunk_tx);
    match device_task.await {
        Ok(Ok(())) => debug!("playback device task finished"),
        Ok(Err(e)) => warn!(error = %e, "playback device error"),
        Err(e) => warn!(error = %e, "playback device task panicked"),
    }
}

fn open_output_stream() -> Result<(OutputStream, rodio::OutputStreamHandle)> {
    OutputStream::try_default().map_err(|_| PlaybackError::NoOutputDevice)
}

/// Owns the `rodio::Sink` for the session's lifetime. Polls `cancel`
/// between appends so an `interrupt()` stops audio promptly rather than
/// waiting for the queued buffer to drain.
fn run_device(mut rx: mpsc::Receiver<Vec<f32>>, sample_rate: u32, cancel: CancellationToken) -> Result<()> {
    let (_stream, stream_handle) = open_output_stream()?;
    let sink = Sink::try_new(&stream_handle).map_err(|e| PlaybackError::Sink(e.to_string()))?;

    let rt = tokio::runtime::Handle::current();
    loop {
        if cancel.is_cancelled() {
            sink.stop();
            return Ok(());
        }
        match rt.block_on(rx.recv()) {
            Some(samples) => {
                let source = rodio::buffer::SamplesBuffer::new(1, sample_rate, samples);
                sink.append(source);
            }
            None => break,
        }
    }

    while !sink.empty() {
        if cancel.is_cancelled() {
            sink.stop();
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    sink.sleep_until_end();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PlaybackConfig {
        PlaybackConfig { jitter_buffering_chunks: 2, fade_samples: 4, jitter_capacity_chunks: 8 }
    }

    #[test]
    fn test_idle_state_with_no_session() {
        let engine = PlaybackEngine::new(config());
        assert_eq!(engine.state(), PlaybackState::Idle);
        assert!(engine.current_stream_id().is_none());
    }

    #[test]
    fn test_feed_without_session_is_rejected() {
        let engine = PlaybackEngine::new(config());
        assert!(!engine.feed(vec![0.0; 10]));
    }

    #[test]
    fn test_interrupt_outside_session_is_noop() {
        let engine = PlaybackEngine::new(config());
        engine.interrupt(); // must not panic
        assert_eq!(engine.state(), PlaybackState::Idle);
    }
}
