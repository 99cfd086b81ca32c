//! Capture session state machine: wake-word gate or push-to-talk, adaptive
//! silence, hard timeout. Split into a pure [`CaptureEngine`] (fully unit
//! testable, no I/O) driven by an async [`CaptureController`] that owns the
//! `cpal` stream and the outbound channels.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use vox_config::{AudioConfig, CaptureConfig};
use vox_core::{AudioFrame, Channels, SampleRate};

use crate::device;
use crate::error::Result;
use crate::ring::{audio_ring_buffer, AudioConsumer};
use crate::silence::{energy, SilenceTracker};
use crate::wake_word::WakeWordDetector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    WakeWord,
    PushToTalk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Silence,
    Timeout,
    UserCommand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    SessionStarted,
    SessionStopped(StopReason),
    /// Wake-word fired while playback was active: caller must send
    /// `interrupt` to the server and stop the Playback Engine immediately.
    BargeIn,
}

enum EngineState {
    Idle,
    Capturing { tracker: SilenceTracker, elapsed_ms: u32, timeout_ms: u32 },
}

/// Pure decision logic, independent of `cpal`/channels/timers so it can be
/// driven directly from tests with synthetic chunks.
pub struct CaptureEngine {
    mode: CaptureMode,
    wake_word: Arc<dyn WakeWordDetector>,
    capture_cfg: CaptureConfig,
    chunk_ms: u32,
    state: EngineState,
}

impl CaptureEngine {
    pub fn new(mode: CaptureMode, wake_word: Arc<dyn WakeWordDetector>, capture_cfg: CaptureConfig, chunk_ms: u32) -> Self {
        Self { mode, wake_word, capture_cfg, chunk_ms, state: EngineState::Idle }
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, EngineState::Capturing { .. })
    }

    fn begin(&mut self) -> CaptureEvent {
        self.state = EngineState::Capturing {
            tracker: SilenceTracker::new(&self.capture_cfg, self.chunk_ms),
            elapsed_ms: 0,
            timeout_ms: self.capture_cfg.listening_timeout_s * 1000,
        };
        self.wake_word.stop_listening();
        CaptureEvent::SessionStarted
    }

    fn end(&mut self, reason: StopReason) -> CaptureEvent {
        self.state = EngineState::Idle;
        self.wake_word.start_listening();
        CaptureEvent::SessionStopped(reason)
    }

    /// Toggle capture on for push-to-talk mode. No-op (besides a log) if a
    /// session is already active.
    pub fn start_push_to_talk(&mut self) -> Vec<CaptureEvent> {
        if self.mode != CaptureMode::PushToTalk || self.is_capturing() {
            return Vec::new();
        }
        vec![self.begin()]
    }

    pub fn stop_push_to_talk(&mut self) -> Vec<CaptureEvent> {
        if !self.is_capturing() {
            return Vec::new();
        }
        vec![self.end(StopReason::UserCommand)]
    }

    /// Feed one fixed-size chunk of resampled mono f32 samples. `playback_active`
    /// signals whether a wake-word detection should be treated as barge-in.
    pub fn on_chunk(&mut self, samples: &[f32], playback_active: bool) -> Vec<CaptureEvent> {
        match &mut self.state {
            EngineState::Idle => {
                if self.mode != CaptureMode::WakeWord {
                    return Vec::new();
                }
                if !self.wake_word.detect(samples) {
                    return Vec::new();
                }
                if playback_active {
                    let mut events = vec![CaptureEvent::BargeIn];
                    events.push(self.begin());
                    events
                } else {
                    vec![self.begin()]
                }
            }
            EngineState::Capturing { tracker, elapsed_ms, timeout_ms } => {
                *elapsed_ms += self.chunk_ms;
                let sustained_silence = tracker.observe(energy(samples));
                if sustained_silence {
                    return vec![self.end(StopReason::Silence)];
                }
                if *elapsed_ms >= *timeout_ms {
                    return vec![self.end(StopReason::Timeout)];
                }
                Vec::new()
            }
        }
    }
}

/// Owns the `cpal` input stream and bridges it to the transport-writer
/// channel. Never blocks the audio callback: a full outbound channel drops
/// the chunk and logs, per the buffer_overflow error kind.
pub struct CaptureController {
    engine: CaptureEngine,
    consumer: AudioConsumer,
    _stream: cpal::Stream,
    chunk_samples: usize,
    sample_rate: SampleRate,
    sequence: u64,
    accumulator: Vec<f32>,
}

fn sample_rate_from_u32(rate: u32) -> SampleRate {
    match rate {
        8_000 => SampleRate::Hz8000,
        22_050 => SampleRate::Hz22050,
        44_100 => SampleRate::Hz44100,
        48_000 => SampleRate::Hz48000,
        _ => SampleRate::Hz16000,
    }
}

impl CaptureController {
    pub fn new(
        mode: CaptureMode,
        wake_word: Arc<dyn WakeWordDetector>,
        audio_cfg: &AudioConfig,
        capture_cfg: CaptureConfig,
    ) -> Result<Self> {
        let (producer, consumer) = audio_ring_buffer(None);
        let stream = device::start_capture(producer, audio_cfg.sample_rate)?;
        let chunk_samples = (audio_cfg.sample_rate as usize * audio_cfg.chunk_ms as usize) / 1000;

        Ok(Self {
            engine: CaptureEngine::new(mode, wake_word, capture_cfg, audio_cfg.chunk_ms),
            consumer,
            _stream: stream,
            chunk_samples,
            sample_rate: sample_rate_from_u32(audio_cfg.sample_rate),
            sequence: 0,
            accumulator: Vec::with_capacity(chunk_samples * 2),
        })
    }

    pub fn is_capturing(&self) -> bool {
        self.engine.is_capturing()
    }

    /// Drain whatever the ring buffer has accumulated, process full chunks
    /// through the engine, and forward PCM bytes for any chunk captured
    /// while a session is active. Call this on a fixed-period timer.
    pub fn poll(&mut self, playback_active: bool, outbound: &mpsc::Sender<Vec<u8>>) -> Vec<CaptureEvent> {
        self.accumulator.extend(self.consumer.drain_all());
        let mut events = Vec::new();

        while self.accumulator.len() >= self.chunk_samples {
            let chunk: Vec<f32> = self.accumulator.drain(..self.chunk_samples).collect();
            let was_capturing = self.engine.is_capturing();
            let chunk_events = self.engine.on_chunk(&chunk, playback_active);

            // The chunk that triggers a session start was consumed for
            // wake-word detection while idle, not captured speech; the
            // chunk that trails a stop decision still is, so send it.
            if was_capturing {
                self.send_chunk(&chunk, outbound);
            }
            events.extend(chunk_events);
        }
        events
    }

    /// Manually begin a capture session (push-to-talk toggle).
    pub fn start_push_to_talk(&mut self) -> Vec<CaptureEvent> {
        self.engine.start_push_to_talk()
    }

    pub fn stop_push_to_talk(&mut self) -> Vec<CaptureEvent> {
        self.engine.stop_push_to_talk()
    }

    fn send_chunk(&mut self, samples: &[f32], outbound: &mpsc::Sender<Vec<u8>>) {
        let frame = AudioFrame::new(samples.to_vec(), self.sample_rate, Channels::Mono, self.sequence);
        self.sequence += 1;
        let bytes = frame.to_pcm16();
        match outbound.try_send(bytes) {
            Ok(()) => debug!(seq = self.sequence, "capture chunk forwarded"),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("outbound channel full, dropping capture chunk");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                info!("outbound channel closed, capture controller stopping forward");
            }
        }
    }
}
