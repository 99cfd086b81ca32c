//! Edge-side microphone capture: wake-word or push-to-talk gating, adaptive
//! silence detection, fixed-size PCM chunking. Mirrors the server's
//! session-scoped ownership — one `CaptureController` per process, its
//! resources released when the process exits.

pub mod controller;
pub mod device;
pub mod error;
pub mod ring;
pub mod silence;
pub mod wake_word;

pub use controller::{CaptureController, CaptureEngine, CaptureEvent, CaptureMode, StopReason};
pub use error::{CaptureError, Result};
pub use wake_word::{AlwaysSilentDetector, RmsThresholdDetector, WakeWordDetector};
