//! Edge-side audio playback: jitter-absorbing, fade-shaped, session-scoped
//! streaming of server-sent PCM to the local output device. Mirrors
//! `edge-capture`'s split between a pure decision core and a thin async/
//! blocking shell that owns the hardware resource.

pub mod error;
pub mod fade;
pub mod jitter;
pub mod player;

pub use error::{PlaybackError, Result};
pub use fade::{fade_in, fade_out};
pub use jitter::JitterBuffer;
pub use player::{PlaybackEngine, PlaybackState};
