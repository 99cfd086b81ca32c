//! Wire protocol shared by the server and the edge binary: a JSON control
//! message on text frames, raw PCM16LE on binary frames. Neither side's
//! WebSocket library is a dependency of this crate — the server drives it
//! with `axum`'s ws support, the edge with `tokio-tungstenite`.

pub mod control;
pub mod pcm;

pub use control::{AudioInputConfig, ClientControlMessage, ServerControlMessage};
pub use pcm::{bytes_to_samples, samples_to_bytes, validate_alignment, PcmError};
