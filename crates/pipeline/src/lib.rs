//! The four server-side pipeline stages that sit between the transport and
//! the provider boundary: STT bridge, router, response streamer, TTS bridge.
//!
//! None of these own the session state machine; that lives in
//! `vox_server::session::Session`, which drives them in sequence per the
//! `idle -> listening -> transcribing -> routing -> generating -> speaking`
//! transitions.

pub mod error;
pub mod response_streamer;
pub mod router;
pub mod stt;
pub mod tts;

pub use error::{PipelineError, Result};
pub use response_streamer::{ResponseChunk, ResponseStreamer, ResponseStreamerConfig};
pub use router::{Route, Router, RouterConfig};
pub use stt::{HttpSttConfig, HttpStreamingStt, SttBridge, SttBridgeConfig, SttEvent};
pub use tts::{HttpStreamingTts, HttpTtsConfig, TtsBridge, TtsBridgeConfig};
