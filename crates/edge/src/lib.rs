//! Edge process: wake-word-or-push-to-talk capture, jitter-buffered
//! playback, and the transport-client half of the wire protocol, wired
//! together with an exponential-backoff reconnect loop.

pub mod client;
pub mod error;
pub mod metrics;
pub mod push_to_talk;

pub use client::run_with_reconnect;
pub use error::{EdgeError, Result};
