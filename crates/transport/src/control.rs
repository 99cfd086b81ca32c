//! Control message shapes exchanged over the transport channel's text
//! frames. Binary frames carry raw PCM and are not modeled here — see
//! `pcm.rs`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioInputConfig {
    pub sample_rate: u32,
    pub channels: u8,
    pub encoding: String,
    pub language: String,
}

/// Messages the edge sends to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientControlMessage {
    StartAudioInput { config: AudioInputConfig },
    StopAudioInput,
    Interrupt,
}

/// Messages the server sends to the edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerControlMessage {
    Connected { session_id: String, message: String },
    Transcript { text: String, is_final: bool, speech_final: bool, confidence: f32 },
    IntentDetected { route: String },
    RouteDecision { route: String },
    ResponseComplete { text: String },
    StreamStart { stream_id: String, sample_rate: u32 },
    StreamEnd { stream_id: String },
    StopPlayback,
    Error { message: String },
}

impl ServerControlMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("control message is always serializable")
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

impl ClientControlMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("control message is always serializable")
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_audio_input_round_trip() {
        let msg = ClientControlMessage::StartAudioInput {
            config: AudioInputConfig {
                sample_rate: 16000,
                channels: 1,
                encoding: "linear16".into(),
                language: "en-US".into(),
            },
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"start_audio_input\""));

        let parsed = ClientControlMessage::from_json(&json).unwrap();
        matches!(parsed, ClientControlMessage::StartAudioInput { .. });
    }

    #[test]
    fn test_stop_audio_input_shape() {
        let parsed = ClientControlMessage::from_json(r#"{"type":"stop_audio_input"}"#).unwrap();
        assert!(matches!(parsed, ClientControlMessage::StopAudioInput));
    }

    #[test]
    fn test_transcript_json_shape() {
        let msg = ServerControlMessage::Transcript {
            text: "hello".into(),
            is_final: true,
            speech_final: true,
            confidence: 0.97,
        };
        let json = msg.to_json();
        assert!(json.contains("\"type\":\"transcript\""));
        assert!(json.contains("\"is_final\":true"));
    }

    #[test]
    fn test_stream_start_shape() {
        let msg = ServerControlMessage::StreamStart { stream_id: "abc".into(), sample_rate: 16000 };
        let json = msg.to_json();
        assert_eq!(json, r#"{"type":"stream_start","stream_id":"abc","sample_rate":16000}"#);
    }
}
