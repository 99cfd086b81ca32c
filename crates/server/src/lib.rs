//! WebSocket server that drives the per-connection session state machine:
//! transport in, STT/router/LLM-or-agent/TTS through `vox_pipeline` and
//! `vox_agent`, transport out.

pub mod http;
pub mod metrics;
pub mod session;
pub mod state;
pub mod websocket;

pub use http::create_router;
pub use metrics::init_metrics;
pub use session::{Session, SessionManager};
pub use state::AppState;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("session error: {0}")]
    Session(String),

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error(transparent)]
    Pipeline(#[from] vox_core::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for axum::http::StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Session(_) => axum::http::StatusCode::NOT_FOUND,
            ServerError::WebSocket(_) => axum::http::StatusCode::BAD_REQUEST,
            ServerError::Pipeline(_) => axum::http::StatusCode::BAD_GATEWAY,
            ServerError::InvalidRequest(_) => axum::http::StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
