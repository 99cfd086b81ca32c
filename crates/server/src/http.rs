//! Router: the websocket upgrade route plus a minimal operational surface
//! (`/healthz`, `/metrics`). No REST session/chat/admin API — a session
//! exists only for the lifetime of its websocket connection.

use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::websocket::ws_handler;

pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state);
    let ws_path = state.config.read().server.ws_path.clone();

    Router::new()
        .route("/healthz", get(health_check))
        .route(&ws_path, get(ws_handler))
        .route("/metrics", get(metrics_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(state: &AppState) -> CorsLayer {
    let config = state.config.read();
    if !config.server.cors_enabled {
        return CorsLayer::permissive();
    }
    if config.server.cors_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(tower_http::cors::Any);
    }
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    active_sessions: usize,
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let response = HealthResponse { status: "ok", active_sessions: state.sessions.count() };
    (StatusCode::OK, Json(response))
}

async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vox_agent::AgentRegistry;
    use vox_config::Settings;

    fn test_state() -> AppState {
        use std::sync::Arc;
        use vox_pipeline::stt::mock::MockStreamingStt;
        let stt = Arc::new(MockStreamingStt::new(""));
        let tts = Arc::new(NullTts);
        let llm = Arc::new(NullLlm);
        let router = vox_pipeline::Router::new(vox_pipeline::RouterConfig::default(), vec![]);
        AppState::new(Settings::default(), AgentRegistry::new(), router, stt, tts, llm, test_metrics_handle())
    }

    fn test_metrics_handle() -> metrics_exporter_prometheus::PrometheusHandle {
        metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder().handle()
    }

    struct NullLlm;
    #[async_trait::async_trait]
    impl vox_core::LanguageModel for NullLlm {
        async fn generate(&self, _prompt: &str, _history: &vox_core::Conversation) -> vox_core::Result<String> {
            Ok(String::new())
        }
        fn generate_stream<'a>(
            &'a self,
            _prompt: &'a str,
            _history: &'a vox_core::Conversation,
        ) -> std::pin::Pin<Box<dyn futures::Stream<Item = vox_core::Result<String>> + Send + 'a>> {
            Box::pin(futures::stream::empty())
        }
        fn model_name(&self) -> &str {
            "null"
        }
    }

    struct NullTts;
    #[async_trait::async_trait]
    impl vox_core::TextToSpeech for NullTts {
        async fn synthesize(&self, _text: &str, _config: &vox_core::VoiceConfig) -> vox_core::Result<vox_core::AudioFrame> {
            Ok(vox_core::AudioFrame::new(vec![], Default::default(), Default::default(), 0))
        }
        fn synthesize_stream<'a>(
            &'a self,
            _text_stream: std::pin::Pin<Box<dyn futures::Stream<Item = String> + Send + 'a>>,
            _config: &'a vox_core::VoiceConfig,
        ) -> std::pin::Pin<Box<dyn futures::Stream<Item = vox_core::Result<vox_core::AudioFrame>> + Send + 'a>> {
            Box::pin(futures::stream::empty())
        }
        fn available_voices(&self) -> &[vox_core::VoiceInfo] {
            &[]
        }
        fn model_name(&self) -> &str {
            "null"
        }
    }

    #[tokio::test]
    async fn test_health_check_reports_zero_sessions() {
        let state = test_state();
        let (status, Json(body)) = health_check(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.active_sessions, 0);
    }

    #[test]
    fn test_cors_permissive_when_disabled() {
        let mut settings = Settings::default();
        settings.server.cors_enabled = false;
        let state = AppState::new(
            settings,
            AgentRegistry::new(),
            vox_pipeline::Router::new(vox_pipeline::RouterConfig::default(), vec![]),
            std::sync::Arc::new(vox_pipeline::stt::mock::MockStreamingStt::new("")),
            std::sync::Arc::new(NullTts),
            std::sync::Arc::new(NullLlm),
            test_metrics_handle(),
        );
        // Just exercises the path without panicking; CorsLayer has no
        // public introspection to assert permissiveness directly.
        let _ = build_cors_layer(&state);
    }
}
