//! Voice server entry point: loads configuration, wires the default
//! providers (HTTP STT/TTS, Ollama-compatible LLM), and serves the
//! websocket + operational HTTP surface.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use vox_agent::{AgentRegistry, EchoAgent};
use vox_config::{load_settings, Settings};
use vox_core::{AgentDescriptor, LanguageModel, SpeechToText, TextToSpeech};
use vox_llm::{LanguageModelAdapter, LlmConfig, OllamaBackend};
use vox_pipeline::{HttpSttConfig, HttpStreamingStt, HttpStreamingTts, HttpTtsConfig, Router, RouterConfig};
use vox_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = std::env::var("VOX_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => {
            eprintln!("loaded configuration (env: {})", env.as_deref().unwrap_or("default"));
            settings
        }
        Err(e) => {
            eprintln!("failed to load config: {e}. using defaults.");
            Settings::default()
        }
    };

    init_tracing(&config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting vox-server");
    tracing::info!(environment = ?config.environment, "configuration loaded");

    let metrics_handle = init_metrics();
    tracing::info!("initialized prometheus metrics at /metrics");

    let stt: Arc<dyn SpeechToText> = Arc::new(HttpStreamingStt::new(HttpSttConfig::default())?);
    let tts: Arc<dyn TextToSpeech> = Arc::new(HttpStreamingTts::new(HttpTtsConfig::default())?);

    let llm_config = LlmConfig { endpoint: config.llm.endpoint.clone(), model: config.llm.model.clone(), ..LlmConfig::default() };
    let backend = OllamaBackend::new(llm_config)?;
    let llm: Arc<dyn LanguageModel> = Arc::new(LanguageModelAdapter::new(
        backend,
        "You are a helpful voice assistant. Keep replies brief, conversational, and easy to hear aloud.",
    ));

    let mut agents = AgentRegistry::new();
    agents.register(AgentDescriptor::new("echo", "repeats back what you said, for diagnostics"), Arc::new(EchoAgent::new("echo")));
    let descriptors = agents.descriptors();

    let router = Router::new(RouterConfig::default(), descriptors);

    let state = AppState::new(config.clone(), agents, router, stt, tts, llm, metrics_handle);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received sigterm, shutting down"),
    }
}

#[cfg(feature = "telemetry")]
fn init_tracing(config: &Settings) {
    use opentelemetry_otlp::WithExportConfig;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("vox={},tower_http=debug", config.observability.log_level).into());

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    subscriber.with(fmt_layer).init();
}

#[cfg(not(feature = "telemetry"))]
fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("vox={},tower_http=debug", config.observability.log_level).into());

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    subscriber.with(fmt_layer).init();
}
