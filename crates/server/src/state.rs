//! Shared application state handed to every websocket connection and HTTP
//! handler: configuration, the session table, the agent registry, and the
//! provider handles the pipeline stages are built around.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;

use vox_agent::AgentRegistry;
use vox_config::Settings;
use vox_core::{LanguageModel, SpeechToText, TextToSpeech};
use vox_pipeline::Router;

use crate::session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<Settings>>,
    pub sessions: Arc<SessionManager>,
    pub agents: Arc<AgentRegistry>,
    pub router: Arc<Router>,
    pub stt: Arc<dyn SpeechToText>,
    pub tts: Arc<dyn TextToSpeech>,
    pub llm: Arc<dyn LanguageModel>,
    pub metrics_handle: Arc<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        config: Settings,
        agents: AgentRegistry,
        router: Router,
        stt: Arc<dyn SpeechToText>,
        tts: Arc<dyn TextToSpeech>,
        llm: Arc<dyn LanguageModel>,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        let sessions = Arc::new(SessionManager::with_config(
            config.server.max_connections,
            config.pipeline.conversation_capacity,
            std::time::Duration::from_secs(config.server.session_timeout_s),
            std::time::Duration::from_secs(300),
        ));

        Self {
            config: Arc::new(RwLock::new(config)),
            sessions,
            agents: Arc::new(agents),
            router: Arc::new(router),
            stt,
            tts,
            llm,
            metrics_handle: Arc::new(metrics_handle),
        }
    }

    pub fn reload_config(&self, new_config: Settings) {
        *self.config.write() = new_config;
    }
}
