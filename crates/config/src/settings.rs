//! Main settings module.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, PipelineConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Server process settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub features: FeatureFlags,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.latency_budget_ms < 200 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.latency_budget_ms".to_string(),
                message: "latency budget too low (minimum 200ms)".to_string(),
            });
        }
        if self.pipeline.latency_budget_ms > 10_000 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.latency_budget_ms".to_string(),
                message: "latency budget too high (maximum 10000ms)".to_string(),
            });
        }
        self.validate_server()
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;
        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "port cannot be 0".to_string(),
            });
        }
        if server.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_connections".to_string(),
                message: "max connections must be at least 1".to_string(),
            });
        }
        let rate_limit = &server.rate_limit;
        if rate_limit.enabled && rate_limit.messages_per_second == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.rate_limit.messages_per_second".to_string(),
                message: "must be at least 1 when rate limiting is enabled".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default = "default_session_timeout_s")]
    pub session_timeout_s: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_ws_path() -> String {
    "/ws".to_string()
}
fn default_max_connections() -> usize {
    1000
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_session_timeout_s() -> u64 {
    3600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ws_path: default_ws_path(),
            max_connections: default_max_connections(),
            timeout_seconds: default_timeout(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
            rate_limit: RateLimitConfig::default(),
            session_timeout_s: default_session_timeout_s(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_messages_per_second")]
    pub messages_per_second: u32,
    #[serde(default = "default_burst_multiplier")]
    pub burst_multiplier: f32,
}

fn default_messages_per_second() -> u32 {
    100
}
fn default_burst_multiplier() -> f32 {
    2.0
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            messages_per_second: default_messages_per_second(),
            burst_multiplier: default_burst_multiplier(),
        }
    }
}

/// Reference LLM connection settings (the real provider is an external
/// collaborator; this configures the Ollama-compatible reference adapter).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_llm_endpoint() -> String {
    crate::constants::endpoints::OLLAMA_DEFAULT.clone()
}
fn default_llm_model() -> String {
    "llama3.1".to_string()
}
fn default_llm_timeout_ms() -> u64 {
    crate::constants::timeouts::LLM_REQUEST_MS
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            timeout_ms: default_llm_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_metrics_port() -> u16 {
    9090
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
            metrics_port: default_metrics_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    #[serde(default = "default_true")]
    pub barge_in_enabled: bool,
    #[serde(default)]
    pub early_intent_routing: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            barge_in_enabled: true,
            early_intent_routing: true,
        }
    }
}

/// Load settings from files and environment.
///
/// Priority (highest to lowest): environment variables (`VOX_` prefix),
/// `config/{env}.yaml`, `config/default.yaml`, built-in defaults.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let config = build_layered_config(env)?;
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

/// Edge process settings: transport endpoint plus the same pipeline-tunable
/// options the server uses, so the two binaries never drift on a default.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EdgeSettings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl EdgeSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transport.endpoint.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "transport.endpoint".to_string(),
                message: "endpoint must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_transport_endpoint")]
    pub endpoint: String,
}

fn default_transport_endpoint() -> String {
    "ws://127.0.0.1:8080/ws".to_string()
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { endpoint: default_transport_endpoint() }
    }
}

/// Load edge settings the same layered way as [`load_settings`].
pub fn load_edge_settings(env: Option<&str>) -> Result<EdgeSettings, ConfigError> {
    let config = build_layered_config(env)?;
    let settings: EdgeSettings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

fn build_layered_config(env: Option<&str>) -> Result<config::Config, ConfigError> {
    let mut builder = Config::builder();
    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("VOX")
            .separator("__")
            .try_parsing(true),
    );

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert!(settings.features.barge_in_enabled);
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();
        settings.pipeline.latency_budget_ms = 100;
        assert!(settings.validate().is_err());

        settings.pipeline.latency_budget_ms = 500;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_server_validation() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_edge_settings_defaults() {
        let settings = EdgeSettings::default();
        assert_eq!(settings.transport.endpoint, "ws://127.0.0.1:8080/ws");
        assert_eq!(settings.pipeline.audio.sample_rate, 16_000);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_edge_settings_rejects_empty_endpoint() {
        let mut settings = EdgeSettings::default();
        settings.transport.endpoint.clear();
        assert!(settings.validate().is_err());
    }
}
