//! Layered configuration for the voice pipeline.
//!
//! Settings are loaded from, in priority order: environment variables
//! (`VOX_` prefix), an environment-specific YAML file, `config/default.yaml`,
//! and finally built-in defaults on every field.

pub mod constants;
pub mod pipeline;
pub mod settings;

pub use pipeline::{
    AudioConfig, CaptureConfig, PipelineConfig, PlaybackConfig, ReconnectConfig, WakeWordConfig,
};
pub use settings::{
    load_edge_settings, load_settings, EdgeSettings, FeatureFlags, LlmSettings,
    ObservabilityConfig, RateLimitConfig, RuntimeEnvironment, ServerConfig, Settings,
    TransportConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
