//! Ollama-compatible LLM backend.
//!
//! KV-cache reuse across turns cuts time-to-first-token significantly in a
//! multi-turn voice conversation: the first turn pays full prompt processing,
//! later turns only pay for the new tokens.

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::prompt::Message;
use crate::LlmError;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub endpoint: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout: Duration,
    pub stream: bool,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    /// How long Ollama keeps the model loaded between calls ("5m", "-1", "0").
    pub keep_alive: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "llama3.1".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            max_tokens: 256,
            temperature: 0.7,
            top_p: 0.9,
            timeout: Duration::from_secs(30),
            stream: true,
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            keep_alive: "5m".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    pub tokens: usize,
    pub time_to_first_token_ms: u64,
    pub total_time_ms: u64,
    pub tokens_per_second: f32,
    pub finish_reason: FinishReason,
    /// Context returned by Ollama for KV-cache reuse on the next call.
    pub context: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Error,
    Cancelled,
}

/// Raw text in, text out backend interface. `adapter` bridges this to the
/// core `LanguageModel` trait the pipeline actually depends on.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError>;

    async fn generate_stream(
        &self,
        messages: &[Message],
        tx: mpsc::Sender<String>,
    ) -> Result<GenerationResult, LlmError>;

    async fn is_available(&self) -> bool;

    fn model_name(&self) -> &str;

    /// Rough estimate, ~4 characters per token for English text.
    fn estimate_tokens(&self, text: &str) -> usize {
        text.chars().count().max(1) / 4
    }
}

/// Ollama backend with KV-cache session context.
#[derive(Clone)]
pub struct OllamaBackend {
    client: Client,
    config: LlmConfig,
    session_context: Arc<Mutex<Option<Vec<i64>>>>,
}

impl OllamaBackend {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            session_context: Arc::new(Mutex::new(None)),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.endpoint, path)
    }

    /// Generate reusing the cached context from the previous call in this
    /// session, storing the new context for the next one.
    pub async fn generate_with_session(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        let context = self.session_context.lock().clone();
        let result = self.generate_with_context(messages, context.as_deref()).await?;

        if let Some(ref ctx) = result.context {
            *self.session_context.lock() = Some(ctx.clone());
        }

        Ok(result)
    }

    pub async fn generate_with_context(
        &self,
        messages: &[Message],
        context: Option<&[i64]>,
    ) -> Result<GenerationResult, LlmError> {
        let start = std::time::Instant::now();

        let request = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(|m| m.into()).collect(),
            stream: false,
            options: Some(OllamaOptions {
                temperature: Some(self.config.temperature),
                top_p: Some(self.config.top_p),
                num_predict: Some(self.config.max_tokens as i32),
            }),
            keep_alive: Some(self.config.keep_alive.clone()),
            context: context.map(|c| c.to_vec()),
        };

        let mut last_error = None;
        let mut backoff = self.config.initial_backoff;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    attempt,
                    max_retries = self.config.max_retries,
                    ?backoff,
                    "llm request failed, retrying",
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute_request(&request).await {
                Ok(result) => {
                    let total_time = start.elapsed();
                    return Ok(GenerationResult {
                        text: result.message.content,
                        tokens: result.eval_count.unwrap_or(0) as usize,
                        time_to_first_token_ms: result.prompt_eval_duration.unwrap_or(0) / 1_000_000,
                        total_time_ms: total_time.as_millis() as u64,
                        tokens_per_second: result.eval_count.unwrap_or(0) as f32
                            / (result.eval_duration.unwrap_or(1) as f32 / 1e9),
                        finish_reason: if result.done { FinishReason::Stop } else { FinishReason::Length },
                        context: result.context,
                    });
                }
                Err(e) if Self::is_retryable(&e) => {
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Network("max retries exceeded".to_string())))
    }

    pub fn clear_session(&self) {
        *self.session_context.lock() = None;
    }

    pub fn has_session_context(&self) -> bool {
        self.session_context.lock().is_some()
    }

    async fn execute_request(&self, request: &OllamaChatRequest) -> Result<OllamaChatResponse, LlmError> {
        let response = self.client.post(self.api_url("/chat")).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(LlmError::Network(format!("server error {}: {}", status, error)));
            }
            return Err(LlmError::Api(error));
        }

        response.json().await.map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }

    fn is_retryable(error: &LlmError) -> bool {
        matches!(error, LlmError::Network(_) | LlmError::Timeout)
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        self.generate_with_context(messages, None).await
    }

    async fn generate_stream(
        &self,
        messages: &[Message],
        tx: mpsc::Sender<String>,
    ) -> Result<GenerationResult, LlmError> {
        let start = std::time::Instant::now();
        let mut first_token_time = None;
        let mut total_tokens = 0;
        let mut full_response = String::new();
        let mut final_context = None;

        let cached_context = self.session_context.lock().clone();

        let request = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(|m| m.into()).collect(),
            stream: true,
            options: Some(OllamaOptions {
                temperature: Some(self.config.temperature),
                top_p: Some(self.config.top_p),
                num_predict: Some(self.config.max_tokens as i32),
            }),
            keep_alive: Some(self.config.keep_alive.clone()),
            context: cached_context,
        };

        let response = self.client.post(self.api_url("/chat")).json(&request).send().await?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(error));
        }

        let mut stream = response.bytes_stream();
        use futures::StreamExt;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let text = String::from_utf8_lossy(&chunk);

            for line in text.lines() {
                if line.is_empty() {
                    continue;
                }

                if let Ok(chunk_response) = serde_json::from_str::<OllamaStreamChunk>(line) {
                    if first_token_time.is_none() {
                        first_token_time = Some(start.elapsed());
                    }

                    let token = &chunk_response.message.content;
                    full_response.push_str(token);
                    total_tokens += 1;

                    if chunk_response.done {
                        final_context = chunk_response.context;
                    }

                    if tx.send(token.clone()).await.is_err() {
                        return Ok(GenerationResult {
                            text: full_response,
                            tokens: total_tokens,
                            time_to_first_token_ms: first_token_time.map(|t| t.as_millis() as u64).unwrap_or(0),
                            total_time_ms: start.elapsed().as_millis() as u64,
                            tokens_per_second: 0.0,
                            finish_reason: FinishReason::Cancelled,
                            context: final_context,
                        });
                    }

                    if chunk_response.done {
                        break;
                    }
                }
            }
        }

        if let Some(ref ctx) = final_context {
            *self.session_context.lock() = Some(ctx.clone());
        }

        let total_time = start.elapsed();

        Ok(GenerationResult {
            text: full_response,
            tokens: total_tokens,
            time_to_first_token_ms: first_token_time.map(|t| t.as_millis() as u64).unwrap_or(0),
            total_time_ms: total_time.as_millis() as u64,
            tokens_per_second: total_tokens as f32 / total_time.as_secs_f32(),
            finish_reason: FinishReason::Stop,
            context: final_context,
        })
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.config.endpoint))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<Vec<i64>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

impl From<&Message> for OllamaMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    done: bool,
    #[serde(default)]
    eval_count: Option<u64>,
    #[serde(default)]
    eval_duration: Option<u64>,
    #[serde(default)]
    prompt_eval_duration: Option<u64>,
    #[serde(default)]
    context: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
struct OllamaStreamChunk {
    message: OllamaMessage,
    done: bool,
    #[serde(default)]
    context: Option<Vec<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Role;

    #[test]
    fn test_config_default() {
        let config = LlmConfig::default();
        assert!(config.stream);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.keep_alive, "5m");
    }

    #[test]
    fn test_message_conversion() {
        let msg = Message { role: Role::User, content: "Hello".to_string() };
        let ollama_msg: OllamaMessage = (&msg).into();
        assert_eq!(ollama_msg.role, "user");
        assert_eq!(ollama_msg.content, "Hello");
    }

    #[test]
    fn test_session_context_management() {
        let backend = OllamaBackend::new(LlmConfig::default()).unwrap();

        assert!(!backend.has_session_context());

        *backend.session_context.lock() = Some(vec![1, 2, 3, 4, 5]);
        assert!(backend.has_session_context());

        backend.clear_session();
        assert!(!backend.has_session_context());
    }

    #[test]
    fn test_ollama_request_serialization() {
        let request = OllamaChatRequest {
            model: "test".to_string(),
            messages: vec![],
            stream: false,
            options: None,
            keep_alive: Some("5m".to_string()),
            context: Some(vec![1, 2, 3]),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("keep_alive"));
        assert!(json.contains("context"));
    }
}
