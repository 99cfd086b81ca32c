//! Bridges the raw-text `LlmBackend` to the core `LanguageModel` trait the
//! router and response streamer depend on.

use std::pin::Pin;
use std::sync::Arc;
use async_trait::async_trait;
use futures::Stream;
use tokio::sync::mpsc;

use vox_core::{Conversation, Error, LanguageModel, Result};

use crate::backend::LlmBackend;
use crate::prompt::PromptBuilder;

pub struct LanguageModelAdapter {
    backend: Arc<dyn LlmBackend>,
    model_name: String,
    system_prompt: String,
}

impl LanguageModelAdapter {
    pub fn new<B: LlmBackend + 'static>(backend: B, system_prompt: impl Into<String>) -> Self {
        let model_name = backend.model_name().to_string();
        Self { backend: Arc::new(backend), model_name, system_prompt: system_prompt.into() }
    }

    pub fn from_arc(backend: Arc<dyn LlmBackend>, system_prompt: impl Into<String>) -> Self {
        let model_name = backend.model_name().to_string();
        Self { backend, model_name, system_prompt: system_prompt.into() }
    }

    fn build_messages(&self, prompt: &str, history: &Conversation) -> Vec<crate::prompt::Message> {
        PromptBuilder::new()
            .system_prompt(self.system_prompt.clone())
            .with_history(history)
            .user_message(prompt)
            .build()
    }
}

#[async_trait]
impl LanguageModel for LanguageModelAdapter {
    async fn generate(&self, prompt: &str, history: &Conversation) -> Result<String> {
        let messages = self.build_messages(prompt, history);
        self.backend
            .generate(&messages)
            .await
            .map(|r| r.text)
            .map_err(|e| Error::ProviderLlm(e.to_string()))
    }

    fn generate_stream<'a>(
        &'a self,
        prompt: &'a str,
        history: &'a Conversation,
    ) -> Pin<Box<dyn Stream<Item = Result<String>> + Send + 'a>> {
        let messages = self.build_messages(prompt, history);
        let backend = self.backend.clone();

        Box::pin(async_stream::stream! {
            let (tx, mut rx) = mpsc::channel::<String>(100);

            let stream_task = tokio::spawn(async move {
                backend.generate_stream(&messages, tx).await
            });

            while let Some(text) = rx.recv().await {
                yield Ok(text);
            }

            if let Ok(Err(e)) = stream_task.await {
                yield Err(Error::ProviderLlm(e.to_string()));
            }
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FinishReason, GenerationResult};
    use crate::LlmError;

    struct MockBackend {
        response: String,
    }

    #[async_trait]
    impl LlmBackend for MockBackend {
        async fn generate(&self, _messages: &[crate::prompt::Message]) -> std::result::Result<GenerationResult, LlmError> {
            Ok(GenerationResult {
                text: self.response.clone(),
                tokens: 10,
                time_to_first_token_ms: 50,
                total_time_ms: 100,
                tokens_per_second: 100.0,
                finish_reason: FinishReason::Stop,
                context: None,
            })
        }

        async fn generate_stream(
            &self,
            _messages: &[crate::prompt::Message],
            tx: mpsc::Sender<String>,
        ) -> std::result::Result<GenerationResult, LlmError> {
            for word in self.response.split_whitespace() {
                let _ = tx.send(format!("{} ", word)).await;
            }
            Ok(GenerationResult {
                text: self.response.clone(),
                tokens: 10,
                time_to_first_token_ms: 50,
                total_time_ms: 100,
                tokens_per_second: 100.0,
                finish_reason: FinishReason::Stop,
                context: None,
            })
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "mock-model"
        }
    }

    #[tokio::test]
    async fn test_adapter_generate() {
        let backend = MockBackend { response: "Hello, world!".to_string() };
        let adapter = LanguageModelAdapter::new(backend, "be helpful");

        let history = Conversation::default();
        let response = adapter.generate("Hi", &history).await.unwrap();
        assert_eq!(response, "Hello, world!");
    }

    #[test]
    fn test_adapter_model_name() {
        let backend = MockBackend { response: "test".to_string() };
        let adapter = LanguageModelAdapter::new(backend, "system");
        assert_eq!(adapter.model_name(), "mock-model");
    }
}
