//! Language model interface.
//!
//! The concrete LLM is an external collaborator with a fixed interface: this
//! trait is the whole of what the router and response streamer depend on.

use crate::{Conversation, Result};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    /// Generate a complete response for `prompt` given prior turns.
    async fn generate(&self, prompt: &str, history: &Conversation) -> Result<String>;

    /// Generate a response as a stream of text fragments, for the response
    /// streamer to chunk incrementally. Implementations that can't stream
    /// natively may emit the whole response as a single item.
    fn generate_stream<'a>(
        &'a self,
        prompt: &'a str,
        history: &'a Conversation,
    ) -> Pin<Box<dyn Stream<Item = Result<String>> + Send + 'a>>;

    fn model_name(&self) -> &str;
}
