//! One illustrative agent, used in tests and as a worked example of the
//! `Agent` trait. Not a real production agent.

use async_trait::async_trait;
use vox_core::{Conversation, Result};

use crate::traits::Agent;

pub struct EchoAgent {
    name: String,
}

impl EchoAgent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Agent for EchoAgent {
    async fn handle(&self, input: &str, _history: &Conversation) -> Result<String> {
        Ok(format!("you said: {input}"))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_handle() {
        let agent = EchoAgent::new("echo");
        let history = Conversation::default();
        let response = agent.handle("hello", &history).await.unwrap();
        assert_eq!(response, "you said: hello");
        assert_eq!(agent.name(), "echo");
    }
}
