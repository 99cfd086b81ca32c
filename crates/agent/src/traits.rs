//! Agent interface. A concrete agent is an external collaborator with a
//! fixed interface: given a routed turn's text and the session's
//! conversation history, produce a response. The registry and router only
//! ever see this trait plus the agent's descriptor.

use async_trait::async_trait;
use vox_core::{Conversation, Result};

#[async_trait]
pub trait Agent: Send + Sync {
    async fn handle(&self, input: &str, history: &Conversation) -> Result<String>;

    fn name(&self) -> &str;
}
