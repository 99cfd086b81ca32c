//! Prompt assembly: turns a system instruction plus conversation history
//! into the message list a backend sends upstream.

use std::fmt;
use serde::{Deserialize, Serialize};
use vox_core::Conversation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

impl From<&vox_core::Turn> for Message {
    fn from(turn: &vox_core::Turn) -> Self {
        match turn.role {
            vox_core::Role::User => Message::user(turn.text.clone()),
            vox_core::Role::Assistant => Message::assistant(turn.text.clone()),
        }
    }
}

/// Builds a message list from a system prompt, prior turns, and the current
/// user utterance, optionally truncated to a token budget.
pub struct PromptBuilder {
    messages: Vec<Message>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self { messages: Vec::new() }
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.messages.push(Message::system(prompt));
        self
    }

    pub fn with_history(mut self, history: &Conversation) -> Self {
        self.messages.extend(history.turns().iter().map(Message::from));
        self
    }

    pub fn user_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(Message::user(message));
        self
    }

    pub fn build(self) -> Vec<Message> {
        self.messages
    }

    /// Truncate conversation history to fit within `max_tokens`, keeping the
    /// system prompt and the most recent turns.
    pub fn build_with_limit(self, max_tokens: usize) -> Vec<Message> {
        let current_tokens = self.estimate_tokens();
        if current_tokens <= max_tokens {
            return self.messages;
        }

        let (system_msgs, conv_msgs): (Vec<_>, Vec<_>) =
            self.messages.into_iter().partition(|m| matches!(m.role, Role::System));

        let system_tokens: usize =
            system_msgs.iter().map(|m| Self::estimate_single_message_tokens(&m.content)).sum();
        let available_tokens = max_tokens.saturating_sub(system_tokens);

        let mut kept_msgs: Vec<Message> = Vec::new();
        let mut used_tokens = 0;

        for msg in conv_msgs.into_iter().rev() {
            let msg_tokens = Self::estimate_single_message_tokens(&msg.content);
            if used_tokens + msg_tokens <= available_tokens {
                kept_msgs.push(msg);
                used_tokens += msg_tokens;
            } else {
                break;
            }
        }
        kept_msgs.reverse();

        let mut result = system_msgs;
        result.extend(kept_msgs);

        tracing::debug!(
            before = current_tokens,
            after = system_tokens + used_tokens,
            messages = result.len(),
            "context truncated to fit token budget",
        );

        result
    }

    fn estimate_single_message_tokens(content: &str) -> usize {
        content.chars().count().max(1) / 4
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn estimate_tokens(&self) -> usize {
        self.messages.iter().map(|m| Self::estimate_single_message_tokens(&m.content)).sum()
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
    }

    #[test]
    fn test_prompt_builder() {
        let messages = PromptBuilder::new()
            .system_prompt("You are a helpful voice assistant.")
            .user_message("What's the weather?")
            .build();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn test_with_history() {
        let mut history = Conversation::new(20);
        history.push(vox_core::Turn::user("hi"));
        history.push(vox_core::Turn::assistant("hello there"));

        let messages = PromptBuilder::new()
            .system_prompt("system")
            .with_history(&history)
            .user_message("how are you")
            .build();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].content, "hi");
        assert_eq!(messages[2].content, "hello there");
    }

    #[test]
    fn test_build_with_limit_keeps_recent_turns() {
        let mut history = Conversation::new(20);
        for i in 0..50 {
            history.push(vox_core::Turn::user(format!("message number {i} with some padding text")));
        }

        let builder = PromptBuilder::new().system_prompt("system").with_history(&history);
        let full_len = builder.message_count();

        let limited = PromptBuilder::new()
            .system_prompt("system")
            .with_history(&history)
            .build_with_limit(50);

        assert!(limited.len() < full_len);
        assert_eq!(limited[0].role, Role::System);
    }
}
