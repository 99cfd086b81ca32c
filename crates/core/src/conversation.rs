//! In-memory conversation turn history.
//!
//! One `Conversation` lives per `Session` and is discarded with it: there is
//! no persistent store beyond the lifetime of the connection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// Bounded turn history used to build LLM and router prompts.
#[derive(Debug, Clone)]
pub struct Conversation {
    turns: VecDeque<Turn>,
    capacity: usize,
}

impl Conversation {
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, turn: Turn) {
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_turn_past_capacity() {
        let mut conv = Conversation::new(2);
        conv.push(Turn::user("one"));
        conv.push(Turn::assistant("two"));
        conv.push(Turn::user("three"));

        let texts: Vec<_> = conv.turns().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["two", "three"]);
    }
}
