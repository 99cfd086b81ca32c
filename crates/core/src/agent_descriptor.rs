//! The fixed, dependency-free shape the Router uses to describe a
//! registered agent in its final-routing prompt. The agent implementation
//! itself (`vox_agent::traits::Agent`) is not visible here; this keeps the
//! router from depending on the agent crate.

#[derive(Debug, Clone)]
pub struct AgentDescriptor {
    pub name: String,
    pub description: String,
}

impl AgentDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into() }
    }
}
