//! Stores the fixed set of registered agents: a descriptor the router's
//! final-routing prompt is built from, plus the handle used to dispatch
//! once a route is decided.

use std::sync::Arc;

use vox_core::AgentDescriptor;

use crate::traits::Agent;

struct Entry {
    descriptor: AgentDescriptor,
    agent: Arc<dyn Agent>,
}

#[derive(Default)]
pub struct AgentRegistry {
    entries: Vec<Entry>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: AgentDescriptor, agent: Arc<dyn Agent>) {
        self.entries.push(Entry { descriptor, agent });
    }

    pub fn descriptors(&self) -> Vec<AgentDescriptor> {
        self.entries.iter().map(|e| e.descriptor.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.entries.iter().find(|e| e.descriptor.name == name).map(|e| e.agent.clone())
    }
}
