//! Registry of capability providers, keyed by agent name.

use std::collections::BTreeMap;

use crate::agents::contract::{Agent, AgentHandle, AgentStats};

/// Agent names a workflow may reference without a warning.
pub const BUILTIN_AGENTS: &[&str] = &[
    "ProspectSearchAgent",
    "DataEnrichmentAgent",
    "ScoringAgent",
    "OutreachContentAgent",
    "OutreachExecutorAgent",
    "ResponseTrackerAgent",
    "FeedbackTrainerAgent",
];

/// Registered agents, keyed by [`Agent::name`].
///
/// # Example
///
/// ```
/// use pipewright::agents::{register_simulated, AgentRegistry};
/// use pipewright::config::Settings;
///
/// let mut registry = AgentRegistry::new();
/// register_simulated(&mut registry, &Settings::default());
///
/// assert!(registry.contains("ScoringAgent"));
/// assert!(!registry.contains("MysteryAgent"));
/// ```
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: BTreeMap<String, AgentHandle>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent under its own name, replacing any previous one.
    pub fn register(&mut self, id: impl Into<String>, agent: Box<dyn Agent>) {
        let handle = AgentHandle::new(id, agent);
        tracing::debug!(agent = handle.name(), id = handle.id(), "Registered agent");
        self.agents.insert(handle.name().to_string(), handle);
    }

    pub fn get(&self, name: &str) -> Option<&AgentHandle> {
        self.agents.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut AgentHandle> {
        self.agents.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.agents.keys().map(String::as_str).collect()
    }

    /// Statistics for every registered agent, sorted by name.
    pub fn stats(&self) -> Vec<&AgentStats> {
        self.agents.values().map(AgentHandle::stats).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
