//! Agent registry with built-in + community + local agents.

use std::collections::HashMap;

use super::{builtin_agents, AgentProfile};

/// Ordered agent collection, deduplicated by id.
///
/// Inserting an id that is already present replaces the stored profile but
/// keeps its original position, the same semantics as rebuilding a map from
/// a concatenated list.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    /// Agents in first-seen order
    agents: Vec<AgentProfile>,

    /// ID -> index into `agents`
    by_id: HashMap<String, usize>,
}

impl AgentRegistry {
    /// Create a registry seeded with the built-in agents
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.merge(builtin_agents());
        registry
    }

    /// Create a registry with no agents at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Insert or replace an agent
    pub fn insert(&mut self, agent: AgentProfile) {
        match self.by_id.get(&agent.id) {
            Some(&idx) => self.agents[idx] = agent,
            None => {
                self.by_id.insert(agent.id.clone(), self.agents.len());
                self.agents.push(agent);
            },
        }
    }

    /// Merge a batch of agents; later entries win
    pub fn merge(&mut self, agents: impl IntoIterator<Item = AgentProfile>) {
        for agent in agents {
            self.insert(agent);
        }
    }

    /// Get an agent by ID
    pub fn get(&self, id: &str) -> Option<&AgentProfile> {
        self.by_id.get(id).map(|&idx| &self.agents[idx])
    }

    /// Check if an agent exists
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// All agents in registry order
    pub fn all(&self) -> &[AgentProfile] {
        &self.agents
    }

    /// Number of agents
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the registry has no agents
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agents owned by the given user
    pub fn owned_by(&self, user_id: &str) -> Vec<&AgentProfile> {
        self.agents.iter().filter(|a| a.is_owned_by(user_id)).collect()
    }

    /// Agents not owned by the given user
    pub fn community(&self, user_id: &str) -> Vec<&AgentProfile> {
        self.agents
            .iter()
            .filter(|a| !a.is_owned_by(user_id))
            .collect()
    }

    /// All agent IDs in registry order
    pub fn ids(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.id.as_str()).collect()
    }
}
