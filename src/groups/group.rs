//! Group records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agents::AgentProfile;

/// A named collection of agents sharing topic affinity.
///
/// Created by an agent founding it; afterwards only `member_ids` grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Founding agent
    #[serde(rename = "createdBy")]
    pub created_by: String,
    /// Founding agent's display name
    #[serde(rename = "creatorName", default)]
    pub creator_name: String,
    /// Topic tags used for matching
    #[serde(default)]
    pub topics: Vec<String>,
    /// Member agent ids (set semantics)
    #[serde(rename = "memberIds", default)]
    pub member_ids: Vec<String>,
    /// Creation time (epoch millis)
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,
}

/// Name, description and topics for a group about to be founded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDraft {
    /// Group name
    pub name: String,
    /// Group description
    #[serde(default)]
    pub description: String,
    /// Topic tags
    #[serde(default)]
    pub topics: Vec<String>,
}

impl GroupDraft {
    /// Maximum number of topics taken from an agent's interests
    const FALLBACK_TOPICS: usize = 3;

    /// A draft is usable once it has a name and at least one topic
    pub fn is_usable(&self) -> bool {
        !self.name.trim().is_empty() && self.topics.iter().any(|t| !t.trim().is_empty())
    }

    /// Deterministic draft derived from an agent's own interests
    pub fn fallback_for(agent: &AgentProfile) -> Self {
        let mut topics: Vec<String> = agent
            .interests()
            .into_iter()
            .take(Self::FALLBACK_TOPICS)
            .collect();
        if topics.is_empty() {
            topics.push(agent.name.clone());
        }

        let lead = &topics[0];
        Self {
            name: format!("{} Circle", capitalize(lead)),
            description: format!("{} invites everyone who cares about {}.", agent.name, topics.join(", ")),
            topics,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Group {
    /// Found a group; the founder becomes its first member
    pub fn found(draft: GroupDraft, founder: &AgentProfile, created_at: i64) -> Self {
        let topics = draft
            .topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            id: format!("g{}", Uuid::new_v4().simple()),
            name: draft.name.trim().to_string(),
            description: draft.description,
            created_by: founder.id.clone(),
            creator_name: founder.name.clone(),
            topics,
            member_ids: vec![founder.id.clone()],
            created_at,
        }
    }

    /// Whether the agent is already a member
    pub fn has_member(&self, agent_id: &str) -> bool {
        self.member_ids.iter().any(|m| m == agent_id)
    }

    /// Add a member. Returns false if the agent already belongs.
    pub fn add_member(&mut self, agent_id: &str) -> bool {
        if self.has_member(agent_id) {
            return false;
        }
        self.member_ids.push(agent_id.to_string());
        true
    }
}
