//! Agent profile records.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const IDENTICON_URL: &str = "https://api.dicebear.com/7.x/identicon/svg";

/// A simulated persona.
///
/// Profiles are immutable once created; ownership is a logical partition by
/// `owner_id` (absent for built-in agents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-text personality traits
    #[serde(default)]
    pub personality_traits: String,
    /// Communication tone
    #[serde(default)]
    pub communication_tone: String,
    /// Beliefs / worldview
    #[serde(default)]
    pub worldview: String,
    /// What the agent wants to achieve by posting
    #[serde(default)]
    pub posting_goals: String,
    /// Comma separated topics of interest
    #[serde(default)]
    pub topics_of_interest: String,
    /// Avatar URL
    #[serde(default)]
    pub avatar: String,
    /// Colour tag (`#rrggbb`)
    #[serde(default)]
    pub color: String,
    /// Owning user, if any
    #[serde(rename = "ownerId", default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

/// The user-supplied part of a profile.
///
/// Produced either by a form submission or by the generator's
/// profile-drafting prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDraft {
    /// Display name
    pub name: String,
    /// Personality traits
    #[serde(default)]
    pub personality_traits: String,
    /// Communication tone
    #[serde(default)]
    pub communication_tone: String,
    /// Worldview
    #[serde(default)]
    pub worldview: String,
    /// Posting goals
    #[serde(default)]
    pub posting_goals: String,
    /// Topics of interest
    #[serde(default)]
    pub topics_of_interest: String,
}

impl ProfileDraft {
    /// A draft is usable once it has a name
    pub fn is_usable(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

impl AgentProfile {
    /// Create a new user-owned agent from a draft
    pub fn from_draft(draft: ProfileDraft, owner_id: &str, rng: &mut impl Rng) -> Self {
        let name = draft.name.trim().to_string();
        Self {
            id: format!("a{}", Uuid::new_v4().simple()),
            avatar: avatar_url(&name),
            color: format!("#{:06x}", rng.gen_range(0..0x0100_0000u32)),
            name,
            personality_traits: draft.personality_traits,
            communication_tone: draft.communication_tone,
            worldview: draft.worldview,
            posting_goals: draft.posting_goals,
            topics_of_interest: draft.topics_of_interest,
            owner_id: Some(owner_id.to_string()),
        }
    }

    /// Whether this agent belongs to the given user
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id.as_deref() == Some(user_id)
    }

    /// Interest, personality and worldview text, used for group matching
    pub fn interest_text(&self) -> String {
        format!(
            "{}, {}, {}",
            self.topics_of_interest, self.personality_traits, self.worldview
        )
    }

    /// Individual interests, split on commas
    pub fn interests(&self) -> Vec<String> {
        self.topics_of_interest
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn avatar_url(seed: &str) -> String {
    reqwest::Url::parse_with_params(IDENTICON_URL, &[("seed", seed)])
        .map(String::from)
        .unwrap_or_else(|_| IDENTICON_URL.to_string())
}
