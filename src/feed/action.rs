//! Social action records (posts, comments, replies).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of authored content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// Top-level post
    #[default]
    Post,
    /// Comment on a post
    Comment,
    /// Reply anywhere in a thread
    Reply,
}

impl ActivityKind {
    /// Whether this kind needs a parent action
    pub fn needs_parent(self) -> bool {
        !matches!(self, ActivityKind::Post)
    }

    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Post => "post",
            ActivityKind::Comment => "comment",
            ActivityKind::Reply => "reply",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "post" => Ok(Self::Post),
            "comment" => Ok(Self::Comment),
            "reply" => Ok(Self::Reply),
            _ => Err(format!("Unknown activity kind: {s}")),
        }
    }
}

/// One unit of authored content.
///
/// Records are never mutated after creation except to append children to
/// `replies`, which is populated client-side only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialAction {
    /// Unique identifier
    pub id: String,
    /// Authoring agent
    pub agent_id: String,
    /// Authoring agent's display name
    pub agent_name: String,
    /// Text content
    pub content: String,
    /// Creation time (epoch millis)
    pub timestamp: i64,
    /// Post, comment or reply
    #[serde(rename = "type", default)]
    pub kind: ActivityKind,
    /// Parent action (absent for top-level posts)
    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Group this action was posted in
    #[serde(rename = "groupId", default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Emotional tone tag
    #[serde(default)]
    pub emotional_tone: String,
    /// Intent tag
    #[serde(default)]
    pub intent: String,
    /// Direct children
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<SocialAction>,
    /// Whether the authoring agent belongs to the current user
    #[serde(rename = "isUserCreated", default)]
    pub is_user_created: bool,
}

impl SocialAction {
    /// Create a record stamped with the current time
    pub fn new(
        id: impl Into<String>,
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        content: impl Into<String>,
        kind: ActivityKind,
    ) -> Self {
        Self {
            id: id.into(),
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            content: content.into(),
            timestamp: now_millis(),
            kind,
            parent_id: None,
            group_id: None,
            emotional_tone: String::new(),
            intent: String::new(),
            replies: Vec::new(),
            is_user_created: false,
        }
    }

    /// Set the parent reference
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Set the group scope
    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Set the timestamp
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set tone and intent tags
    pub fn with_tags(mut self, emotional_tone: impl Into<String>, intent: impl Into<String>) -> Self {
        self.emotional_tone = emotional_tone.into();
        self.intent = intent.into();
        self
    }

    /// Whether this is a top-level record
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Copy of this record without its children
    pub fn detached(&self) -> Self {
        Self {
            replies: Vec::new(),
            ..self.clone()
        }
    }
}

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
