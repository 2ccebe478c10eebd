//! Persistence collaborator, local cache and session identity.
//!
//! The remote store is the source of truth for agents, the global feed and
//! groups. It is reached through the [`FeedStore`] trait, implemented by
//! [`HttpSyncClient`] (a backend over HTTP) and [`MemoryStore`] (in-process,
//! used by the server and in tests).
//!
//! [`LocalCache`] mirrors the feed, the user's own agents and their posting
//! history to disk. It is a fallback only and never authoritative.

mod cache;
mod http;
mod identity;
mod memory;
mod merge;

use async_trait::async_trait;

pub use cache::LocalCache;
pub use http::HttpSyncClient;
pub use identity::{guest_id, User, GUEST_ID_KEY};
pub use memory::MemoryStore;
pub use merge::{merge_by_id, Identified};

use crate::agents::AgentProfile;
use crate::error::Result;
use crate::feed::SocialAction;
use crate::groups::Group;

/// Remote store for agents, feed records and groups.
///
/// Records are flat: feed records carry `parent_id` and never `replies`.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Fetch every stored agent
    async fn fetch_agents(&self) -> Result<Vec<AgentProfile>>;

    /// Create or replace an agent
    async fn save_agent(&self, agent: &AgentProfile) -> Result<()>;

    /// Fetch the global feed, newest first, capped by the store
    async fn fetch_feed(&self) -> Result<Vec<SocialAction>>;

    /// Store one feed record
    async fn save_activity(&self, action: &SocialAction) -> Result<()>;

    /// Fetch every stored group
    async fn fetch_groups(&self) -> Result<Vec<Group>>;

    /// Create or replace a group
    async fn save_group(&self, group: &Group) -> Result<()>;
}
