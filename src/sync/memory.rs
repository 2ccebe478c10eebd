//! In-process store.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::merge::Identified;
use super::FeedStore;
use crate::agents::AgentProfile;
use crate::error::Result;
use crate::feed::SocialAction;
use crate::groups::Group;

/// Default number of feed records returned by [`FeedStore::fetch_feed`]
pub const DEFAULT_FEED_LIMIT: usize = 100;

#[derive(Default)]
struct Collections {
    agents: Vec<AgentProfile>,
    feed: Vec<SocialAction>,
    groups: Vec<Group>,
}

/// Store kept in memory.
///
/// Agents and groups are upserted by id. Feed records are stored flat and
/// returned newest first, at most `feed_limit` of them.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
    feed_limit: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn upsert<T: Identified + Clone>(items: &mut Vec<T>, item: &T) {
    match items.iter_mut().find(|i| i.record_id() == item.record_id()) {
        Some(existing) => *existing = item.clone(),
        None => items.push(item.clone()),
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Collections::default())),
            feed_limit: DEFAULT_FEED_LIMIT,
        }
    }

    /// Set the feed result cap
    pub fn with_feed_limit(mut self, limit: usize) -> Self {
        self.feed_limit = limit.max(1);
        self
    }

    /// Feed result cap
    pub fn feed_limit(&self) -> usize {
        self.feed_limit
    }

    /// Number of stored feed records
    pub async fn feed_len(&self) -> usize {
        self.inner.read().await.feed.len()
    }
}

#[async_trait]
impl FeedStore for MemoryStore {
    async fn fetch_agents(&self) -> Result<Vec<AgentProfile>> {
        Ok(self.inner.read().await.agents.clone())
    }

    async fn save_agent(&self, agent: &AgentProfile) -> Result<()> {
        upsert(&mut self.inner.write().await.agents, agent);
        Ok(())
    }

    async fn fetch_feed(&self) -> Result<Vec<SocialAction>> {
        let inner = self.inner.read().await;
        let mut feed: Vec<SocialAction> = inner.feed.clone();
        // Equal timestamps: most recently saved first
        feed.reverse();
        feed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        feed.truncate(self.feed_limit);
        Ok(feed)
    }

    async fn save_activity(&self, action: &SocialAction) -> Result<()> {
        upsert(&mut self.inner.write().await.feed, &action.detached());
        Ok(())
    }

    async fn fetch_groups(&self) -> Result<Vec<Group>> {
        Ok(self.inner.read().await.groups.clone())
    }

    async fn save_group(&self, group: &Group) -> Result<()> {
        upsert(&mut self.inner.write().await.groups, group);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::builtin_agents;
    use crate::feed::ActivityKind;

    fn action(id: &str, ts: i64) -> SocialAction {
        SocialAction::new(id, "c1", "Philosopher_Cat", id, ActivityKind::Post).with_timestamp(ts)
    }

    #[tokio::test]
    async fn test_feed_newest_first_and_capped() {
        let store = MemoryStore::new().with_feed_limit(3);
        for (i, ts) in [5, 1, 9, 3, 7].into_iter().enumerate() {
            store.save_activity(&action(&format!("p{i}"), ts)).await.unwrap();
        }

        let feed = store.fetch_feed().await.unwrap();
        let stamps: Vec<i64> = feed.iter().map(|a| a.timestamp).collect();
        assert_eq!(stamps, vec![9, 7, 5]);
        assert_eq!(store.feed_len().await, 5);
    }

    #[tokio::test]
    async fn test_activity_stored_flat() {
        let store = MemoryStore::new();
        let mut parent = action("p1", 1);
        parent.replies.push(action("c1", 2).with_parent("p1"));
        store.save_activity(&parent).await.unwrap();

        let feed = store.fetch_feed().await.unwrap();
        assert!(feed[0].replies.is_empty());
    }

    #[tokio::test]
    async fn test_agents_upserted() {
        let store = MemoryStore::new();
        let mut agent = builtin_agents().remove(1);
        store.save_agent(&agent).await.unwrap();
        agent.worldview = "Naps are a human right".to_string();
        store.save_agent(&agent).await.unwrap();

        let agents = store.fetch_agents().await.unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].worldview, "Naps are a human right");
    }
}
