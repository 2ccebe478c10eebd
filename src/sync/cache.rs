//! Local key/value mirror of session state.
//!
//! Each key is one JSON file under the cache directory. Writes replace the
//! file; reads that fail for any reason yield nothing.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::agents::AgentProfile;
use crate::config::CacheConfig;
use crate::error::{FeedError, Result};
use crate::feed::SocialAction;

/// Default number of history entries kept per user
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Directory-backed key/value cache
#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
    feed_limit: usize,
    history_limit: usize,
}

fn feed_key(user_id: &str) -> String {
    format!("neuralnet_feed_{user_id}")
}

fn agents_key(user_id: &str) -> String {
    format!("neuralnet_agents_{user_id}")
}

fn history_key(user_id: &str) -> String {
    format!("neuralnet_history_{user_id}")
}

impl LocalCache {
    /// Create a cache rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>, feed_limit: usize) -> Self {
        Self {
            dir: dir.into(),
            feed_limit,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Set the history cap
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Create the configured cache, if a directory is configured
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        config
            .dir
            .as_ref()
            .map(|dir| Self::new(dir.clone(), config.feed_limit))
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        // Keys embed user ids; keep them to one path segment
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }

    /// Read a raw string value
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)
    }

    /// Read and decode a value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path(key);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding unreadable cache entry");
                None
            },
        }
    }

    /// Encode and write a value
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string(value)?;
        fs::write(self.path(key), content).map_err(FeedError::from)
    }

    /// Mirror the feed, keeping the first `feed_limit` roots
    pub fn save_feed(&self, user_id: &str, roots: &[SocialAction]) -> Result<()> {
        let kept = &roots[..roots.len().min(self.feed_limit)];
        self.set(&feed_key(user_id), kept)
    }

    /// Cached feed roots
    pub fn load_feed(&self, user_id: &str) -> Vec<SocialAction> {
        self.get(&feed_key(user_id)).unwrap_or_default()
    }

    /// Mirror the agents owned by `user_id`; other agents are not cached
    pub fn save_agents(&self, user_id: &str, agents: &[AgentProfile]) -> Result<()> {
        let owned: Vec<&AgentProfile> = agents.iter().filter(|a| a.is_owned_by(user_id)).collect();
        if owned.is_empty() {
            return Ok(());
        }
        self.set(&agents_key(user_id), &owned)
    }

    /// Cached user-owned agents
    pub fn load_agents(&self, user_id: &str) -> Vec<AgentProfile> {
        self.get(&agents_key(user_id)).unwrap_or_default()
    }

    /// Prepend an entry to the user's posting history
    pub fn push_history(&self, user_id: &str, action: &SocialAction) -> Result<()> {
        let mut history = self.load_history(user_id);
        history.insert(0, action.detached());
        history.truncate(self.history_limit);
        self.set(&history_key(user_id), &history)
    }

    /// The user's posting history, newest first
    pub fn load_history(&self, user_id: &str) -> Vec<SocialAction> {
        self.get(&history_key(user_id)).unwrap_or_default()
    }
}
