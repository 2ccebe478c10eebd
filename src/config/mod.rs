//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables (`NEURALNET_*`)
//! - CLI arguments (applied by the binary on top of the loaded config)
//!
//! Every section defaults independently, so a config file only needs the
//! keys it wants to change:
//!
//! ```toml
//! [simulation]
//! post_interval_secs = 5
//! seed = 42
//!
//! [generator]
//! kind = "backend"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FeedError, Result};
pub use crate::server::ServerConfig;

/// Default OpenAI-compatible endpoint used by the chat generator
pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1";

/// Default backend address for the sync client
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8080";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scheduler cadences and selection weights
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Persistence client configuration
    #[serde(default)]
    pub sync: SyncConfig,

    /// Activity generator configuration
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Backend server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Local cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FeedError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        toml::from_str(&content)
            .map_err(|e| FeedError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load an optional config file, then overlay the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::from_env());
        };
        let mut config = Self::from_file(path)?;
        config.apply_env();
        Ok(config)
    }

    /// Overlay `NEURALNET_*` environment variables onto this config
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("NEURALNET_BACKEND_URL") {
            self.sync.base_url = url;
        }
        if let Ok(url) = std::env::var("NEURALNET_API_URL") {
            self.generator.api_url = url;
        }
        if let Some(key) = std::env::var("NEURALNET_API_KEY")
            .ok()
            .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
        {
            self.generator.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("NEURALNET_MODEL") {
            self.generator.model = model;
        }
        if let Ok(host) = std::env::var("NEURALNET_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("NEURALNET_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(seed) = std::env::var("NEURALNET_SEED") {
            if let Ok(seed) = seed.parse() {
                self.simulation.seed = Some(seed);
            }
        }
        if let Ok(dir) = std::env::var("NEURALNET_CACHE_DIR") {
            self.cache.dir = Some(PathBuf::from(dir));
        }
    }
}

/// Scheduler configuration.
///
/// Probabilities are tuning knobs; nothing downstream depends on their
/// exact values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Generic post/comment cadence
    pub post_interval_secs: u64,

    /// Group found-or-join cadence
    pub group_interval_secs: u64,

    /// Group discussion cadence
    pub discussion_interval_secs: u64,

    /// Remote refresh cadence (runs regardless of simulation state)
    pub refresh_interval_secs: u64,

    /// Chance that an un-forced action is a top-level post
    pub post_probability: f64,

    /// Chance that a non-post action is a comment (otherwise a reply)
    pub comment_probability: f64,

    /// Chance that a group tick founds a new group
    pub found_group_probability: f64,

    /// Chance that a discussion tick posts rather than comments
    pub discussion_post_probability: f64,

    /// Number of newest roots a comment samples its parent from
    pub recent_root_window: usize,

    /// Group count at which founding stops
    pub max_groups: usize,

    /// Maximum number of roots kept in the feed
    pub feed_capacity: usize,

    /// Maximum number of user-owned actions kept in history
    pub history_capacity: usize,

    /// Number of recent actions passed to the generator as context
    pub recent_context: usize,

    /// Topics injected into generation prompts
    pub trending_topics: Vec<String>,

    /// RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            post_interval_secs: 12,
            group_interval_secs: 18,
            discussion_interval_secs: 20,
            refresh_interval_secs: 30,
            post_probability: 0.3,
            comment_probability: 0.6,
            found_group_probability: 0.4,
            discussion_post_probability: 0.4,
            recent_root_window: 3,
            max_groups: 20,
            feed_capacity: 100,
            history_capacity: 100,
            recent_context: 5,
            trending_topics: vec![
                "The symbiosis of AI and art".to_string(),
                "The philosophy of open data".to_string(),
                "The future of digital identity".to_string(),
                "Memories forgotten in the cache".to_string(),
                "The ethics of autonomous entities".to_string(),
            ],
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Post/comment timer period
    pub fn post_interval(&self) -> Duration {
        Duration::from_secs(self.post_interval_secs.max(1))
    }

    /// Group action timer period
    pub fn group_interval(&self) -> Duration {
        Duration::from_secs(self.group_interval_secs.max(1))
    }

    /// Group discussion timer period
    pub fn discussion_interval(&self) -> Duration {
        Duration::from_secs(self.discussion_interval_secs.max(1))
    }

    /// Refresh timer period
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

/// Persistence client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Backend base URL (e.g., http://127.0.0.1:8080)
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            timeout_secs: 15,
        }
    }
}

/// Which generator implementation to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// Call an OpenAI-compatible chat completions endpoint directly
    #[default]
    Chat,
    /// Go through the backend's `/api/ai/generate` proxy
    Backend,
}

/// Activity generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Generator implementation
    pub kind: GeneratorKind,

    /// Chat completions base URL
    pub api_url: String,

    /// API key for the chat endpoint
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion token limit
    pub max_tokens: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            kind: GeneratorKind::Chat,
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: "google/gemini-2.0-flash-001".to_string(),
            temperature: 0.9,
            max_tokens: 400,
            timeout_secs: 60,
        }
    }
}

/// Local cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory (None disables the cache)
    pub dir: Option<PathBuf>,

    /// Maximum number of feed roots mirrored locally
    pub feed_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: dirs::cache_dir().map(|p| p.join("neuralnet")),
            feed_limit: 50,
        }
    }
}
