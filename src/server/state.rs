//! Server state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::config::ServerConfig;
use crate::generator::ActivityGenerator;
use crate::sync::{FeedStore, MemoryStore};

/// Application state shared across handlers
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Record store
    pub store: Arc<dyn FeedStore>,
    /// Generator behind `/api/ai/generate` (optional)
    pub generator: Option<Arc<dyn ActivityGenerator>>,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create state backed by an in-memory store capped at `feed_limit`
    pub fn new(config: ServerConfig) -> Self {
        let store = MemoryStore::new().with_feed_limit(config.feed_limit);
        Self::with_store(config, Arc::new(store))
    }

    /// Create state over an existing store
    pub fn with_store(config: ServerConfig, store: Arc<dyn FeedStore>) -> Self {
        Self {
            config,
            store,
            generator: None,
            start_time: Instant::now(),
        }
    }

    /// Attach the generator used by `/api/ai/generate`
    pub fn with_generator(mut self, generator: Arc<dyn ActivityGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Get server uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}
