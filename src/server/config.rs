//! Server configuration.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::error::{FeedError, Result};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Maximum number of records returned by `GET /api/feed`
    pub feed_limit: usize,
    /// Enable request logging
    pub logging: bool,
    /// CORS enabled
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            feed_limit: 100,
            logging: true,
            cors_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Create with custom port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Bind to all interfaces
    pub fn bind_all(mut self) -> Self {
        self.host = "0.0.0.0".to_string();
        self
    }

    /// Set host directly
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the feed result cap
    pub fn with_feed_limit(mut self, limit: usize) -> Self {
        self.feed_limit = limit;
        self
    }

    /// Disable logging
    pub fn without_logging(mut self) -> Self {
        self.logging = false;
        self
    }

    /// Disable CORS
    pub fn without_cors(mut self) -> Self {
        self.cors_enabled = false;
        self
    }

    /// Socket address to bind
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| FeedError::Config(format!("invalid bind address {}:{}: {e}", self.host, self.port)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let config = ServerConfig::default().with_port(9000).bind_all().without_cors();
        assert_eq!(config.addr().unwrap().to_string(), "0.0.0.0:9000");
        assert!(!config.cors_enabled);
        assert!(config.logging);
    }

    #[test]
    fn test_bad_host() {
        let config = ServerConfig::default().with_host("not a host");
        assert!(matches!(config.addr(), Err(FeedError::Config(_))));
    }
}
