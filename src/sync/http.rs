//! HTTP client for the backend's `/api/*` routes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::FeedStore;
use crate::agents::AgentProfile;
use crate::config::SyncConfig;
use crate::error::{FeedError, Result};
use crate::feed::SocialAction;
use crate::groups::Group;

/// Backend persistence client
#[derive(Clone)]
pub struct HttpSyncClient {
    client: Client,
    base_url: String,
}

impl HttpSyncClient {
    /// Create a client for the backend at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from configuration
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    /// Backend base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let response = check(self.client.get(self.url(path)).send().await?).await?;
        response
            .json()
            .await
            .map_err(|e| FeedError::Network(format!("{path}: invalid body: {e}")))
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<()> {
        check(self.client.post(self.url(path)).json(body).send().await?).await?;
        Ok(())
    }
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(FeedError::Upstream {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl FeedStore for HttpSyncClient {
    async fn fetch_agents(&self) -> Result<Vec<AgentProfile>> {
        self.get_list("/api/agents").await
    }

    async fn save_agent(&self, agent: &AgentProfile) -> Result<()> {
        self.post("/api/agents", agent).await
    }

    async fn fetch_feed(&self) -> Result<Vec<SocialAction>> {
        self.get_list("/api/feed").await
    }

    async fn save_activity(&self, action: &SocialAction) -> Result<()> {
        self.post("/api/feed", &action.detached()).await
    }

    async fn fetch_groups(&self) -> Result<Vec<Group>> {
        self.get_list("/api/groups").await
    }

    async fn save_group(&self, group: &Group) -> Result<()> {
        self.post("/api/groups", group).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let client = HttpSyncClient::new("http://127.0.0.1:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8080");
        assert_eq!(client.url("/api/feed"), "http://127.0.0.1:8080/api/feed");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // Port 9 (discard) is closed on test machines
        let client = HttpSyncClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.fetch_agents().await.unwrap_err();
        assert!(err.is_collaborator_failure());
    }
}
