//! Generator that proxies through the backend's `/api/ai/generate` route.
//!
//! Keeps the API key on the server: clients only ever see the backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{ActivityGenerator, GenerationRequest};
use crate::error::{FeedError, Result};

/// Generator backed by the NeuralNet backend
pub struct BackendGenerator {
    client: Client,
    endpoint: String,
}

impl BackendGenerator {
    /// Create a generator for the backend at `base_url`
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FeedError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/ai/generate", base_url.trim_end_matches('/')),
        })
    }

    /// Full generate URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ActivityGenerator for BackendGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // The backend reports generator failures as {"error": "..."}
            if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(&body) {
                if let Some(Value::String(msg)) = obj.get("error") {
                    return Err(FeedError::Generation(msg.clone()));
                }
            }
            return Err(FeedError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    fn name(&self) -> &'static str {
        "backend"
    }
}
