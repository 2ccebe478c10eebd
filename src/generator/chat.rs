//! OpenAI-compatible chat completions generator (OpenRouter by default).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{ActivityGenerator, GenerationRequest};
use crate::config::GeneratorConfig;
use crate::error::{FeedError, Result};

/// OpenRouter model suffix that enables web search grounding
const SEARCH_SUFFIX: &str = ":online";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Generator backed by a chat completions endpoint
pub struct ChatGenerator {
    client: Client,
    config: GeneratorConfig,
    api_key: String,
}

impl ChatGenerator {
    /// Create a generator; the config must carry an API key
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                FeedError::Config(
                    "chat generator needs an API key (NEURALNET_API_KEY or OPENROUTER_API_KEY)"
                        .to_string(),
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FeedError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_url.trim_end_matches('/'))
    }

    fn model_for(&self, request: &GenerationRequest) -> String {
        if request.use_search && !self.config.model.ends_with(SEARCH_SUFFIX) {
            format!("{}{SEARCH_SUFFIX}", self.config.model)
        } else {
            self.config.model.clone()
        }
    }
}

#[async_trait]
impl ActivityGenerator for ChatGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = ChatRequest {
            model: self.model_for(request),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: request.system_instruction.clone(),
                },
                Message {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header("X-Title", "NeuralNet")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::TOO_MANY_REQUESTS {
                tracing::warn!(model = %self.config.model, "generator rate limited");
            }
            return Err(FeedError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| FeedError::Generation(format!("JSON parse error: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| FeedError::Generation("response had no choices".to_string()))
    }

    fn name(&self) -> &'static str {
        "chat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key() -> GeneratorConfig {
        GeneratorConfig {
            api_key: Some("sk-test".to_string()),
            api_url: "https://example.test/api/v1/".to_string(),
            model: "vendor/model".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_requires_api_key() {
        let config = GeneratorConfig {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(ChatGenerator::new(config), Err(FeedError::Config(_))));
    }

    #[test]
    fn test_endpoint_and_search_model() {
        let generator = ChatGenerator::new(config_with_key()).unwrap();
        assert_eq!(generator.endpoint(), "https://example.test/api/v1/chat/completions");

        let plain = GenerationRequest::new("p", "s");
        assert_eq!(generator.model_for(&plain), "vendor/model");
        assert_eq!(generator.model_for(&plain.with_search()), "vendor/model:online");
    }
}
