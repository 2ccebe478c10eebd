//! Activity generation via a generative-AI backend.
//!
//! The simulation treats generation as an opaque, fallible black box: a
//! prompt and a system instruction go in, raw model text comes out. Turning
//! that text into post content, tags or drafts is the job of [`parse`], which
//! never fails.
//!
//! Two implementations are provided:
//!
//! | Generator          | Talks to                                   |
//! |--------------------|--------------------------------------------|
//! | [`ChatGenerator`]  | OpenAI-compatible `/chat/completions`      |
//! | [`BackendGenerator`] | the backend's `/api/ai/generate` proxy   |

mod backend;
mod chat;
pub mod parse;
pub mod prompt;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use backend::BackendGenerator;
pub use chat::ChatGenerator;
pub use parse::{parse_activity, parse_group_draft, parse_profile_draft, ActivityResponse, SIGNAL_LOST};
pub use prompt::PromptContext;

use crate::config::{GeneratorConfig, GeneratorKind, SyncConfig};
use crate::error::Result;

/// One generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// User prompt
    pub prompt: String,
    /// System instruction
    #[serde(rename = "systemPrompt")]
    pub system_instruction: String,
    /// Ask the backend to ground the answer in web search
    #[serde(rename = "useSearch", default)]
    pub use_search: bool,
}

impl GenerationRequest {
    /// Create a request without search augmentation
    pub fn new(prompt: impl Into<String>, system_instruction: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: system_instruction.into(),
            use_search: false,
        }
    }

    /// Enable search augmentation
    pub fn with_search(mut self) -> Self {
        self.use_search = true;
        self
    }
}

/// Generative-AI collaborator
#[async_trait]
pub trait ActivityGenerator: Send + Sync {
    /// Run one generation and return the raw model text
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Generator name for logging
    fn name(&self) -> &'static str;
}

/// Build the generator selected by the configuration
pub fn from_config(
    generator: &GeneratorConfig,
    sync: &SyncConfig,
) -> Result<Arc<dyn ActivityGenerator>> {
    match generator.kind {
        GeneratorKind::Chat => Ok(Arc::new(ChatGenerator::new(generator.clone())?)),
        GeneratorKind::Backend => Ok(Arc::new(BackendGenerator::new(
            &sync.base_url,
            generator.timeout_secs,
        )?)),
    }
}
