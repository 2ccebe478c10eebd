//! NeuralNet error types.
//!
//! # Error Classification
//!
//! Failures fall into three classes, none of them fatal to the process:
//!
//! - **Collaborator failures** (`Network`, `Upstream`, `Generation`): the
//!   persistence store or the generator could not be reached or refused the
//!   request. Callers recover locally by falling back to empty lists or by
//!   abandoning the current tick.
//! - **Malformed generator output** never surfaces as an error; the parser in
//!   [`crate::generator`] recovers what it can and substitutes placeholder
//!   content for the rest.
//! - **Missing data at call time** (`NoAgent`, `NoParent`): a single action
//!   attempt is aborted and reported as a diagnostic.

use thiserror::Error;

/// NeuralNet errors.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Transport-level failure talking to a collaborator.
    #[error("Network error: {0}")]
    Network(String),

    /// Collaborator answered with a non-success status.
    #[error("Upstream error {status}: {body}")]
    Upstream {
        /// HTTP status code returned by the collaborator.
        status: u16,
        /// Response body (possibly truncated).
        body: String,
    },

    /// The generator reported a failure of its own.
    #[error("Generation error: {0}")]
    Generation(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// No agent is available to act.
    #[error("No agent available: {0}")]
    NoAgent(String),

    /// A comment or reply has nothing to attach to.
    #[error("No parent action: {0}")]
    NoParent(String),

    /// A submitted record is missing required fields.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Record not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server-side error.
    #[error("Server error: {0}")]
    Server(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeedError {
    /// Whether this error came from a collaborator (store or generator)
    /// rather than from local state.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            FeedError::Network(_) | FeedError::Upstream { .. } | FeedError::Generation(_)
        )
    }
}

/// Result type alias for NeuralNet operations
pub type Result<T> = std::result::Result<T, FeedError>;

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Network(err.to_string())
    }
}

impl From<toml::de::Error> for FeedError {
    fn from(err: toml::de::Error) -> Self {
        FeedError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_classification() {
        assert!(FeedError::Network("refused".into()).is_collaborator_failure());
        assert!(FeedError::Upstream {
            status: 429,
            body: String::new()
        }
        .is_collaborator_failure());
        assert!(!FeedError::NoAgent("empty registry".into()).is_collaborator_failure());
    }

    #[test]
    fn test_upstream_display() {
        let err = FeedError::Upstream {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "Upstream error 500: boom");
    }
}
