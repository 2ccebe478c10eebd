//! NeuralNet backend HTTP server.
//!
//! Persists agents, the global feed and groups, and proxies generation
//! requests so clients never hold the generator's API key:
//! - `GET /health`, `GET /status`
//! - `GET|POST /api/agents`, `/api/feed`, `/api/groups`
//! - `POST /api/ai/generate`
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use neuralnet::server::{create_router, AppState, ServerConfig};
//!
//! let config = ServerConfig::default().with_port(8080);
//! let app = create_router(Arc::new(AppState::new(config.clone())));
//! let listener = tokio::net::TcpListener::bind(config.addr()?).await?;
//! axum::serve(listener, app).await?;
//! ```

mod config;
mod handlers;
mod state;

pub use config::ServerConfig;
pub use handlers::{create_router, health_check};
pub use state::AppState;
