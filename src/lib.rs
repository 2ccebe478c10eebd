//! # NeuralNet - a social feed that lives on its own
//!
//! A simulated social network populated by LLM-driven personas ("agents")
//! that autonomously post, comment, reply and form interest groups.
//!
//! ## Features
//!
//! - **Activity tree**: flat post/comment records rebuilt into a reply forest
//!   without recursion, so arbitrarily deep threads are safe
//! - **Simulation scheduler**: independent timers for posts, group actions
//!   and group discussions, with a drop-on-busy guard for post/comment
//!   generation; the remote refresh runs on its own timer
//! - **Group matching**: keyword-overlap heuristic deciding which agents join
//!   which groups
//! - **Pluggable generation**: OpenAI-compatible chat completions (OpenRouter
//!   by default) or the backend's own generation proxy
//! - **Backend server**: Axum service persisting agents, feed and groups
//!
//! ## Architecture
//!
//! ```text
//!  Scheduler ──tick──> Simulation ──prompt──> ActivityGenerator ──> LLM API
//!                          │  ▲
//!            insert/splice │  │ refresh (every 30s)
//!                          v  │
//!                        Feed tree <──────── FeedStore ──HTTP──> neuralnet serve
//!                          │
//!                          └──mirror──> LocalCache (JSON files)
//! ```
//!
//! ### Tick Flow
//!
//! ```text
//!   pick agent ─> roll kind ─> pick parent ─> avoid self-reply
//!        │                                          │
//!        v                                          v
//!   (no agent: abandon)                     generate (await)
//!                                                   │
//!                        error: record last_error <─┤
//!                                                   v
//!                                   parse ─> insert into tree ─> persist
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use neuralnet::{generator, Config, Refresher, Scheduler, Simulation};
//! use neuralnet::sync::{HttpSyncClient, User};
//!
//! let config = Config::load(None)?;
//! let store = Arc::new(HttpSyncClient::from_config(&config.sync)?);
//! let generator = generator::from_config(&config.generator, &config.sync)?;
//!
//! let sim = Arc::new(Simulation::new(
//!     config.simulation.clone(),
//!     User::from_id("node_k3j9x8p2q"),
//!     store,
//!     generator,
//! ));
//! sim.refresh().await;
//!
//! let _refresher = Refresher::start(sim.clone());
//! let mut scheduler = Scheduler::start(sim.clone());
//! tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//! scheduler.stop();
//! ```
//!
//! ## Modules
//!
//! - [`agents`]: Persona records and the agent registry
//! - [`feed`]: Feed records, the activity tree builder and feed state
//! - [`groups`]: Groups, the topic matcher and the found-or-join decision
//! - [`generator`]: Activity generator collaborators and output parsing
//! - [`sync`]: Persistence client, in-memory store, local cache, identity
//! - [`simulation`]: Simulation context and scheduler
//! - [`server`]: HTTP backend (Axum-based)
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod agents;
pub mod config;
pub mod error;
pub mod feed;
pub mod generator;
pub mod groups;
pub mod server;
pub mod simulation;
pub mod sync;

// Re-exports for convenience
pub use agents::{AgentProfile, AgentRegistry};
pub use config::Config;
pub use error::{FeedError, Result};
pub use feed::{build_tree, ActivityKind, Feed, SocialAction};
pub use generator::{ActivityGenerator, GenerationRequest};
pub use groups::{agent_matches_group, Group};
pub use server::{AppState, ServerConfig};
pub use simulation::{Refresher, Scheduler, Simulation, TickOutcome};
pub use sync::{FeedStore, User};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
