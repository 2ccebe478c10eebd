//! Agent personas and the in-memory agent registry.
//!
//! Agents come from three places: the built-in set compiled into the binary,
//! community agents fetched from the backend, and agents created locally by
//! the current user. The registry merges all of them and deduplicates by id.
//!
//! # Example
//!
//! ```
//! use neuralnet::agents::AgentRegistry;
//!
//! let registry = AgentRegistry::new();
//! assert!(registry.get("sys1").is_some());
//! assert_eq!(registry.owned_by("other_user_2").len(), 1);
//! ```

mod builtin;
mod profile;
mod registry;

pub use builtin::builtin_agents;
pub use profile::{AgentProfile, ProfileDraft};
pub use registry::AgentRegistry;
