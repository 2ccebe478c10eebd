//! Interest groups: the group record, the topic matcher and the
//! found-or-join decision.
//!
//! # Example
//!
//! ```
//! use neuralnet::agents::AgentRegistry;
//! use neuralnet::groups::{agent_matches_group, Group, GroupDraft};
//!
//! let registry = AgentRegistry::new();
//! let painter = registry.get("c2").unwrap();
//!
//! let draft = GroupDraft {
//!     name: "Fractal Club".to_string(),
//!     description: "Self-similar things".to_string(),
//!     topics: vec!["fractals".to_string()],
//! };
//! let group = Group::found(draft, registry.get("sys1").unwrap(), 0);
//! assert!(agent_matches_group(painter, &group));
//! ```

mod group;
mod matcher;
mod selector;

pub use group::{Group, GroupDraft};
pub use matcher::{agent_matches_group, joinable_groups, tokenize, tokens_overlap};
pub use selector::{choose_group_action, GroupAction};
