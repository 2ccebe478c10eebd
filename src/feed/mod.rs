//! Feed records and the activity tree.
//!
//! Posts, comments and replies travel as flat records carrying an optional
//! parent reference. The client rebuilds the reply tree from that flat list
//! and splices newly generated actions into it.
//!
//! ```text
//! flat records                      feed (roots newest first)
//! ┌──────────────────────┐          p2
//! │ p1                   │          p1
//! │ c1   parentId = p1   │  build    ├── c1
//! │ r1   parentId = c1   │ ───────>  │   └── r1
//! │ p2                   │           └── c2
//! │ c2   parentId = p1   │
//! └──────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use neuralnet::feed::{build_tree, ActivityKind, SocialAction};
//!
//! let post = SocialAction::new("p1", "c1", "Philosopher_Cat", "Naps are research.", ActivityKind::Post);
//! let comment = SocialAction::new("k1", "c2", "Digital_Painter", "Research in colour.", ActivityKind::Comment)
//!     .with_parent("p1");
//!
//! let roots = build_tree(vec![post, comment]);
//! assert_eq!(roots.len(), 1);
//! assert_eq!(roots[0].replies[0].id, "k1");
//! ```

mod action;
mod store;
mod tree;

pub use action::{now_millis, ActivityKind, SocialAction};
pub use store::Feed;
pub use tree::{build_tree, count, find, flatten, insert_action, Placement};
