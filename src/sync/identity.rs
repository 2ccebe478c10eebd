//! Local session identity.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::LocalCache;

/// Cache key holding the guest id
pub const GUEST_ID_KEY: &str = "neuralnet_guest_id";

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const GUEST_SUFFIX_LEN: usize = 9;

const BOTTTS_URL: &str = "https://api.dicebear.com/7.x/bottts-neutral/svg";

/// The person running the session. Client-side only, never persisted remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier used to partition owned agents and cache keys
    pub id: String,
    /// Display name
    pub name: String,
    /// Avatar URL
    pub avatar: String,
}

impl User {
    /// Derive name and avatar deterministically from an identifier
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        let chars: Vec<char> = id.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        let avatar = reqwest::Url::parse_with_params(BOTTTS_URL, &[("seed", id.as_str())])
            .map(String::from)
            .unwrap_or_else(|_| format!("{BOTTTS_URL}?seed={id}"));

        Self {
            name: format!("Node {tail}"),
            avatar,
            id,
        }
    }
}

fn random_guest_id(rng: &mut impl Rng) -> String {
    let suffix: String = (0..GUEST_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("node_{suffix}")
}

/// The cached guest id, or a fresh `node_xxxxxxxxx` id stored for next time
pub fn guest_id(cache: Option<&LocalCache>, rng: &mut impl Rng) -> String {
    if let Some(id) = cache
        .and_then(|c| c.get_string(GUEST_ID_KEY))
        .filter(|id| !id.trim().is_empty())
    {
        return id;
    }

    let id = random_guest_id(rng);
    if let Some(cache) = cache {
        if let Err(e) = cache.set(GUEST_ID_KEY, &id) {
            tracing::warn!(error = %e, "could not persist guest id");
        }
    }
    id
}
