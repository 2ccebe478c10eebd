//! Dedup-by-identifier merging for reloads.

use std::collections::HashMap;

use crate::agents::AgentProfile;
use crate::feed::SocialAction;
use crate::groups::Group;

/// A record with a stable identifier
pub trait Identified {
    /// Record identifier
    fn record_id(&self) -> &str;
}

impl Identified for AgentProfile {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Identified for SocialAction {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Identified for Group {
    fn record_id(&self) -> &str {
        &self.id
    }
}

/// Deduplicate by identifier with map semantics: each id keeps the position
/// of its first occurrence and the value of its last.
pub fn merge_by_id<T: Identified>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut merged: Vec<T> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        match index.get(item.record_id()) {
            Some(&pos) => merged[pos] = item,
            None => {
                index.insert(item.record_id().to_string(), merged.len());
                merged.push(item);
            },
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ActivityKind;

    #[test]
    fn test_last_value_first_position() {
        let merged = merge_by_id(vec![
            SocialAction::new("a", "x", "X", "first a", ActivityKind::Post),
            SocialAction::new("b", "x", "X", "b", ActivityKind::Post),
            SocialAction::new("a", "x", "X", "second a", ActivityKind::Post),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, "a");
        assert_eq!(merged[0].content, "second a");
        assert_eq!(merged[1].id, "b");
    }

    #[test]
    fn test_empty() {
        let merged: Vec<Group> = merge_by_id(Vec::new());
        assert!(merged.is_empty());
    }
}
