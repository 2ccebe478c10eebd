//! Client-side feed state with bounded retention.

use super::tree::{build_tree, count, find, flatten, insert_action, Placement};
use super::SocialAction;

/// Default number of roots kept in memory
pub const DEFAULT_FEED_CAPACITY: usize = 100;

/// Ordered forest of top-level posts and their replies.
///
/// Roots are kept newest first. Once more than `capacity` roots are held the
/// oldest ones are truncated; records are otherwise never removed.
#[derive(Debug, Clone)]
pub struct Feed {
    roots: Vec<SocialAction>,
    capacity: usize,
}

impl Default for Feed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl Feed {
    /// Create an empty feed retaining at most `capacity` roots
    pub fn new(capacity: usize) -> Self {
        Self {
            roots: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Root capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Splice a new record into the tree and enforce the retention cap
    pub fn insert(&mut self, action: SocialAction) -> Placement {
        let placement = insert_action(&mut self.roots, action);
        self.roots.truncate(self.capacity);
        placement
    }

    /// Replace the whole feed from a flat record list.
    ///
    /// Records are ordered by timestamp before building so that roots come
    /// out newest first and each reply list oldest first, regardless of the
    /// order the store returned them in.
    pub fn replace_from_flat(&mut self, mut records: Vec<SocialAction>) {
        records.sort_by_key(|a| a.timestamp);
        let mut roots = build_tree(records);
        roots.reverse();
        roots.truncate(self.capacity);
        self.roots = roots;
    }

    /// Top-level records, newest first
    pub fn roots(&self) -> &[SocialAction] {
        &self.roots
    }

    /// Number of roots
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether the feed has no records
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of records including replies
    pub fn total(&self) -> usize {
        count(&self.roots)
    }

    /// Find a record anywhere in the tree
    pub fn find(&self, id: &str) -> Option<&SocialAction> {
        find(&self.roots, id)
    }

    /// Every record, flattened in pre-order
    pub fn all_actions(&self) -> Vec<SocialAction> {
        flatten(&self.roots)
    }

    /// The `n` most recent roots, optionally restricted to one group
    pub fn recent_roots(&self, n: usize, group_id: Option<&str>) -> Vec<&SocialAction> {
        let mut roots: Vec<&SocialAction> = self
            .roots
            .iter()
            .filter(|r| group_id.is_none() || r.group_id.as_deref() == group_id)
            .collect();
        roots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        roots.truncate(n);
        roots
    }

    /// Roots posted inside a group
    pub fn group_roots(&self, group_id: &str) -> Vec<&SocialAction> {
        self.roots
            .iter()
            .filter(|r| r.group_id.as_deref() == Some(group_id))
            .collect()
    }

    /// Every record posted inside a group, flattened
    pub fn group_actions(&self, group_id: &str) -> Vec<SocialAction> {
        let roots: Vec<SocialAction> = self
            .group_roots(group_id)
            .into_iter()
            .cloned()
            .collect();
        flatten(&roots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ActivityKind;

    fn post(id: &str, ts: i64) -> SocialAction {
        SocialAction::new(id, "c1", "Cat", "text", ActivityKind::Post).with_timestamp(ts)
    }

    fn comment(id: &str, parent: &str, ts: i64) -> SocialAction {
        SocialAction::new(id, "c2", "Painter", "text", ActivityKind::Comment)
            .with_parent(parent)
            .with_timestamp(ts)
    }

    #[test]
    fn test_capacity_keeps_most_recent_roots() {
        let mut feed = Feed::new(100);
        for i in 0..150 {
            feed.insert(post(&format!("p{i}"), i));
        }

        assert_eq!(feed.len(), 100);
        assert_eq!(feed.roots()[0].id, "p149");
        assert_eq!(feed.roots()[99].id, "p50");
        assert!(feed.find("p49").is_none());
    }

    #[test]
    fn test_comment_lands_under_parent() {
        let mut feed = Feed::default();
        feed.insert(post("p1", 1));
        feed.insert(comment("k1", "p1", 2));

        assert_eq!(feed.len(), 1);
        assert_eq!(feed.roots()[0].replies.len(), 1);
        assert_eq!(feed.roots()[0].replies[0].id, "k1");
        assert_eq!(feed.total(), 2);
    }

    #[test]
    fn test_replace_from_flat_orders_by_time() {
        let mut feed = Feed::default();
        // store order: newest first, as the backend returns it
        feed.replace_from_flat(vec![
            comment("k2", "p1", 40),
            post("p2", 30),
            comment("k1", "p1", 20),
            post("p1", 10),
        ]);

        let roots: Vec<_> = feed.roots().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(roots, vec!["p2", "p1"]);
        let replies: Vec<_> = feed.roots()[1].replies.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(replies, vec!["k1", "k2"]);
    }

    #[test]
    fn test_recent_roots_and_groups() {
        let mut feed = Feed::default();
        feed.insert(post("p1", 1));
        feed.insert(post("g1p", 2).with_group("g1"));
        feed.insert(post("p3", 3));
        feed.insert(post("p4", 4));

        let recent: Vec<_> = feed.recent_roots(2, None).iter().map(|r| r.id.clone()).collect();
        assert_eq!(recent, vec!["p4", "p3"]);

        let in_group: Vec<_> = feed.recent_roots(3, Some("g1")).iter().map(|r| r.id.clone()).collect();
        assert_eq!(in_group, vec!["g1p"]);
        assert_eq!(feed.group_roots("g1").len(), 1);
        assert!(feed.group_actions("nope").is_empty());
    }
}
