//! Reply tree construction.
//!
//! All traversals use explicit stacks, so thread depth is bounded by heap
//! rather than by the call stack.

use std::collections::HashMap;

use super::SocialAction;

/// Where [`insert_action`] placed a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Prepended as a new root
    Root,
    /// Appended to its parent's replies
    Child,
    /// Parent reference did not resolve; prepended as a root
    Orphan,
}

/// Build a reply forest from a flat list of records.
///
/// Each node's `replies` holds exactly its direct children. Roots and
/// children keep their input order. A record whose parent is not in the
/// input becomes a root.
///
/// Duplicate ids collapse into one node holding the last record's data at
/// the first record's position. Any `replies` already present on the input
/// are discarded. Parent cycles are broken by promoting the earliest record
/// of each cycle to a root, so no record is ever lost.
pub fn build_tree(flat: impl IntoIterator<Item = SocialAction>) -> Vec<SocialAction> {
    // Pass 1: id -> slot lookup with emptied replies
    let mut slots: Vec<Option<SocialAction>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for mut action in flat {
        action.replies.clear();
        match index.get(&action.id) {
            Some(&idx) => slots[idx] = Some(action),
            None => {
                index.insert(action.id.clone(), slots.len());
                slots.push(Some(action));
            },
        }
    }

    // Pass 2: attach each node to its parent, or make it a root
    let n = slots.len();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut parent_of: Vec<Option<usize>> = vec![None; n];
    let mut roots: Vec<usize> = Vec::new();
    for (idx, slot) in slots.iter().enumerate() {
        let parent = slot
            .as_ref()
            .and_then(|a| a.parent_id.as_deref())
            .and_then(|pid| index.get(pid).copied())
            .filter(|&p| p != idx);
        match parent {
            Some(p) => {
                children[p].push(idx);
                parent_of[idx] = Some(p);
            },
            None => roots.push(idx),
        }
    }

    let mut visited = vec![false; n];
    let mut order: Vec<usize> = Vec::with_capacity(n);
    for &root in &roots {
        walk(root, &children, &mut visited, &mut order);
    }

    // Anything unreached sits on or below a parent cycle
    for start in 0..n {
        if visited[start] {
            continue;
        }
        let head = cycle_head(start, &parent_of);
        if let Some(p) = parent_of[head].take() {
            children[p].retain(|&c| c != head);
        }
        roots.push(head);
        walk(head, &children, &mut visited, &mut order);
    }

    // Assemble bottom-up: in reverse pre-order every child precedes its parent
    for &idx in order.iter().rev() {
        let replies: Vec<SocialAction> = children[idx]
            .iter()
            .filter_map(|&c| slots[c].take())
            .collect();
        if let Some(node) = slots[idx].as_mut() {
            node.replies = replies;
        }
    }

    roots.iter().filter_map(|&r| slots[r].take()).collect()
}

/// Pre-order walk from `start`, recording visit order
fn walk(start: usize, children: &[Vec<usize>], visited: &mut [bool], order: &mut Vec<usize>) {
    let mut stack = vec![start];
    while let Some(idx) = stack.pop() {
        if visited[idx] {
            continue;
        }
        visited[idx] = true;
        order.push(idx);
        stack.extend(children[idx].iter().rev());
    }
}

/// Follow parent links from `start` and return the earliest record of the
/// cycle they end in.
fn cycle_head(start: usize, parent_of: &[Option<usize>]) -> usize {
    let mut path: Vec<usize> = Vec::new();
    let mut position: HashMap<usize, usize> = HashMap::new();
    let mut current = start;
    loop {
        if let Some(&at) = position.get(&current) {
            return path[at..].iter().copied().min().unwrap_or(current);
        }
        position.insert(current, path.len());
        path.push(current);
        match parent_of[current] {
            Some(p) => current = p,
            // unreachable for an unvisited node, but a rootless chain is its own head
            None => return current,
        }
    }
}

/// Flatten a forest into pre-order records with empty `replies`
pub fn flatten(roots: &[SocialAction]) -> Vec<SocialAction> {
    let mut out = Vec::new();
    let mut stack: Vec<&SocialAction> = roots.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node.detached());
        stack.extend(node.replies.iter().rev());
    }
    out
}

/// Count every node in a forest
pub fn count(roots: &[SocialAction]) -> usize {
    let mut total = 0;
    let mut stack: Vec<&SocialAction> = roots.iter().collect();
    while let Some(node) = stack.pop() {
        total += 1;
        stack.extend(node.replies.iter());
    }
    total
}

/// Find a node anywhere in a forest
pub fn find<'a>(roots: &'a [SocialAction], id: &str) -> Option<&'a SocialAction> {
    let mut stack: Vec<&SocialAction> = roots.iter().collect();
    while let Some(node) = stack.pop() {
        if node.id == id {
            return Some(node);
        }
        stack.extend(node.replies.iter());
    }
    None
}

/// Splice a new record into a forest.
///
/// Records without a parent are prepended as roots. Records with a parent
/// are appended to the replies of the node with that id; if no such node
/// exists the record is prepended as a root instead.
pub fn insert_action(roots: &mut Vec<SocialAction>, action: SocialAction) -> Placement {
    let Some(parent_id) = action.parent_id.clone() else {
        roots.insert(0, action);
        return Placement::Root;
    };

    let mut stack: Vec<&mut SocialAction> = roots.iter_mut().collect();
    while let Some(node) = stack.pop() {
        if node.id == parent_id {
            node.replies.push(action);
            return Placement::Child;
        }
        stack.extend(node.replies.iter_mut());
    }

    roots.insert(0, action);
    Placement::Orphan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ActivityKind;
    use proptest::prelude::*;

    fn node(id: &str, parent: Option<&str>) -> SocialAction {
        let kind = if parent.is_some() {
            ActivityKind::Comment
        } else {
            ActivityKind::Post
        };
        let action = SocialAction::new(id, "c1", "Cat", format!("content {id}"), kind)
            .with_timestamp(0);
        match parent {
            Some(p) => action.with_parent(p),
            None => action,
        }
    }

    fn ids(nodes: &[SocialAction]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_build_nested() {
        let roots = build_tree(vec![
            node("p1", None),
            node("c1", Some("p1")),
            node("r1", Some("c1")),
            node("p2", None),
            node("c2", Some("p1")),
        ]);

        assert_eq!(ids(&roots), vec!["p1", "p2"]);
        assert_eq!(ids(&roots[0].replies), vec!["c1", "c2"]);
        assert_eq!(ids(&roots[0].replies[0].replies), vec!["r1"]);
        assert!(roots[1].replies.is_empty());
    }

    #[test]
    fn test_child_before_parent_in_input() {
        let roots = build_tree(vec![node("c1", Some("p1")), node("p1", None)]);
        assert_eq!(ids(&roots), vec!["p1"]);
        assert_eq!(ids(&roots[0].replies), vec!["c1"]);
    }

    #[test]
    fn test_unknown_parent_becomes_root() {
        let roots = build_tree(vec![node("p1", None), node("c9", Some("gone"))]);
        assert_eq!(ids(&roots), vec!["p1", "c9"]);
        assert_eq!(roots[1].parent_id.as_deref(), Some("gone"));
    }

    #[test]
    fn test_incoming_replies_discarded() {
        let mut p1 = node("p1", None);
        p1.replies.push(node("stale", Some("p1")));
        let roots = build_tree(vec![p1]);
        assert!(roots[0].replies.is_empty());
    }

    #[test]
    fn test_duplicate_ids_last_wins() {
        let mut newer = node("p1", None);
        newer.content = "edited".to_string();
        let roots = build_tree(vec![node("p1", None), node("p2", None), newer]);
        assert_eq!(ids(&roots), vec!["p1", "p2"]);
        assert_eq!(roots[0].content, "edited");
    }

    #[test]
    fn test_cycles_do_not_drop_records() {
        let roots = build_tree(vec![
            node("self", Some("self")),
            node("a", Some("b")),
            node("b", Some("a")),
            node("tail", Some("b")),
        ]);

        assert_eq!(count(&roots), 4);
        assert_eq!(ids(&roots), vec!["self", "a"]);
        assert_eq!(ids(&roots[1].replies), vec!["b"]);
        assert_eq!(ids(&roots[1].replies[0].replies), vec!["tail"]);
    }

    #[test]
    fn test_deep_thread() {
        let mut flat = vec![node("n0", None)];
        for i in 1..50_000 {
            flat.push(node(&format!("n{i}"), Some(&format!("n{}", i - 1))));
        }
        let roots = build_tree(flat);
        assert_eq!(roots.len(), 1);
        assert_eq!(count(&roots), 50_000);
        assert!(find(&roots, "n49999").is_some());
        assert_eq!(flatten(&roots).len(), 50_000);
        // iterative teardown keeps the drop from recursing 50k frames
        let mut stack = roots;
        while let Some(mut n) = stack.pop() {
            stack.append(&mut n.replies);
        }
    }

    #[test]
    fn test_insert_comment_under_post() {
        let mut roots = vec![node("p1", None)];
        let placement = insert_action(&mut roots, node("k1", Some("p1")));

        assert_eq!(placement, Placement::Child);
        assert_eq!(roots.len(), 1);
        assert_eq!(ids(&roots[0].replies), vec!["k1"]);
    }

    #[test]
    fn test_insert_nested_and_orphan() {
        let mut roots = build_tree(vec![node("p1", None), node("c1", Some("p1"))]);

        assert_eq!(insert_action(&mut roots, node("r1", Some("c1"))), Placement::Child);
        assert_eq!(ids(&roots[0].replies[0].replies), vec!["r1"]);

        assert_eq!(insert_action(&mut roots, node("x", Some("missing"))), Placement::Orphan);
        assert_eq!(ids(&roots), vec!["x", "p1"]);

        assert_eq!(insert_action(&mut roots, node("p2", None)), Placement::Root);
        assert_eq!(ids(&roots), vec!["p2", "x", "p1"]);
    }

    #[test]
    fn test_flatten_preorder() {
        let roots = build_tree(vec![
            node("p1", None),
            node("c1", Some("p1")),
            node("p2", None),
            node("r1", Some("c1")),
        ]);
        let flat = flatten(&roots);
        assert_eq!(ids(&flat), vec!["p1", "c1", "r1", "p2"]);
        assert!(flat.iter().all(|a| a.replies.is_empty()));
    }

    /// Flat records where every parent reference points at an earlier record
    /// or at an id that is never present.
    fn acyclic_records() -> impl Strategy<Value = Vec<SocialAction>> {
        prop::collection::vec(prop::option::of((any::<prop::sample::Index>(), any::<bool>())), 0..40)
            .prop_map(|links| {
                let mut out = Vec::with_capacity(links.len());
                for (i, link) in links.into_iter().enumerate() {
                    let id = format!("n{i}");
                    let parent = match link {
                        Some((pick, true)) if i > 0 => Some(format!("n{}", pick.index(i))),
                        Some((_, false)) => Some(format!("missing{i}")),
                        _ => None,
                    };
                    out.push(node(&id, parent.as_deref()));
                }
                out
            })
            .prop_shuffle()
    }

    proptest! {
        #[test]
        fn prop_rebuild_is_idempotent(flat in acyclic_records()) {
            let first = build_tree(flat.clone());
            let second = build_tree(flat);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(build_tree(flatten(&first)), first);
        }

        #[test]
        fn prop_no_record_dropped(flat in acyclic_records()) {
            let total = flat.len();
            let roots = build_tree(flat.clone());
            prop_assert_eq!(count(&roots), total);

            for record in &flat {
                let dangling = record
                    .parent_id
                    .as_deref()
                    .is_some_and(|p| !flat.iter().any(|r| r.id == p));
                if dangling {
                    prop_assert!(roots.iter().any(|r| r.id == record.id));
                }
            }
        }
    }
}
