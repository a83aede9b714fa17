//! Milestone Tree Loader
//!
//! Rebuilds the forest of one entry from its flat milestone rows with a
//! map-then-link pass:
//!
//! 1. stable-sort rows by `display_order` (ties keep their input order)
//! 2. index children by parent id
//! 3. every row without a parent, or whose parent is absent from the set,
//!    becomes a root
//!
//! Rows caught in a stored parent cycle are unreachable from any root. They
//! are not dropped: the first such row (in display order) is promoted to a
//! root and its subtree is attached from there.
//!
//! The forest is owned by the caller; nothing is cached.

use crate::db::RecordStore;
use crate::models::{Milestone, MilestoneNode};
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Build a forest from the milestones of a single entry
pub fn build_forest(mut records: Vec<Milestone>) -> Vec<MilestoneNode> {
    records.sort_by_key(|m| m.display_order);

    let known: HashSet<&str> = records.iter().map(|m| m.id.as_str()).collect();
    let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut root_indices = Vec::new();

    for (idx, record) in records.iter().enumerate() {
        match record.parent_id.as_deref() {
            Some(parent_id) if parent_id != record.id && known.contains(parent_id) => {
                children.entry(parent_id).or_default().push(idx);
            }
            Some(parent_id) if parent_id != record.id => {
                debug!(milestone_id = %record.id, parent_id, "orphaned milestone treated as root");
                root_indices.push(idx);
            }
            Some(_) => {
                warn!(milestone_id = %record.id, "milestone is its own parent; treated as root");
                root_indices.push(idx);
            }
            None => root_indices.push(idx),
        }
    }

    let mut placed = vec![false; records.len()];
    let mut roots: Vec<(usize, MilestoneNode)> = Vec::with_capacity(root_indices.len());
    for idx in root_indices {
        let node = attach(idx, &records, &children, &mut placed);
        roots.push((idx, node));
    }

    // Anything still unplaced sits on a parent cycle
    while let Some(idx) = placed.iter().position(|p| !p) {
        warn!(
            milestone_id = %records[idx].id,
            "milestone unreachable from any root (parent cycle); promoted to root"
        );
        let node = attach(idx, &records, &children, &mut placed);
        roots.push((idx, node));
    }

    roots.sort_by_key(|(idx, _)| *idx);
    roots.into_iter().map(|(_, node)| node).collect()
}

struct Frame {
    idx: usize,
    node: MilestoneNode,
    next_child: usize,
}

impl Frame {
    fn open(idx: usize, records: &[Milestone], placed: &mut [bool]) -> Self {
        placed[idx] = true;
        Self {
            idx,
            node: MilestoneNode::leaf(records[idx].clone()),
            next_child: 0,
        }
    }
}

/// Build the subtree rooted at `root`, marking every attached row as placed
///
/// Depth-first with an explicit stack; chains may be arbitrarily deep.
fn attach(
    root: usize,
    records: &[Milestone],
    children: &HashMap<&str, Vec<usize>>,
    placed: &mut [bool],
) -> MilestoneNode {
    let mut root = Frame::open(root, records, placed);
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        let top = stack.last_mut().unwrap_or(&mut root);
        let kids = children
            .get(records[top.idx].id.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut pending = None;
        while let Some(&child) = kids.get(top.next_child) {
            top.next_child += 1;
            if !placed[child] {
                pending = Some(child);
                break;
            }
        }

        if let Some(child) = pending {
            stack.push(Frame::open(child, records, placed));
            continue;
        }

        match stack.pop() {
            Some(done) => stack
                .last_mut()
                .unwrap_or(&mut root)
                .node
                .children
                .push(done.node),
            None => return root.node,
        }
    }
}

/// Loads entry forests from a [`RecordStore`]
#[derive(Clone)]
pub struct TreeLoader {
    store: Arc<dyn RecordStore>,
}

impl TreeLoader {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Fetch all milestones of `entry_id` and link them into a forest
    pub async fn load(&self, entry_id: &str) -> Result<Vec<MilestoneNode>> {
        let records = self.store.list_milestones(entry_id).await?;
        debug!(entry_id, count = records.len(), "loaded milestone rows");
        Ok(build_forest(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Progress;

    fn record(id: &str, parent: Option<&str>, order: i64) -> Milestone {
        let mut m = Milestone::new("entry", parent.map(String::from), id, Progress::checkbox(), order);
        m.id = id.to_string();
        m
    }

    fn ids(nodes: &[MilestoneNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.milestone.id.as_str()).collect()
    }

    #[test]
    fn test_builds_nested_forest_in_display_order() {
        let forest = build_forest(vec![
            record("b", None, 20),
            record("a2", Some("a"), 20),
            record("a", None, 10),
            record("a1", Some("a"), 10),
        ]);

        assert_eq!(ids(&forest), vec!["a", "b"]);
        assert_eq!(ids(&forest[0].children), vec!["a1", "a2"]);
        assert!(forest[1].children.is_empty());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let forest = build_forest(vec![
            record("first", None, 10),
            record("second", None, 10),
            record("third", None, 10),
        ]);
        assert_eq!(ids(&forest), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_orphan_becomes_root() {
        let forest = build_forest(vec![
            record("root", None, 10),
            record("orphan", Some("deleted-parent"), 5),
        ]);
        assert_eq!(ids(&forest), vec!["orphan", "root"]);
    }

    #[test]
    fn test_parent_cycle_is_not_dropped() {
        let forest = build_forest(vec![
            record("x", Some("y"), 10),
            record("y", Some("x"), 20),
            record("solo", None, 30),
        ]);

        let total: usize = forest.iter().map(MilestoneNode::subtree_size).sum();
        assert_eq!(total, 3);
        assert_eq!(ids(&forest), vec!["x", "solo"]);
        assert_eq!(ids(&forest[0].children), vec!["y"]);
    }

    #[test]
    fn test_self_parent_becomes_root() {
        let forest = build_forest(vec![record("loop", Some("loop"), 10)]);
        assert_eq!(ids(&forest), vec!["loop"]);
        assert!(forest[0].children.is_empty());
    }

    #[test]
    fn test_deep_chain_builds_without_recursion() {
        let depth = 50_000;
        let mut rows = vec![record("n0", None, 0)];
        for i in 1..depth {
            rows.push(record(&format!("n{}", i), Some(&format!("n{}", i - 1)), 0));
        }
        rows.reverse();

        let forest = build_forest(rows);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].milestone.id, "n0");
        assert_eq!(forest[0].subtree_size(), depth);

        let mut cursor = &forest[0];
        let mut levels = 1;
        while let Some(child) = cursor.children.first() {
            assert_eq!(cursor.children.len(), 1);
            cursor = child;
            levels += 1;
        }
        assert_eq!(levels, depth);
        assert_eq!(cursor.milestone.id, format!("n{}", depth - 1));
    }

    #[test]
    fn test_empty_input() {
        assert!(build_forest(Vec::new()).is_empty());
    }
}
