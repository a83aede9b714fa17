//! Parent-pointer walks over the flat milestone rows of one entry

use crate::models::Milestone;
use std::collections::{HashMap, HashSet};

/// id → parent id for every milestone of one entry
pub fn parent_map(records: &[Milestone]) -> HashMap<String, Option<String>> {
    records
        .iter()
        .map(|m| (m.id.clone(), m.parent_id.clone()))
        .collect()
}

/// Whether placing `milestone_id` under `new_parent_id` would make it its
/// own ancestor
///
/// Walks up from `new_parent_id`. The walk is capped at the number of known
/// nodes; exceeding the cap means the stored data already contains a cycle
/// and the move is rejected.
pub fn would_create_cycle<'a>(
    parents: &'a HashMap<String, Option<String>>,
    milestone_id: &str,
    new_parent_id: &'a str,
) -> bool {
    let cap = parents.len() + 1;
    let mut cursor: Option<&'a str> = Some(new_parent_id);
    let mut steps = 0usize;

    while let Some(id) = cursor {
        if id == milestone_id {
            return true;
        }
        steps += 1;
        if steps > cap {
            tracing::warn!(
                milestone_id,
                new_parent_id,
                "ancestor walk exceeded node count; stored hierarchy already cyclic"
            );
            return true;
        }
        cursor = parents.get(id).and_then(|parent| parent.as_deref());
    }

    false
}

/// Ids of `root_id` and all its descendants in pre-order
///
/// Children are visited in the order they appear in `records`, which callers
/// pass sorted by `display_order`.
pub fn subtree_ids(records: &[Milestone], root_id: &str) -> Vec<String> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for record in records {
        if let Some(parent_id) = record.parent_id.as_deref() {
            children.entry(parent_id).or_default().push(record.id.as_str());
        }
    }

    let mut ordered = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![root_id];

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        ordered.push(id.to_string());
        if let Some(kids) = children.get(id) {
            stack.extend(kids.iter().rev());
        }
    }

    ordered
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

    fn chain() -> Vec<Milestone> {
        vec![
            record("a", None, 10),
            record("b", Some("a"), 10),
            record("c", Some("b"), 10),
            record("d", None, 20),
        ]
    }

    #[test]
    fn test_moving_under_descendant_is_cycle() {
        let parents = parent_map(&chain());
        assert!(would_create_cycle(&parents, "a", "c"));
        assert!(would_create_cycle(&parents, "a", "a"));
    }

    #[test]
    fn test_moving_under_unrelated_node_is_fine() {
        let parents = parent_map(&chain());
        assert!(!would_create_cycle(&parents, "c", "d"));
        assert!(!would_create_cycle(&parents, "d", "c"));
    }

    #[test]
    fn test_preexisting_cycle_fails_safe() {
        let records = vec![record("x", Some("y"), 10), record("y", Some("x"), 10), record("z", None, 10)];
        let parents = parent_map(&records);
        assert!(would_create_cycle(&parents, "z", "x"));
    }

    #[test]
    fn test_unknown_parent_terminates() {
        let parents = parent_map(&chain());
        assert!(!would_create_cycle(&parents, "a", "ghost"));
    }

    #[test]
    fn test_subtree_ids_preorder() {
        let mut records = chain();
        records.push(record("b2", Some("a"), 20));
        let ids = subtree_ids(&records, "a");
        assert_eq!(ids, vec!["a", "b", "c", "b2"]);
        assert_eq!(subtree_ids(&records, "d"), vec!["d"]);
    }

    #[test]
    fn test_subtree_ids_survives_cycle() {
        let records = vec![record("x", Some("y"), 10), record("y", Some("x"), 10)];
        let ids = subtree_ids(&records, "x");
        assert_eq!(ids, vec!["x", "y"]);
    }
}
