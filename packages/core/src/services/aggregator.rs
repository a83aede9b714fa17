//! Completion Aggregator
//!
//! Pure rollup of progress from leaves to groups, entries and franchises.
//!
//! - checkbox leaf: `completed = 1` when checked, `total = 1`, percent 0 or 100
//! - counter leaf: `completed = clamp(current, 0, target)`, `total = target`,
//!   percent `completed / total * 100` (0 when the target is 0)
//! - group: `completed` and `total` are sums over the children, but `percent`
//!   is the unweighted mean of the children's percents
//! - entry: same rule applied across its roots; no milestones means zero
//! - franchise: unweighted mean of entry percents, optionally skipping
//!   optional entries; no qualifying entries means zero
//!
//! The group rule gives every child branch equal weight regardless of how
//! many leaves it holds. Keep it that way.

use crate::models::{Completion, MilestoneCompletion, MilestoneNode, Progress};

/// Completion of a single node and its subtree
///
/// Uses an explicit post-order stack, so deep trees cannot overflow the call
/// stack.
pub fn compute(node: &MilestoneNode) -> Completion {
    compute_subtree(node, None)
}

/// Like [`compute`], also recording the completion of every node visited
///
/// Records are appended in post-order (children before their parent).
pub fn compute_with_breakdown(
    node: &MilestoneNode,
    breakdown: &mut Vec<MilestoneCompletion>,
) -> Completion {
    compute_subtree(node, Some(breakdown))
}

fn leaf_completion(progress: &Progress) -> Completion {
    match *progress {
        Progress::Checkbox { current } => {
            let completed = i64::from(current);
            Completion {
                percent: completed as f64 * 100.0,
                completed,
                total: 1,
            }
        }
        Progress::Counter { current, target } => {
            let total = target.max(0);
            let completed = current.clamp(0, total);
            let percent = if total > 0 {
                completed as f64 * 100.0 / total as f64
            } else {
                0.0
            };
            Completion {
                percent,
                completed,
                total,
            }
        }
    }
}

/// Unweighted mean of percents with summed counts; zero for no parts
pub fn combine(parts: &[Completion]) -> Completion {
    if parts.is_empty() {
        return Completion::ZERO;
    }
    let percent = parts.iter().map(|c| c.percent).sum::<f64>() / parts.len() as f64;
    Completion {
        percent,
        completed: parts.iter().map(|c| c.completed).sum(),
        total: parts.iter().map(|c| c.total).sum(),
    }
}

fn compute_subtree(
    root: &MilestoneNode,
    mut breakdown: Option<&mut Vec<MilestoneCompletion>>,
) -> Completion {
    // (node, children already expanded)
    let mut stack: Vec<(&MilestoneNode, bool)> = vec![(root, false)];
    let mut results: Vec<Completion> = Vec::new();

    while let Some((node, expanded)) = stack.pop() {
        if !node.is_group() {
            let completion = leaf_completion(&node.milestone.progress);
            record(&mut breakdown, node, completion);
            results.push(completion);
            continue;
        }

        if !expanded {
            stack.push((node, true));
            for child in node.children.iter().rev() {
                stack.push((child, false));
            }
            continue;
        }

        let start = results.len() - node.children.len();
        let completion = combine(&results[start..]);
        results.truncate(start);
        record(&mut breakdown, node, completion);
        results.push(completion);
    }

    results.pop().unwrap_or(Completion::ZERO)
}

fn record(
    breakdown: &mut Option<&mut Vec<MilestoneCompletion>>,
    node: &MilestoneNode,
    completion: Completion,
) {
    if let Some(out) = breakdown.as_deref_mut() {
        out.push(MilestoneCompletion {
            milestone_id: node.milestone.id.clone(),
            entry_id: node.milestone.entry_id.clone(),
            percent: completion.percent,
            completed: completion.completed,
            total: completion.total,
        });
    }
}

/// Entry-level rollup across the roots of its forest
pub fn entry_completion(roots: &[MilestoneNode]) -> Completion {
    let parts: Vec<Completion> = roots.iter().map(compute).collect();
    combine(&parts)
}

/// Entry rollup plus a per-milestone breakdown of every node
pub fn entry_completion_with_breakdown(
    roots: &[MilestoneNode],
    breakdown: &mut Vec<MilestoneCompletion>,
) -> Completion {
    let parts: Vec<Completion> = roots
        .iter()
        .map(|root| compute_with_breakdown(root, breakdown))
        .collect();
    combine(&parts)
}

/// Franchise percent: unweighted mean over qualifying entry percents
///
/// `entries` yields `(is_optional, entry_percent)`. Returns the percent and
/// the number of entries that qualified.
pub fn franchise_percent<I>(entries: I, include_optional: bool) -> (f64, usize)
where
    I: IntoIterator<Item = (bool, f64)>,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    for (is_optional, percent) in entries {
        if is_optional && !include_optional {
            continue;
        }
        sum += percent;
        count += 1;
    }
    if count == 0 {
        (0.0, 0)
    } else {
        (sum / count as f64, count)
    }
}
