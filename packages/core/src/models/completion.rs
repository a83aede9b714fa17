//! Completion result shapes returned by the aggregator and query facade

use serde::{Deserialize, Serialize};

/// Rolled-up progress for a node, entry, or set of roots
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub percent: f64,
    pub completed: i64,
    pub total: i64,
}

impl Completion {
    pub const ZERO: Completion = Completion {
        percent: 0.0,
        completed: 0,
        total: 0,
    };
}

/// Completion of a single milestone subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneCompletion {
    pub milestone_id: String,
    pub entry_id: String,
    pub percent: f64,
    pub completed: i64,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryCompletion {
    pub entry_id: String,
    pub percent: f64,
    pub completed: i64,
    pub total: i64,
}

impl EntryCompletion {
    pub fn from_completion(entry_id: impl Into<String>, completion: Completion) -> Self {
        Self {
            entry_id: entry_id.into(),
            percent: completion.percent,
            completed: completion.completed,
            total: completion.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FranchiseCompletion {
    pub franchise_id: String,
    pub percent: f64,
    /// Entries that qualified for the rollup
    pub entry_count: usize,
}

/// Which aggregates a `recompute` call should refresh
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeRequest {
    #[serde(default)]
    pub entry_id: Option<String>,
    #[serde(default)]
    pub franchise_id: Option<String>,
    #[serde(default = "default_true")]
    pub include_optional_entries: bool,
}

fn default_true() -> bool {
    true
}

/// Result of a combined recompute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeResult {
    pub milestones: Vec<MilestoneCompletion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<EntryCompletion>,
    pub entries: Vec<EntryCompletion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub franchise: Option<FranchiseCompletion>,
}
