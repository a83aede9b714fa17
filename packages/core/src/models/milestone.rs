//! Milestone Data Model
//!
//! A milestone is one node in the progress tree owned by an entry. Leaves are
//! either checkboxes or counters; any milestone with children acts as a group
//! and only its descendants count toward completion.
//!
//! The type-dependent fields are modelled with [`Progress`], a tagged variant,
//! so a counter without a target cannot be constructed through the public
//! constructors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Validation errors raised while building or mutating tracker records
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("Name must not be empty")]
    EmptyName,

    #[error("Accent must not be empty")]
    EmptyAccent,

    #[error("Counter target must be > 0 (got {target})")]
    InvalidCounterTarget { target: i64 },

    #[error("Counter target must be > 0")]
    MissingCounterTarget,

    #[error("Invalid milestone type: {0}")]
    InvalidMilestoneType(String),

    #[error("Invalid media type: {0}")]
    InvalidMediaType(String),
}

/// Wire/storage discriminant of a milestone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneType {
    Checkbox,
    Counter,
}

impl MilestoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneType::Checkbox => "CHECKBOX",
            MilestoneType::Counter => "COUNTER",
        }
    }
}

impl fmt::Display for MilestoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MilestoneType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CHECKBOX" => Ok(MilestoneType::Checkbox),
            "COUNTER" => Ok(MilestoneType::Counter),
            other => Err(ValidationError::InvalidMilestoneType(other.to_string())),
        }
    }
}

/// Progress state of a milestone
///
/// Serialized with an internal `type` tag, so a counter renders as
/// `{"type": "COUNTER", "current": 4, "target": 10}` and a checkbox as
/// `{"type": "CHECKBOX", "current": 1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Progress {
    Checkbox {
        #[serde(serialize_with = "serialize_checked", deserialize_with = "deserialize_checked")]
        current: bool,
    },
    Counter { current: i64, target: i64 },
}

fn serialize_checked<S>(checked: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_i64(i64::from(*checked))
}

fn deserialize_checked<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(i64::deserialize(deserializer)? >= 1)
}

impl Progress {
    /// A fresh, unchecked checkbox
    pub fn checkbox() -> Self {
        Progress::Checkbox { current: false }
    }

    /// A fresh counter at zero; the target must be positive
    pub fn counter(target: i64) -> Result<Self, ValidationError> {
        Self::counter_at(0, target)
    }

    /// A counter with `current` clamped into `[0, target]`
    pub fn counter_at(current: i64, target: i64) -> Result<Self, ValidationError> {
        if target <= 0 {
            return Err(ValidationError::InvalidCounterTarget { target });
        }
        Ok(Progress::Counter {
            current: current.clamp(0, target),
            target,
        })
    }

    /// Build progress of the requested type, validating the target for counters
    ///
    /// Checkboxes ignore `target` and collapse `current` to 0/1.
    pub fn build(
        kind: MilestoneType,
        current: i64,
        target: Option<i64>,
    ) -> Result<Self, ValidationError> {
        match kind {
            MilestoneType::Checkbox => Ok(Progress::Checkbox {
                current: current >= 1,
            }),
            MilestoneType::Counter => match target {
                Some(target) => Self::counter_at(current, target),
                None => Err(ValidationError::MissingCounterTarget),
            },
        }
    }

    /// Rebuild progress from stored columns without rejecting malformed rows
    ///
    /// A stored counter with a missing or non-positive target keeps target 0
    /// so aggregation can still treat it as 0%.
    pub fn from_stored(kind: MilestoneType, current: i64, target: Option<i64>) -> Self {
        match kind {
            MilestoneType::Checkbox => Progress::Checkbox {
                current: current >= 1,
            },
            MilestoneType::Counter => {
                let target = target.unwrap_or(0).max(0);
                Progress::Counter {
                    current: current.clamp(0, target),
                    target,
                }
            }
        }
    }

    pub fn kind(&self) -> MilestoneType {
        match self {
            Progress::Checkbox { .. } => MilestoneType::Checkbox,
            Progress::Counter { .. } => MilestoneType::Counter,
        }
    }

    /// Integer progress value (0/1 for checkboxes)
    pub fn current(&self) -> i64 {
        match *self {
            Progress::Checkbox { current } => i64::from(current),
            Progress::Counter { current, .. } => current,
        }
    }

    /// Counter target; `None` for checkboxes
    pub fn target(&self) -> Option<i64> {
        match *self {
            Progress::Checkbox { .. } => None,
            Progress::Counter { target, .. } => Some(target),
        }
    }

    /// Same shape, current reset to zero
    pub fn reset(&self) -> Self {
        match *self {
            Progress::Checkbox { .. } => Progress::Checkbox { current: false },
            Progress::Counter { target, .. } => Progress::Counter { current: 0, target },
        }
    }

    /// Store a new current value, clamped for the variant
    pub fn with_current(&self, value: i64) -> Self {
        match *self {
            Progress::Checkbox { .. } => Progress::Checkbox {
                current: value >= 1,
            },
            Progress::Counter { target, .. } => Progress::Counter {
                current: value.clamp(0, target.max(0)),
                target,
            },
        }
    }

    /// Checkboxes toggle regardless of delta; counters add `delta` and clamp
    pub fn incremented(&self, delta: i64) -> Self {
        match *self {
            Progress::Checkbox { current } => Progress::Checkbox { current: !current },
            Progress::Counter { current, target } => Progress::Counter {
                current: current.saturating_add(delta).clamp(0, target.max(0)),
                target,
            },
        }
    }
}

/// A single persisted milestone record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub entry_id: String,
    pub parent_id: Option<String>,
    pub title: String,
    #[serde(flatten)]
    pub progress: Progress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub display_order: i64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Milestone {
    /// New milestone with a generated id and current timestamps
    pub fn new(
        entry_id: impl Into<String>,
        parent_id: Option<String>,
        title: impl Into<String>,
        progress: Progress,
        display_order: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            entry_id: entry_id.into(),
            parent_id,
            title: title.into(),
            progress,
            description: None,
            display_order,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn kind(&self) -> MilestoneType {
        self.progress.kind()
    }
}

/// Trim a title and reject it if nothing remains
pub fn normalize_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Accepts both plain values and explicit nulls for double-Option fields
///
/// - missing field → `None` (leave unchanged)
/// - `null` → `Some(None)` (clear)
/// - value → `Some(Some(value))`
pub(crate) fn deserialize_optional_field<'de, D, T>(
    deserializer: D,
) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

/// Partial milestone update
///
/// `target` and `description` use the double-Option pattern so callers can
/// distinguish "leave unchanged" from "clear".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MilestoneType>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub target: Option<Option<i64>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<i64>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub description: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i64>,
}

impl MilestoneUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_kind(mut self, kind: MilestoneType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_target(mut self, target: Option<i64>) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_current(mut self, current: i64) -> Self {
        self.current = Some(current);
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_display_order(mut self, display_order: i64) -> Self {
        self.display_order = Some(display_order);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.kind.is_none()
            && self.target.is_none()
            && self.current.is_none()
            && self.description.is_none()
            && self.display_order.is_none()
    }

    /// Resolve the effective progress after applying this update to `existing`
    ///
    /// Switching to a checkbox drops the target and collapses current to 0/1.
    /// Staying or becoming a counter requires a positive target, taken from
    /// the update or, failing that, from the existing counter.
    pub fn resolve_progress(&self, existing: &Progress) -> Result<Progress, ValidationError> {
        let kind = self.kind.unwrap_or_else(|| existing.kind());
        let current = self.current.unwrap_or_else(|| existing.current());
        let target = match self.target {
            Some(explicit) => explicit,
            None => existing.target(),
        };
        Progress::build(kind, current, target)
    }
}

/// Milestone plus its reconstructed children, ordered by `display_order`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneNode {
    #[serde(flatten)]
    pub milestone: Milestone,
    pub children: Vec<MilestoneNode>,
}

impl MilestoneNode {
    pub fn leaf(milestone: Milestone) -> Self {
        Self {
            milestone,
            children: Vec::new(),
        }
    }

    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of nodes in this subtree, including `self`
    pub fn subtree_size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

impl Drop for MilestoneNode {
    // Flatten before dropping so deep chains release without recursion
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}
