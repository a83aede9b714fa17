//! Milestone Service - structural mutators for per-entry milestone trees
//!
//! Every mutator follows validate → mutate → return. Validation runs against
//! fresh store reads, never a cached tree, and every multi-record write goes
//! through a single store transaction. Reparent and reorder are re-validated
//! by the store inside that transaction as well.

use crate::db::{DisplayOrderCalculator, DomainEvent, EventBus, RecordStore, ORDER_STEP};
use crate::models::{
    normalize_title, Completion, Milestone, MilestoneNode, MilestoneType, MilestoneUpdate,
    Progress,
};
use crate::services::aggregator;
use crate::services::error::ServiceError;
use crate::models::hierarchy::{parent_map, subtree_ids, would_create_cycle};
use crate::services::tree_loader::TreeLoader;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Input for [`MilestoneService::create`]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMilestone {
    pub entry_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: MilestoneType,
    #[serde(default)]
    pub target: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: Option<i64>,
}

impl CreateMilestone {
    pub fn checkbox(entry_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            parent_id: None,
            title: title.into(),
            kind: MilestoneType::Checkbox,
            target: None,
            description: None,
            display_order: None,
        }
    }

    pub fn counter(entry_id: impl Into<String>, title: impl Into<String>, target: i64) -> Self {
        Self {
            kind: MilestoneType::Counter,
            target: Some(target),
            ..Self::checkbox(entry_id, title)
        }
    }

    pub fn under(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

fn default_batch_kind() -> MilestoneType {
    MilestoneType::Checkbox
}

/// Input for [`MilestoneService::batch_create`]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateMilestones {
    pub entry_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub titles: Vec<String>,
    #[serde(rename = "type", default = "default_batch_kind")]
    pub kind: MilestoneType,
    #[serde(default)]
    pub target: Option<i64>,
}

/// Result of [`MilestoneService::increment`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressChange {
    pub milestone: Milestone,
    pub previous_current: i64,
}

/// A root of an entry forest with its rolled-up completion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootCompletion {
    pub node: MilestoneNode,
    pub completion: Completion,
}

#[derive(Clone)]
pub struct MilestoneService {
    store: Arc<dyn RecordStore>,
    loader: TreeLoader,
    events: EventBus,
}

impl MilestoneService {
    pub fn new(store: Arc<dyn RecordStore>, events: EventBus) -> Self {
        Self {
            loader: TreeLoader::new(store.clone()),
            store,
            events,
        }
    }

    async fn require_milestone(&self, id: &str) -> Result<Milestone, ServiceError> {
        self.store
            .get_milestone(id)
            .await?
            .ok_or_else(|| ServiceError::milestone_not_found(id))
    }

    async fn require_entry(&self, entry_id: &str) -> Result<(), ServiceError> {
        match self.store.get_entry(entry_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::entry_not_found(entry_id)),
        }
    }

    /// Parent must exist and belong to `entry_id`
    async fn require_parent_in_entry(
        &self,
        entry_id: &str,
        parent_id: &str,
    ) -> Result<Milestone, ServiceError> {
        match self.store.get_milestone(parent_id).await? {
            Some(parent) if parent.entry_id == entry_id => Ok(parent),
            _ => Err(ServiceError::invalid_parent(parent_id)),
        }
    }

    //
    // STRUCTURAL MUTATORS
    //

    /// Create a leaf milestone
    ///
    /// Counters need a positive target. The parent, when given, must belong
    /// to the same entry. Without an explicit `display_order` the node is
    /// appended after its last sibling. `current` always starts at 0.
    #[instrument(skip(self, input), fields(entry_id = %input.entry_id))]
    pub async fn create(&self, input: CreateMilestone) -> Result<Milestone, ServiceError> {
        let title = normalize_title(&input.title)?;
        let progress = Progress::build(input.kind, 0, input.target)?;
        self.require_entry(&input.entry_id).await?;
        if let Some(parent_id) = input.parent_id.as_deref() {
            self.require_parent_in_entry(&input.entry_id, parent_id).await?;
        }

        let display_order = match input.display_order {
            Some(order) => order,
            None => DisplayOrderCalculator::next_order(
                self.store
                    .max_sibling_order(&input.entry_id, input.parent_id.as_deref())
                    .await?,
            ),
        };

        let milestone = Milestone::new(input.entry_id, input.parent_id, title, progress, display_order)
            .with_description(input.description);
        let created = self.store.create_milestone(milestone).await?;

        info!(milestone_id = %created.id, "created milestone");
        self.events.emit(DomainEvent::MilestoneCreated {
            milestone: created.clone(),
        });
        Ok(created)
    }

    /// Apply a partial update, keeping type, target and current consistent
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: MilestoneUpdate) -> Result<Milestone, ServiceError> {
        let mut milestone = self.require_milestone(id).await?;
        if update.is_empty() {
            return Ok(milestone);
        }

        let progress = update.resolve_progress(&milestone.progress)?;
        let set_display_order = update.display_order.is_some();
        if let Some(title) = update.title.as_deref() {
            milestone.title = normalize_title(title)?;
        }
        if let Some(description) = update.description {
            milestone.description = description;
        }
        if let Some(display_order) = update.display_order {
            milestone.display_order = display_order;
        }
        milestone.progress = progress;
        milestone.modified_at = Utc::now();

        let updated = self.store.update_milestone(milestone, set_display_order).await?;
        info!(milestone_id = %updated.id, "updated milestone");
        self.events.emit(DomainEvent::MilestoneUpdated {
            milestone: updated.clone(),
        });
        Ok(updated)
    }

    /// Delete a milestone together with its whole subtree
    ///
    /// Returns the removed ids in pre-order, starting with `id`.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<Vec<String>, ServiceError> {
        let milestone = self.require_milestone(id).await?;
        let records = self.store.list_milestones(&milestone.entry_id).await?;
        let ids = subtree_ids(&records, id);

        self.store.delete_milestones(&ids).await?;

        info!(milestone_id = id, removed = ids.len(), "deleted milestone subtree");
        self.events.emit(DomainEvent::MilestonesDeleted {
            entry_id: milestone.entry_id,
            ids: ids.clone(),
        });
        Ok(ids)
    }

    /// Move a milestone under a new parent (or to the root level)
    ///
    /// Rejects a parent from another entry and any move that would make the
    /// milestone its own ancestor. The moved node lands after its new last
    /// sibling.
    #[instrument(skip(self))]
    pub async fn reparent(
        &self,
        id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<Milestone, ServiceError> {
        let milestone = self.require_milestone(id).await?;

        if let Some(parent_id) = new_parent_id {
            self.require_parent_in_entry(&milestone.entry_id, parent_id)
                .await?;
            let records = self.store.list_milestones(&milestone.entry_id).await?;
            if would_create_cycle(&parent_map(&records), id, parent_id) {
                return Err(ServiceError::invalid_hierarchy(format!(
                    "Cannot move {} under {}: would create a cycle",
                    id, parent_id
                )));
            }
        }

        let moved = self.store.move_milestone(id, new_parent_id).await?;
        info!(milestone_id = id, parent_id = ?new_parent_id, "reparented milestone");
        self.events.emit(DomainEvent::MilestoneUpdated {
            milestone: moved.clone(),
        });
        Ok(moved)
    }

    /// Assign sequential orders (0, 10, 20, ...) to the children of `parent_id`
    ///
    /// `ordered_ids` must be exactly the current children: no strangers, no
    /// duplicates, nothing missing.
    #[instrument(skip(self, ordered_ids), fields(count = ordered_ids.len()))]
    pub async fn reorder(
        &self,
        entry_id: &str,
        parent_id: Option<&str>,
        ordered_ids: &[String],
    ) -> Result<Vec<(String, i64)>, ServiceError> {
        let records = self.store.list_milestones(entry_id).await?;
        let by_id: HashMap<&str, &Milestone> = records.iter().map(|m| (m.id.as_str(), m)).collect();

        let mut seen = HashSet::new();
        for id in ordered_ids {
            let Some(record) = by_id.get(id.as_str()) else {
                return Err(ServiceError::invalid_hierarchy(format!(
                    "Milestone {} is not part of entry {}",
                    id, entry_id
                )));
            };
            if record.parent_id.as_deref() != parent_id {
                return Err(ServiceError::invalid_hierarchy(
                    "All milestones must share the same parent",
                ));
            }
            if !seen.insert(id.as_str()) {
                return Err(ServiceError::invalid_hierarchy(format!(
                    "Milestone {} listed more than once",
                    id
                )));
            }
        }

        let sibling_count = records
            .iter()
            .filter(|m| m.parent_id.as_deref() == parent_id)
            .count();
        if sibling_count != ordered_ids.len() {
            return Err(ServiceError::invalid_hierarchy(format!(
                "orderedIds must include all {} siblings (got {})",
                sibling_count,
                ordered_ids.len()
            )));
        }

        let updates = self
            .store
            .reorder_milestones(entry_id, parent_id, ordered_ids)
            .await?;

        info!(entry_id, count = updates.len(), "reordered milestones");
        self.events.emit(DomainEvent::MilestonesReordered {
            entry_id: entry_id.to_string(),
            parent_id: parent_id.map(str::to_string),
            ordered_ids: ordered_ids.to_vec(),
        });
        Ok(updates)
    }

    /// Deep-copy a milestone and its descendants under `new_parent_id`
    ///
    /// Copies get fresh ids and `current = 0`; title, type, target and
    /// description are preserved. The top copy is appended after the last
    /// sibling under the new parent; each copied level below restarts at 0
    /// in steps of 10. Returns the copies in pre-order, top copy first.
    #[instrument(skip(self))]
    pub async fn duplicate_subtree(
        &self,
        id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<Vec<Milestone>, ServiceError> {
        let source = self.require_milestone(id).await?;
        let entry_id = source.entry_id.clone();
        let records = self.store.list_milestones(&entry_id).await?;

        if let Some(parent_id) = new_parent_id {
            if !records.iter().any(|m| m.id == parent_id) {
                return Err(ServiceError::invalid_parent(parent_id));
            }
        }

        let source_ids = subtree_ids(&records, id);
        if let Some(parent_id) = new_parent_id {
            if source_ids.iter().any(|sid| sid == parent_id) {
                return Err(ServiceError::invalid_hierarchy(
                    "Cannot duplicate under descendant",
                ));
            }
        }

        let by_id: HashMap<&str, &Milestone> = records.iter().map(|m| (m.id.as_str(), m)).collect();
        let top_order = DisplayOrderCalculator::next_order(
            self.store.max_sibling_order(&entry_id, new_parent_id).await?,
        );

        let mut new_ids: HashMap<&str, String> = HashMap::new();
        let mut next_child_order: HashMap<String, i64> = HashMap::new();
        let mut copies = Vec::with_capacity(source_ids.len());

        for old_id in &source_ids {
            let Some(original) = by_id.get(old_id.as_str()) else {
                continue;
            };

            let (parent_id, display_order) = if old_id == id {
                (new_parent_id.map(str::to_string), top_order)
            } else {
                let old_parent = original.parent_id.as_deref().unwrap_or_default();
                let Some(new_parent) = new_ids.get(old_parent).cloned() else {
                    continue;
                };
                let slot = next_child_order.entry(new_parent.clone()).or_insert(0);
                let order = *slot;
                *slot += ORDER_STEP;
                (Some(new_parent), order)
            };

            let copy = Milestone::new(
                entry_id.clone(),
                parent_id,
                original.title.clone(),
                original.progress.reset(),
                display_order,
            )
            .with_description(original.description.clone());

            new_ids.insert(old_id.as_str(), copy.id.clone());
            copies.push(copy);
        }

        let created = self.store.create_milestones(copies).await?;

        info!(source_id = id, copies = created.len(), "duplicated milestone subtree");
        for milestone in &created {
            self.events.emit(DomainEvent::MilestoneCreated {
                milestone: milestone.clone(),
            });
        }
        Ok(created)
    }

    /// Create one leaf per non-blank title, appended in order after the last
    /// sibling
    ///
    /// Titles are trimmed. An input without any non-blank title is a no-op.
    #[instrument(skip(self, input), fields(entry_id = %input.entry_id, titles = input.titles.len()))]
    pub async fn batch_create(
        &self,
        input: BatchCreateMilestones,
    ) -> Result<Vec<Milestone>, ServiceError> {
        let titles: Vec<String> = input
            .titles
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if titles.is_empty() {
            return Ok(Vec::new());
        }

        let progress = Progress::build(input.kind, 0, input.target)?;
        self.require_entry(&input.entry_id).await?;
        if let Some(parent_id) = input.parent_id.as_deref() {
            self.require_parent_in_entry(&input.entry_id, parent_id)
                .await?;
        }

        let existing_max = self
            .store
            .max_sibling_order(&input.entry_id, input.parent_id.as_deref())
            .await?;
        let orders = DisplayOrderCalculator::append_run(existing_max, titles.len());

        let milestones: Vec<Milestone> = titles
            .into_iter()
            .zip(orders)
            .map(|(title, order)| {
                Milestone::new(
                    input.entry_id.clone(),
                    input.parent_id.clone(),
                    title,
                    progress,
                    order,
                )
            })
            .collect();

        let created = self.store.create_milestones(milestones).await?;
        info!(count = created.len(), "batch created milestones");
        for milestone in &created {
            self.events.emit(DomainEvent::MilestoneCreated {
                milestone: milestone.clone(),
            });
        }
        Ok(created)
    }

    //
    // PROGRESS
    //

    /// Toggle a checkbox, or add `delta` to a counter (clamped)
    #[instrument(skip(self))]
    pub async fn increment(&self, id: &str, delta: i64) -> Result<ProgressChange, ServiceError> {
        let mut milestone = self.require_milestone(id).await?;
        let previous_current = milestone.progress.current();

        milestone.progress = milestone.progress.incremented(delta);
        milestone.modified_at = Utc::now();
        let milestone = self.store.update_milestone(milestone, false).await?;

        debug!(milestone_id = id, previous_current, current = milestone.progress.current(), "incremented");
        self.events.emit(DomainEvent::MilestoneUpdated {
            milestone: milestone.clone(),
        });
        Ok(ProgressChange {
            milestone,
            previous_current,
        })
    }

    /// Set `current` directly, clamped for the milestone type
    #[instrument(skip(self))]
    pub async fn set_current(&self, id: &str, value: i64) -> Result<Milestone, ServiceError> {
        let mut milestone = self.require_milestone(id).await?;
        milestone.progress = milestone.progress.with_current(value);
        milestone.modified_at = Utc::now();
        let milestone = self.store.update_milestone(milestone, false).await?;

        self.events.emit(DomainEvent::MilestoneUpdated {
            milestone: milestone.clone(),
        });
        Ok(milestone)
    }

    //
    // VIEWS
    //

    /// Forest of an entry with the completion of each root
    pub async fn tree(&self, entry_id: &str) -> Result<Vec<RootCompletion>, ServiceError> {
        let forest = self.tree_admin(entry_id).await?;
        Ok(forest
            .into_iter()
            .map(|node| RootCompletion {
                completion: aggregator::compute(&node),
                node,
            })
            .collect())
    }

    /// Full forest of an entry, every stored field included
    pub async fn tree_admin(&self, entry_id: &str) -> Result<Vec<MilestoneNode>, ServiceError> {
        self.require_entry(entry_id).await?;
        Ok(self.loader.load(entry_id).await?)
    }
}
