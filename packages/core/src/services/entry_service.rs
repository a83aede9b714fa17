//! Entry Service
//!
//! Entries own one milestone forest each. Creating a BOOK or MOVIE entry can
//! seed a single root checkbox in the same transaction; deleting an entry
//! removes its whole forest with it.

use crate::db::{DisplayOrderCalculator, DomainEvent, EventBus, RecordStore, ORDER_STEP};
use crate::models::{
    normalize_title, Entry, EntryCompletion, EntryUpdate, MediaType, Milestone, Progress,
};
use crate::services::completion_service::CompletionService;
use crate::services::error::ServiceError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

fn default_true() -> bool {
    true
}

/// Input for [`EntryService::create`]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntry {
    pub franchise_id: String,
    pub title: String,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default = "default_true")]
    pub auto_seed_checkbox: bool,
}

impl CreateEntry {
    pub fn new(franchise_id: impl Into<String>, title: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            franchise_id: franchise_id.into(),
            title: title.into(),
            media_type,
            is_optional: false,
            auto_seed_checkbox: true,
        }
    }
}

/// Entry row with its rollup
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryWithCompletion {
    #[serde(flatten)]
    pub entry: Entry,
    pub completion: EntryCompletion,
}

/// Entry row for editing views
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryAdminRow {
    #[serde(flatten)]
    pub entry: Entry,
    pub completion: EntryCompletion,
    pub milestone_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResult {
    pub deleted_entry_ids: Vec<String>,
    pub milestone_count: u64,
}

#[derive(Clone)]
pub struct EntryService {
    store: Arc<dyn RecordStore>,
    completion: CompletionService,
    events: EventBus,
}

impl EntryService {
    pub fn new(store: Arc<dyn RecordStore>, events: EventBus) -> Self {
        Self {
            completion: CompletionService::new(store.clone()),
            store,
            events,
        }
    }

    async fn require_entry(&self, id: &str) -> Result<Entry, ServiceError> {
        self.store
            .get_entry(id)
            .await?
            .ok_or_else(|| ServiceError::entry_not_found(id))
    }

    async fn require_franchise(&self, id: &str) -> Result<(), ServiceError> {
        match self.store.get_franchise(id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::franchise_not_found(id)),
        }
    }

    #[instrument(skip(self, input), fields(franchise_id = %input.franchise_id))]
    pub async fn create(&self, input: CreateEntry) -> Result<Entry, ServiceError> {
        let title = normalize_title(&input.title)?;
        self.require_franchise(&input.franchise_id).await?;

        let display_order =
            DisplayOrderCalculator::next_order(self.store.max_entry_order(&input.franchise_id).await?);
        let entry = Entry::new(
            input.franchise_id,
            title,
            input.media_type,
            input.is_optional,
            display_order,
        );

        let seed = input
            .media_type
            .seed_checkbox_title()
            .filter(|_| input.auto_seed_checkbox)
            .map(|seed_title| {
                Milestone::new(&entry.id, None, seed_title, Progress::checkbox(), ORDER_STEP)
            });
        let seed_event = seed.clone();

        let created = self.store.create_entry(entry, seed).await?;
        info!(entry_id = %created.id, media_type = %created.media_type, "created entry");

        self.events.emit(DomainEvent::EntryCreated {
            entry: created.clone(),
        });
        if let Some(milestone) = seed_event {
            self.events.emit(DomainEvent::MilestoneCreated { milestone });
        }
        Ok(created)
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: EntryUpdate) -> Result<Entry, ServiceError> {
        let mut entry = self.require_entry(id).await?;
        if update.is_empty() {
            return Ok(entry);
        }

        if let Some(title) = update.title.as_deref() {
            entry.title = normalize_title(title)?;
        }
        if let Some(media_type) = update.media_type {
            entry.media_type = media_type;
        }
        if let Some(is_optional) = update.is_optional {
            entry.is_optional = is_optional;
        }
        entry.modified_at = Utc::now();

        let updated = self.store.update_entry(entry).await?;
        info!(entry_id = id, "updated entry");
        self.events.emit(DomainEvent::EntryUpdated {
            entry: updated.clone(),
        });
        Ok(updated)
    }

    /// Delete an entry and all of its milestones
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<BulkDeleteResult, ServiceError> {
        let entry = self.require_entry(id).await?;
        let ids = vec![entry.id];
        let milestone_count = self.store.delete_entries(&ids).await?;

        info!(entry_id = id, milestone_count, "deleted entry");
        self.events.emit(DomainEvent::EntriesDeleted {
            franchise_id: entry.franchise_id,
            ids: ids.clone(),
        });
        Ok(BulkDeleteResult {
            deleted_entry_ids: ids,
            milestone_count,
        })
    }

    /// Delete several entries of one franchise in a single transaction
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn bulk_delete(&self, ids: &[String]) -> Result<BulkDeleteResult, ServiceError> {
        if ids.is_empty() {
            return Err(ServiceError::invalid_hierarchy(
                "bulk delete needs at least one entry id",
            ));
        }

        let mut unique = Vec::with_capacity(ids.len());
        let mut seen = HashSet::new();
        let mut franchise_id: Option<String> = None;
        for id in ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            let entry = self.require_entry(id).await?;
            if let Some(existing) = franchise_id.as_deref() {
                if existing != entry.franchise_id {
                    return Err(ServiceError::invalid_hierarchy("cross-franchise bulk delete"));
                }
            } else {
                franchise_id = Some(entry.franchise_id);
            }
            unique.push(id.clone());
        }

        let milestone_count = self.store.delete_entries(&unique).await?;
        info!(count = unique.len(), milestone_count, "bulk deleted entries");

        if let Some(franchise_id) = franchise_id {
            self.events.emit(DomainEvent::EntriesDeleted {
                franchise_id,
                ids: unique.clone(),
            });
        }
        Ok(BulkDeleteResult {
            deleted_entry_ids: unique,
            milestone_count,
        })
    }

    /// Rewrite entry orders; `ordered_ids` must be exactly the franchise's
    /// entries
    #[instrument(skip(self, ordered_ids), fields(count = ordered_ids.len()))]
    pub async fn reorder(
        &self,
        franchise_id: &str,
        ordered_ids: &[String],
    ) -> Result<Vec<(String, i64)>, ServiceError> {
        self.require_franchise(franchise_id).await?;
        let updates = self.store.reorder_entries(franchise_id, ordered_ids).await?;

        info!(franchise_id, "reordered entries");
        self.events.emit(DomainEvent::EntriesReordered {
            franchise_id: franchise_id.to_string(),
            ordered_ids: ordered_ids.to_vec(),
        });
        Ok(updates)
    }

    /// Entries in display order, each with its completion
    ///
    /// Optional entries are left out when `include_optional_entries` is off.
    pub async fn list_by_franchise(
        &self,
        franchise_id: &str,
        include_optional_entries: bool,
    ) -> Result<Vec<EntryWithCompletion>, ServiceError> {
        self.require_franchise(franchise_id).await?;
        let entries = self.store.list_entries(franchise_id).await?;
        debug!(franchise_id, count = entries.len(), "listing entries");

        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.is_optional && !include_optional_entries {
                continue;
            }
            let completion = self.completion.completion_of(&entry).await?;
            rows.push(EntryWithCompletion { entry, completion });
        }
        Ok(rows)
    }

    /// Every entry of a franchise with completion and milestone count
    pub async fn list_by_franchise_admin(
        &self,
        franchise_id: &str,
    ) -> Result<Vec<EntryAdminRow>, ServiceError> {
        self.require_franchise(franchise_id).await?;
        let entries = self.store.list_entries(franchise_id).await?;

        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            let completion = self.completion.completion_of(&entry).await?;
            let milestone_count = self.store.count_milestones(&entry.id).await?;
            rows.push(EntryAdminRow {
                entry,
                completion,
                milestone_count,
            });
        }
        Ok(rows)
    }
}
