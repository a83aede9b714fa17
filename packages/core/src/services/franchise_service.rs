//! Franchise Service

use crate::db::{DomainEvent, EventBus, RecordStore};
use crate::models::{normalize_accent, normalize_name, Franchise, FranchiseUpdate};
use crate::services::completion_service::CompletionService;
use crate::services::error::ServiceError;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FranchiseWithCompletion {
    #[serde(flatten)]
    pub franchise: Franchise,
    pub completion_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FranchiseAdminRow {
    #[serde(flatten)]
    pub franchise: Franchise,
    pub entry_count: usize,
    pub milestone_count: usize,
}

#[derive(Clone)]
pub struct FranchiseService {
    store: Arc<dyn RecordStore>,
    completion: CompletionService,
    events: EventBus,
}

impl FranchiseService {
    pub fn new(store: Arc<dyn RecordStore>, events: EventBus) -> Self {
        Self {
            completion: CompletionService::new(store.clone()),
            store,
            events,
        }
    }

    async fn require_franchise(&self, id: &str) -> Result<Franchise, ServiceError> {
        self.store
            .get_franchise(id)
            .await?
            .ok_or_else(|| ServiceError::franchise_not_found(id))
    }

    #[instrument(skip(self))]
    pub async fn create(&self, name: &str, accent: &str) -> Result<Franchise, ServiceError> {
        let franchise = Franchise::new(name, accent)?;
        let created = self.store.create_franchise(franchise).await?;

        info!(franchise_id = %created.id, name = %created.name, "created franchise");
        self.events.emit(DomainEvent::FranchiseCreated {
            franchise: created.clone(),
        });
        Ok(created)
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: FranchiseUpdate) -> Result<Franchise, ServiceError> {
        let mut franchise = self.require_franchise(id).await?;
        if update.name.is_none() && update.accent.is_none() {
            return Ok(franchise);
        }

        if let Some(name) = update.name.as_deref() {
            franchise.name = normalize_name(name)?;
        }
        if let Some(accent) = update.accent.as_deref() {
            franchise.accent = normalize_accent(accent)?;
        }
        franchise.modified_at = Utc::now();

        let updated = self.store.update_franchise(franchise).await?;
        info!(franchise_id = id, "updated franchise");
        self.events.emit(DomainEvent::FranchiseUpdated {
            franchise: updated.clone(),
        });
        Ok(updated)
    }

    /// Delete an empty franchise
    ///
    /// A franchise that still has entries is a conflict; entries are never
    /// removed implicitly.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.require_franchise(id).await?;
        let count = self.store.count_entries(id).await?;
        if count > 0 {
            return Err(ServiceError::FranchiseHasEntries { count });
        }

        if !self.store.delete_franchise(id).await? {
            return Err(ServiceError::franchise_not_found(id));
        }
        info!(franchise_id = id, "deleted franchise");
        self.events.emit(DomainEvent::FranchiseDeleted { id: id.to_string() });
        Ok(())
    }

    /// Franchises by name, each with its completion percent
    pub async fn list(
        &self,
        include_optional_entries: bool,
    ) -> Result<Vec<FranchiseWithCompletion>, ServiceError> {
        let franchises = self.store.list_franchises().await?;
        debug!(count = franchises.len(), "listing franchises");

        let mut rows = Vec::with_capacity(franchises.len());
        for franchise in franchises {
            let entries = self.store.list_entries(&franchise.id).await?;
            let (_, rollup) = self
                .completion
                .rollup_entries(&franchise.id, &entries, include_optional_entries, None)
                .await?;
            rows.push(FranchiseWithCompletion {
                franchise,
                completion_percent: rollup.percent,
            });
        }
        Ok(rows)
    }

    /// Franchises by name with entry and milestone counts
    ///
    /// `search` filters by case-insensitive substring of the name.
    pub async fn list_admin(&self, search: Option<&str>) -> Result<Vec<FranchiseAdminRow>, ServiceError> {
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut rows = Vec::new();
        for franchise in self.store.list_franchises().await? {
            if let Some(needle) = needle.as_deref() {
                if !franchise.name.to_lowercase().contains(needle) {
                    continue;
                }
            }
            let entries = self.store.list_entries(&franchise.id).await?;
            let mut milestone_count = 0;
            for entry in &entries {
                milestone_count += self.store.count_milestones(&entry.id).await?;
            }
            rows.push(FranchiseAdminRow {
                entry_count: entries.len(),
                milestone_count,
                franchise,
            });
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseService, TursoStore};
    use crate::models::{Entry, MediaType, Milestone, Progress};
    use crate::services::error::ErrorCategory;
    use tempfile::TempDir;

    async fn create_test_service() -> (FranchiseService, Arc<dyn RecordStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let store: Arc<dyn RecordStore> = Arc::new(TursoStore::new(Arc::new(db)));
        (
            FranchiseService::new(store.clone(), EventBus::new()),
            store,
            temp_dir,
        )
    }

    #[tokio::test]
    async fn test_create_trims_and_validates() {
        let (service, _store, _temp_dir) = create_test_service().await;

        let created = service.create("  Halo ", " #10b981 ").await.unwrap();
        assert_eq!(created.name, "Halo");
        assert_eq!(created.accent, "#10b981");

        let err = service.create(" ", "#fff").await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
        let err = service.create("Halo", "").await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[tokio::test]
    async fn test_update_partial() {
        let (service, _store, _temp_dir) = create_test_service().await;
        let created = service.create("Fable", "#111").await.unwrap();

        let updated = service
            .update(
                &created.id,
                FranchiseUpdate {
                    name: None,
                    accent: Some("#222".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Fable");
        assert_eq!(updated.accent, "#222");

        let err = service
            .update("ghost", FranchiseUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[tokio::test]
    async fn test_delete_with_entries_conflicts() {
        let (service, store, _temp_dir) = create_test_service().await;
        let franchise = service.create("Mass Effect", "#0ea5e9").await.unwrap();
        store
            .create_entry(Entry::new(&franchise.id, "ME1", MediaType::Game, false, 10), None)
            .await
            .unwrap();

        let err = service.delete(&franchise.id).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert!(err.to_string().contains("1 entries"));
        assert!(store.get_franchise(&franchise.id).await.unwrap().is_some());

        let empty = service.create("Empty", "#fff").await.unwrap();
        service.delete(&empty.id).await.unwrap();
        assert_eq!(
            service.delete(&empty.id).await.unwrap_err().category(),
            ErrorCategory::NotFound
        );
    }

    #[tokio::test]
    async fn test_list_and_list_admin() {
        let (service, store, _temp_dir) = create_test_service().await;
        let zelda = service.create("Zelda", "#22c55e").await.unwrap();
        service.create("Animal Crossing", "#84cc16").await.unwrap();

        let entry = store
            .create_entry(Entry::new(&zelda.id, "BotW", MediaType::Game, false, 10), None)
            .await
            .unwrap();
        store
            .create_milestone(Milestone::new(
                &entry.id,
                None,
                "Shrines",
                Progress::Counter { current: 60, target: 120 },
                10,
            ))
            .await
            .unwrap();

        let listed = service.list(true).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|r| r.franchise.name.as_str()).collect();
        assert_eq!(names, vec!["Animal Crossing", "Zelda"]);
        assert_eq!(listed[1].completion_percent, 50.0);
        assert_eq!(listed[0].completion_percent, 0.0);

        let admin = service.list_admin(Some("ELD")).await.unwrap();
        assert_eq!(admin.len(), 1);
        assert_eq!(admin[0].entry_count, 1);
        assert_eq!(admin[0].milestone_count, 1);

        assert_eq!(service.list_admin(None).await.unwrap().len(), 2);
    }
}
