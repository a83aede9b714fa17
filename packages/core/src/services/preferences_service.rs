//! Preferences Service - the single user preferences row

use crate::db::{DomainEvent, EventBus, RecordStore};
use crate::models::UserPreferences;
use crate::services::error::ServiceError;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct PreferencesService {
    store: Arc<dyn RecordStore>,
    events: EventBus,
}

impl PreferencesService {
    pub fn new(store: Arc<dyn RecordStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Current preferences, persisting the defaults on first read
    pub async fn get(&self) -> Result<UserPreferences, ServiceError> {
        if let Some(preferences) = self.store.get_preferences().await? {
            return Ok(preferences);
        }
        Ok(self.store.save_preferences(UserPreferences::default()).await?)
    }

    #[instrument(skip(self))]
    pub async fn set(&self, include_optional_entries: bool) -> Result<UserPreferences, ServiceError> {
        self.save(UserPreferences {
            include_optional_entries,
        })
        .await
    }

    /// Flip `include_optional_entries`; a missing row flips the default
    #[instrument(skip(self))]
    pub async fn toggle_optional_entries(&self) -> Result<UserPreferences, ServiceError> {
        let current = self
            .store
            .get_preferences()
            .await?
            .unwrap_or_default();
        self.save(UserPreferences {
            include_optional_entries: !current.include_optional_entries,
        })
        .await
    }

    async fn save(&self, preferences: UserPreferences) -> Result<UserPreferences, ServiceError> {
        let saved = self.store.save_preferences(preferences).await?;
        info!(include_optional_entries = saved.include_optional_entries, "saved preferences");
        self.events.emit(DomainEvent::PreferencesChanged { preferences: saved });
        Ok(saved)
    }
}
