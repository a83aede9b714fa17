//! Business Services
//!
//! This module contains the tracker's business logic:
//!
//! - `tree_loader` / `aggregator` - rebuild entry forests and roll up progress
//! - `MilestoneService` - structural mutators, progress updates and tree views
//! - `EntryService` / `FranchiseService` - the collections owning the trees
//! - `CompletionService` - read-only completion queries
//! - `PreferencesService` - the single user preferences row
//!
//! Services validate against fresh store reads, delegate multi-record writes
//! to a single store transaction, and announce every successful mutation on
//! the shared [`EventBus`].

pub mod aggregator;
pub mod completion_service;
pub mod entry_service;
pub mod error;
pub mod franchise_service;
pub mod milestone_service;
pub mod preferences_service;
pub mod tree_loader;

pub use completion_service::CompletionService;
pub use entry_service::{
    BulkDeleteResult, CreateEntry, EntryAdminRow, EntryService, EntryWithCompletion,
};
pub use error::{ErrorCategory, ServiceError};
pub use franchise_service::{FranchiseAdminRow, FranchiseService, FranchiseWithCompletion};
pub use milestone_service::{
    BatchCreateMilestones, CreateMilestone, MilestoneService, ProgressChange, RootCompletion,
};
pub use preferences_service::PreferencesService;
pub use tree_loader::{build_forest, TreeLoader};

use crate::db::{DomainEvent, EventBus, RecordStore};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Every service built over one store and one event bus
#[derive(Clone)]
pub struct CoreServices {
    pub milestones: MilestoneService,
    pub entries: EntryService,
    pub franchises: FranchiseService,
    pub completion: CompletionService,
    pub preferences: PreferencesService,
    events: EventBus,
}

impl CoreServices {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let events = EventBus::new();
        Self {
            milestones: MilestoneService::new(store.clone(), events.clone()),
            entries: EntryService::new(store.clone(), events.clone()),
            franchises: FranchiseService::new(store.clone(), events.clone()),
            completion: CompletionService::new(store.clone()),
            preferences: PreferencesService::new(store, events.clone()),
            events,
        }
    }

    /// Receive every domain event emitted by any of the services
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }
}
