//! Domain Events
//!
//! Services publish a [`DomainEvent`] on a tokio broadcast channel after every
//! successful mutation. Subscribers use [`DomainEvent::scope`] to decide which
//! aggregates to refresh through the completion facade's `recompute`.

use crate::models::{Entry, Franchise, Milestone, UserPreferences};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Subscriber buffer per channel
pub const DOMAIN_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Entry/franchise affected by an event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventScope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub franchise_id: Option<String>,
}

/// Domain-level change notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainEvent {
    MilestoneCreated { milestone: Milestone },
    MilestoneUpdated { milestone: Milestone },
    #[serde(rename_all = "camelCase")]
    MilestonesDeleted { entry_id: String, ids: Vec<String> },
    #[serde(rename_all = "camelCase")]
    MilestonesReordered {
        entry_id: String,
        parent_id: Option<String>,
        ordered_ids: Vec<String>,
    },
    EntryCreated { entry: Entry },
    EntryUpdated { entry: Entry },
    #[serde(rename_all = "camelCase")]
    EntriesDeleted {
        franchise_id: String,
        ids: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    EntriesReordered {
        franchise_id: String,
        ordered_ids: Vec<String>,
    },
    FranchiseCreated { franchise: Franchise },
    FranchiseUpdated { franchise: Franchise },
    FranchiseDeleted { id: String },
    PreferencesChanged { preferences: UserPreferences },
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::MilestoneCreated { .. } => "milestone:created",
            DomainEvent::MilestoneUpdated { .. } => "milestone:updated",
            DomainEvent::MilestonesDeleted { .. } => "milestone:deleted",
            DomainEvent::MilestonesReordered { .. } => "milestone:reordered",
            DomainEvent::EntryCreated { .. } => "entry:created",
            DomainEvent::EntryUpdated { .. } => "entry:updated",
            DomainEvent::EntriesDeleted { .. } => "entry:deleted",
            DomainEvent::EntriesReordered { .. } => "entry:reordered",
            DomainEvent::FranchiseCreated { .. } => "franchise:created",
            DomainEvent::FranchiseUpdated { .. } => "franchise:updated",
            DomainEvent::FranchiseDeleted { .. } => "franchise:deleted",
            DomainEvent::PreferencesChanged { .. } => "preferences:changed",
        }
    }

    /// Aggregates whose completion may have changed
    pub fn scope(&self) -> EventScope {
        match self {
            DomainEvent::MilestoneCreated { milestone }
            | DomainEvent::MilestoneUpdated { milestone } => EventScope {
                entry_id: Some(milestone.entry_id.clone()),
                franchise_id: None,
            },
            DomainEvent::MilestonesDeleted { entry_id, .. }
            | DomainEvent::MilestonesReordered { entry_id, .. } => EventScope {
                entry_id: Some(entry_id.clone()),
                franchise_id: None,
            },
            DomainEvent::EntryCreated { entry } | DomainEvent::EntryUpdated { entry } => {
                EventScope {
                    entry_id: Some(entry.id.clone()),
                    franchise_id: Some(entry.franchise_id.clone()),
                }
            }
            DomainEvent::EntriesDeleted { franchise_id, .. }
            | DomainEvent::EntriesReordered { franchise_id, .. } => EventScope {
                entry_id: None,
                franchise_id: Some(franchise_id.clone()),
            },
            DomainEvent::FranchiseCreated { franchise }
            | DomainEvent::FranchiseUpdated { franchise } => EventScope {
                entry_id: None,
                franchise_id: Some(franchise.id.clone()),
            },
            DomainEvent::FranchiseDeleted { id } => EventScope {
                entry_id: None,
                franchise_id: Some(id.clone()),
            },
            DomainEvent::PreferencesChanged { .. } => EventScope::default(),
        }
    }
}

/// Shared sender handed to every service
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(DOMAIN_EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }

    /// Publish an event; having no subscribers is not an error
    pub fn emit(&self, event: DomainEvent) {
        tracing::trace!(event_type = event.event_type(), "domain event");
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_contract() {
        let event = DomainEvent::MilestonesDeleted {
            entry_id: "entry-1".to_string(),
            ids: vec!["m-1".to_string(), "m-2".to_string()],
        };

        let parsed = serde_json::to_value(&event).unwrap();

        assert_eq!(parsed.get("type").unwrap(), "milestonesDeleted");
        assert_eq!(parsed.get("entryId").unwrap(), "entry-1");
        assert_eq!(parsed.get("ids").unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_scope_for_entry_events() {
        let event = DomainEvent::EntriesDeleted {
            franchise_id: "f-1".to_string(),
            ids: vec!["e-1".to_string()],
        };
        assert_eq!(
            event.scope(),
            EventScope {
                entry_id: None,
                franchise_id: Some("f-1".to_string())
            }
        );
        assert_eq!(event.event_type(), "entry:deleted");
    }

    #[tokio::test]
    async fn test_bus_delivers_to_subscribers() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(DomainEvent::FranchiseDeleted {
            id: "f-9".to_string(),
        });

        let received = rx.recv().await.unwrap();
        assert_eq!(
            received,
            DomainEvent::FranchiseDeleted {
                id: "f-9".to_string()
            }
        );
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let bus = EventBus::default();
        bus.emit(DomainEvent::PreferencesChanged {
            preferences: UserPreferences::default(),
        });
    }
}
