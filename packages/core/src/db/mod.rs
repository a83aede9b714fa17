//! Database Layer
//!
//! This module handles all persistence using libsql:
//!
//! - Database initialization and connection management
//! - The [`RecordStore`] abstraction used by every service
//! - Transactional multi-record writes with in-transaction re-validation
//! - Integer display ordering and domain event broadcasting
//!
//! # Architecture
//!
//! Services never touch SQL directly. They depend on `Arc<dyn RecordStore>`,
//! and [`TursoStore`] implements it over a local libsql file.

pub mod database;
pub mod display_ordering;
mod error;
pub mod events;
mod record_store;
mod turso_store;

pub use database::{DatabaseService, DEFAULT_BUSY_TIMEOUT_MS};
pub use display_ordering::{DisplayOrderCalculator, ORDER_STEP};
pub use error::{DatabaseError, HierarchyConflict};
pub use events::{DomainEvent, EventBus, EventScope, DOMAIN_EVENT_CHANNEL_CAPACITY};
pub use record_store::RecordStore;
pub use turso_store::TursoStore;
