//! Completionist Core
//!
//! Progress tracking for franchises of games, books and films. Each entry
//! owns a forest of milestones (checkboxes and counters) whose completion
//! rolls up from leaves to groups, entries and franchises.
//!
//! # Architecture
//!
//! - **Fresh reads**: trees are rebuilt from the store on every query, never cached
//! - **Pure rollup**: the aggregator is a side-effect-free function of a tree
//! - **Atomic mutators**: multi-record writes run in one libsql transaction
//! - **Events**: every successful mutation is broadcast as a `DomainEvent`
//!
//! # Modules
//!
//! - [`models`] - Milestones, entries, franchises and completion shapes
//! - [`db`] - libsql persistence behind the `RecordStore` trait
//! - [`services`] - Tree loading, aggregation and structural mutators
//! - [`procedures`] - Named JSON operations and the stdio runner
//! - [`config`] / [`logging`] - Runtime configuration and tracing setup

pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod procedures;
pub mod services;

// Re-export commonly used types
pub use config::CoreConfig;
pub use models::*;
pub use services::*;
