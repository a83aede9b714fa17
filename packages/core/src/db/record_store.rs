//! RecordStore Trait - Persistence Abstraction
//!
//! Services talk to persistence exclusively through [`RecordStore`]: ID-keyed
//! CRUD for franchises, entries and milestones, filtering by owner, max-order
//! lookups, and the multi-record writes that must be atomic.
//!
//! # Atomicity
//!
//! Every method documented as transactional either applies all of its writes
//! or none. `move_milestone` and `reorder_milestones` re-validate hierarchy
//! state against rows read inside their own transaction and fail with a
//! [`HierarchyConflict`](crate::db::HierarchyConflict) (wrapped in the
//! `anyhow::Error`) if validation no longer holds. They are also the only
//! writers of `milestones.parent_id`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use completionist_core::db::{DatabaseService, RecordStore, TursoStore};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/completionist.db")).await?);
//!     let store: Arc<dyn RecordStore> = Arc::new(TursoStore::new(db));
//!
//!     let milestones = store.list_milestones("entry-123").await?;
//!     println!("{} milestones", milestones.len());
//!     Ok(())
//! }
//! ```

use crate::models::{Entry, Franchise, Milestone, UserPreferences};
use anyhow::Result;
use async_trait::async_trait;

/// Persistence operations required by the tracker services
///
/// Implementations must be `Send + Sync`; futures may move between threads.
#[async_trait]
pub trait RecordStore: Send + Sync {
    //
    // FRANCHISES
    //

    async fn create_franchise(&self, franchise: Franchise) -> Result<Franchise>;

    async fn get_franchise(&self, id: &str) -> Result<Option<Franchise>>;

    /// All franchises ordered by name
    async fn list_franchises(&self) -> Result<Vec<Franchise>>;

    async fn update_franchise(&self, franchise: Franchise) -> Result<Franchise>;

    /// Returns whether a row was removed
    async fn delete_franchise(&self, id: &str) -> Result<bool>;

    async fn count_entries(&self, franchise_id: &str) -> Result<usize>;

    //
    // ENTRIES
    //

    /// Insert an entry and, optionally, its seed milestone (transactional)
    async fn create_entry(&self, entry: Entry, seed: Option<Milestone>) -> Result<Entry>;

    async fn get_entry(&self, id: &str) -> Result<Option<Entry>>;

    /// Entries of a franchise ordered by `display_order`, ties by insertion
    async fn list_entries(&self, franchise_id: &str) -> Result<Vec<Entry>>;

    async fn update_entry(&self, entry: Entry) -> Result<Entry>;

    /// Delete entries and every milestone they own (transactional)
    ///
    /// Returns the number of milestones removed.
    async fn delete_entries(&self, ids: &[String]) -> Result<u64>;

    async fn max_entry_order(&self, franchise_id: &str) -> Result<Option<i64>>;

    /// Rewrite entry orders; the ids must be exactly the franchise's current
    /// entries (transactional, re-checked)
    async fn reorder_entries(&self, franchise_id: &str, ordered_ids: &[String]) -> Result<Vec<(String, i64)>>;

    async fn count_milestones(&self, entry_id: &str) -> Result<usize>;

    //
    // MILESTONES
    //

    async fn create_milestone(&self, milestone: Milestone) -> Result<Milestone>;

    /// Insert many milestones (transactional); parents must precede children
    async fn create_milestones(&self, milestones: Vec<Milestone>) -> Result<Vec<Milestone>>;

    async fn get_milestone(&self, id: &str) -> Result<Option<Milestone>>;

    /// Milestones of an entry ordered by `display_order`, ties by insertion
    async fn list_milestones(&self, entry_id: &str) -> Result<Vec<Milestone>>;

    /// Write the content of `milestone` (title, type, progress, description,
    /// `modified_at`) and return the row as stored
    ///
    /// `display_order` is written only when `set_display_order` is true. The
    /// parent pointer is never written here; only `move_milestone` changes it.
    async fn update_milestone(&self, milestone: Milestone, set_display_order: bool) -> Result<Milestone>;

    /// Delete milestones by id (transactional); returns rows removed
    async fn delete_milestones(&self, ids: &[String]) -> Result<u64>;

    async fn max_sibling_order(&self, entry_id: &str, parent_id: Option<&str>) -> Result<Option<i64>>;

    /// Move a milestone under `new_parent_id` at the end of its new sibling
    /// list (transactional, re-checked)
    async fn move_milestone(&self, id: &str, new_parent_id: Option<&str>) -> Result<Milestone>;

    /// Assign sequential orders to the children of `parent_id`; the ids must
    /// be exactly the current children (transactional, re-checked)
    async fn reorder_milestones(
        &self,
        entry_id: &str,
        parent_id: Option<&str>,
        ordered_ids: &[String],
    ) -> Result<Vec<(String, i64)>>;

    //
    // PREFERENCES
    //

    async fn get_preferences(&self) -> Result<Option<UserPreferences>>;

    async fn save_preferences(&self, preferences: UserPreferences) -> Result<UserPreferences>;
}
