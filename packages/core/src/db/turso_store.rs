//! TursoStore - RecordStore Implementation for libsql
//!
//! Wraps [`DatabaseService`] and maps rows to the tracker models. Every
//! multi-record write runs inside a `BEGIN IMMEDIATE` transaction that is
//! rolled back on the first failure, so partial application is never
//! observable.
//!
//! Timestamps are written as RFC 3339 strings. Rows written by other tools
//! with SQLite's `CURRENT_TIMESTAMP` format are accepted on read.

use crate::db::display_ordering::DisplayOrderCalculator;
use crate::db::error::{DatabaseError, HierarchyConflict};
use crate::db::record_store::RecordStore;
use crate::db::DatabaseService;
use crate::models::{Entry, Franchise, MediaType, Milestone, MilestoneType, Progress, UserPreferences};
use crate::models::hierarchy::would_create_cycle;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::{Connection, Row};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const MILESTONE_COLUMNS: &str = "id, entry_id, parent_id, title, milestone_type, target, current, description, display_order, created_at, modified_at";
const ENTRY_COLUMNS: &str =
    "id, franchise_id, title, media_type, is_optional, display_order, created_at, modified_at";
const FRANCHISE_COLUMNS: &str = "id, name, accent, created_at, modified_at";

/// libsql-backed [`RecordStore`]
pub struct TursoStore {
    db: Arc<DatabaseService>,
}

impl TursoStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    async fn conn(&self) -> Result<Connection> {
        Ok(self.db.open_connection().await?)
    }

    /// Accepts RFC 3339 and SQLite's `YYYY-MM-DD HH:MM:SS`
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }
        Err(anyhow::anyhow!(
            "Unable to parse timestamp '{}' as RFC3339 or SQLite format",
            s
        ))
    }

    fn format_timestamp(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339()
    }

    fn row_to_milestone(row: &Row) -> Result<Milestone> {
        let id: String = row.get(0).context("Failed to get id")?;
        let entry_id: String = row.get(1).context("Failed to get entry_id")?;
        let parent_id: Option<String> = row.get(2).context("Failed to get parent_id")?;
        let title: String = row.get(3).context("Failed to get title")?;
        let kind: String = row.get(4).context("Failed to get milestone_type")?;
        let target: Option<i64> = row.get(5).context("Failed to get target")?;
        let current: i64 = row.get(6).context("Failed to get current")?;
        let description: Option<String> = row.get(7).context("Failed to get description")?;
        let display_order: i64 = row.get(8).context("Failed to get display_order")?;
        let created_at: String = row.get(9).context("Failed to get created_at")?;
        let modified_at: String = row.get(10).context("Failed to get modified_at")?;

        let kind: MilestoneType = kind
            .parse()
            .with_context(|| format!("Milestone {} has unknown type", id))?;

        Ok(Milestone {
            id,
            entry_id,
            parent_id,
            title,
            progress: Progress::from_stored(kind, current, target),
            description,
            display_order,
            created_at: Self::parse_timestamp(&created_at)?,
            modified_at: Self::parse_timestamp(&modified_at)?,
        })
    }

    fn row_to_entry(row: &Row) -> Result<Entry> {
        let id: String = row.get(0).context("Failed to get id")?;
        let franchise_id: String = row.get(1).context("Failed to get franchise_id")?;
        let title: String = row.get(2).context("Failed to get title")?;
        let media_type: String = row.get(3).context("Failed to get media_type")?;
        let is_optional: i64 = row.get(4).context("Failed to get is_optional")?;
        let display_order: i64 = row.get(5).context("Failed to get display_order")?;
        let created_at: String = row.get(6).context("Failed to get created_at")?;
        let modified_at: String = row.get(7).context("Failed to get modified_at")?;

        let media_type: MediaType = media_type
            .parse()
            .with_context(|| format!("Entry {} has unknown media type", id))?;

        Ok(Entry {
            id,
            franchise_id,
            title,
            media_type,
            is_optional: is_optional != 0,
            display_order,
            created_at: Self::parse_timestamp(&created_at)?,
            modified_at: Self::parse_timestamp(&modified_at)?,
        })
    }

    fn row_to_franchise(row: &Row) -> Result<Franchise> {
        let id: String = row.get(0).context("Failed to get id")?;
        let name: String = row.get(1).context("Failed to get name")?;
        let accent: String = row.get(2).context("Failed to get accent")?;
        let created_at: String = row.get(3).context("Failed to get created_at")?;
        let modified_at: String = row.get(4).context("Failed to get modified_at")?;

        Ok(Franchise {
            id,
            name,
            accent,
            created_at: Self::parse_timestamp(&created_at)?,
            modified_at: Self::parse_timestamp(&modified_at)?,
        })
    }

    async fn begin(conn: &Connection) -> Result<()> {
        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            DatabaseError::transaction_failed(format!("Failed to begin transaction: {}", e))
        })?;
        Ok(())
    }

    /// Commit on success, roll back on failure
    async fn finish<T>(conn: &Connection, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                if let Err(e) = conn.execute("COMMIT", ()).await {
                    let _rollback = conn.execute("ROLLBACK", ()).await;
                    return Err(DatabaseError::transaction_failed(format!(
                        "Failed to commit transaction: {}",
                        e
                    ))
                    .into());
                }
                Ok(value)
            }
            Err(e) => {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    async fn insert_milestone(conn: &Connection, milestone: &Milestone) -> Result<()> {
        conn.execute(
            &format!(
                "INSERT INTO milestones ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                MILESTONE_COLUMNS
            ),
            libsql::params![
                milestone.id.as_str(),
                milestone.entry_id.as_str(),
                milestone.parent_id.as_deref(),
                milestone.title.as_str(),
                milestone.kind().as_str(),
                milestone.progress.target(),
                milestone.progress.current(),
                milestone.description.as_deref(),
                milestone.display_order,
                Self::format_timestamp(&milestone.created_at),
                Self::format_timestamp(&milestone.modified_at),
            ],
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to insert milestone {}: {}", milestone.id, e))
        })?;
        Ok(())
    }

    async fn query_milestones(
        conn: &Connection,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Milestone>> {
        let mut rows = conn
            .query(sql, params)
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to query milestones: {}", e)))?;
        let mut milestones = Vec::new();
        while let Some(row) = rows.next().await? {
            milestones.push(Self::row_to_milestone(&row)?);
        }
        Ok(milestones)
    }

    async fn query_entries(
        conn: &Connection,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Entry>> {
        let mut rows = conn
            .query(sql, params)
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to query entries: {}", e)))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(Self::row_to_entry(&row)?);
        }
        Ok(entries)
    }

    async fn query_count(
        conn: &Connection,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<usize> {
        let mut rows = conn.query(sql, params).await?;
        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0).context("Failed to read count")?,
            None => 0,
        };
        Ok(count.max(0) as usize)
    }

    async fn query_max(
        conn: &Connection,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Option<i64>> {
        let mut rows = conn.query(sql, params).await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<Option<i64>>(0).context("Failed to read max order")?),
            None => Ok(None),
        }
    }

    async fn sibling_max_on(
        conn: &Connection,
        entry_id: &str,
        parent_id: Option<&str>,
    ) -> Result<Option<i64>> {
        match parent_id {
            Some(parent_id) => {
                Self::query_max(
                    conn,
                    "SELECT MAX(display_order) FROM milestones WHERE entry_id = ? AND parent_id = ?",
                    (entry_id, parent_id),
                )
                .await
            }
            None => {
                Self::query_max(
                    conn,
                    "SELECT MAX(display_order) FROM milestones WHERE entry_id = ? AND parent_id IS NULL",
                    [entry_id],
                )
                .await
            }
        }
    }

    async fn get_milestone_on(conn: &Connection, id: &str) -> Result<Option<Milestone>> {
        let mut found = Self::query_milestones(
            conn,
            &format!("SELECT {} FROM milestones WHERE id = ?", MILESTONE_COLUMNS),
            [id],
        )
        .await?;
        Ok(found.pop())
    }
}

#[async_trait]
impl RecordStore for TursoStore {
    async fn create_franchise(&self, franchise: Franchise) -> Result<Franchise> {
        let conn = self.conn().await?;
        conn.execute(
            &format!("INSERT INTO franchises ({}) VALUES (?, ?, ?, ?, ?)", FRANCHISE_COLUMNS),
            (
                franchise.id.as_str(),
                franchise.name.as_str(),
                franchise.accent.as_str(),
                Self::format_timestamp(&franchise.created_at),
                Self::format_timestamp(&franchise.modified_at),
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert franchise: {}", e)))?;
        Ok(franchise)
    }

    async fn get_franchise(&self, id: &str) -> Result<Option<Franchise>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM franchises WHERE id = ?", FRANCHISE_COLUMNS),
                [id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_franchise(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_franchises(&self) -> Result<Vec<Franchise>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM franchises ORDER BY name ASC, rowid ASC", FRANCHISE_COLUMNS),
                (),
            )
            .await?;
        let mut franchises = Vec::new();
        while let Some(row) = rows.next().await? {
            franchises.push(Self::row_to_franchise(&row)?);
        }
        Ok(franchises)
    }

    async fn update_franchise(&self, franchise: Franchise) -> Result<Franchise> {
        let conn = self.conn().await?;
        conn.execute(
            "UPDATE franchises SET name = ?, accent = ?, modified_at = ? WHERE id = ?",
            (
                franchise.name.as_str(),
                franchise.accent.as_str(),
                Self::format_timestamp(&franchise.modified_at),
                franchise.id.as_str(),
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to update franchise: {}", e)))?;
        Ok(franchise)
    }

    async fn delete_franchise(&self, id: &str) -> Result<bool> {
        let conn = self.conn().await?;
        let affected = conn
            .execute("DELETE FROM franchises WHERE id = ?", [id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to delete franchise: {}", e)))?;
        Ok(affected > 0)
    }

    async fn count_entries(&self, franchise_id: &str) -> Result<usize> {
        let conn = self.conn().await?;
        Self::query_count(
            &conn,
            "SELECT COUNT(*) FROM entries WHERE franchise_id = ?",
            [franchise_id],
        )
        .await
    }

    async fn create_entry(&self, entry: Entry, seed: Option<Milestone>) -> Result<Entry> {
        let conn = self.conn().await?;
        Self::begin(&conn).await?;

        let result: Result<()> = async {
            conn.execute(
                &format!("INSERT INTO entries ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)", ENTRY_COLUMNS),
                libsql::params![
                    entry.id.as_str(),
                    entry.franchise_id.as_str(),
                    entry.title.as_str(),
                    entry.media_type.as_str(),
                    i64::from(entry.is_optional),
                    entry.display_order,
                    Self::format_timestamp(&entry.created_at),
                    Self::format_timestamp(&entry.modified_at),
                ],
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert entry: {}", e)))?;

            if let Some(seed) = &seed {
                Self::insert_milestone(&conn, seed).await?;
            }
            Ok(())
        }
        .await;

        Self::finish(&conn, result).await?;
        Ok(entry)
    }

    async fn get_entry(&self, id: &str) -> Result<Option<Entry>> {
        let conn = self.conn().await?;
        let mut found = Self::query_entries(
            &conn,
            &format!("SELECT {} FROM entries WHERE id = ?", ENTRY_COLUMNS),
            [id],
        )
        .await?;
        Ok(found.pop())
    }

    async fn list_entries(&self, franchise_id: &str) -> Result<Vec<Entry>> {
        let conn = self.conn().await?;
        Self::query_entries(
            &conn,
            &format!(
                "SELECT {} FROM entries WHERE franchise_id = ? ORDER BY display_order ASC, rowid ASC",
                ENTRY_COLUMNS
            ),
            [franchise_id],
        )
        .await
    }

    async fn update_entry(&self, entry: Entry) -> Result<Entry> {
        let conn = self.conn().await?;
        conn.execute(
            "UPDATE entries SET title = ?, media_type = ?, is_optional = ?, display_order = ?, modified_at = ? WHERE id = ?",
            libsql::params![
                entry.title.as_str(),
                entry.media_type.as_str(),
                i64::from(entry.is_optional),
                entry.display_order,
                Self::format_timestamp(&entry.modified_at),
                entry.id.as_str(),
            ],
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to update entry: {}", e)))?;
        Ok(entry)
    }

    async fn delete_entries(&self, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let conn = self.conn().await?;
        Self::begin(&conn).await?;

        let result: Result<u64> = async {
            let mut milestones_removed = 0;
            for id in ids {
                milestones_removed += conn
                    .execute("DELETE FROM milestones WHERE entry_id = ?", [id.as_str()])
                    .await
                    .map_err(|e| {
                        DatabaseError::sql_execution(format!(
                            "Failed to delete milestones of entry {}: {}",
                            id, e
                        ))
                    })?;
                conn.execute("DELETE FROM entries WHERE id = ?", [id.as_str()])
                    .await
                    .map_err(|e| {
                        DatabaseError::sql_execution(format!("Failed to delete entry {}: {}", id, e))
                    })?;
            }
            Ok(milestones_removed)
        }
        .await;

        Self::finish(&conn, result).await
    }

    async fn max_entry_order(&self, franchise_id: &str) -> Result<Option<i64>> {
        let conn = self.conn().await?;
        Self::query_max(
            &conn,
            "SELECT MAX(display_order) FROM entries WHERE franchise_id = ?",
            [franchise_id],
        )
        .await
    }

    async fn reorder_entries(
        &self,
        franchise_id: &str,
        ordered_ids: &[String],
    ) -> Result<Vec<(String, i64)>> {
        let conn = self.conn().await?;
        Self::begin(&conn).await?;

        let result: Result<Vec<(String, i64)>> = async {
            let mut rows = conn
                .query("SELECT id FROM entries WHERE franchise_id = ?", [franchise_id])
                .await?;
            let mut current: HashSet<String> = HashSet::new();
            while let Some(row) = rows.next().await? {
                current.insert(row.get::<String>(0).context("Failed to get id")?);
            }

            let provided: HashSet<&str> = ordered_ids.iter().map(String::as_str).collect();
            if provided.len() != ordered_ids.len()
                || current.len() != provided.len()
                || !current.iter().all(|id| provided.contains(id.as_str()))
            {
                return Err(HierarchyConflict::EntrySetChanged {
                    expected: current.len(),
                    provided: ordered_ids.len(),
                }
                .into());
            }

            let updates = DisplayOrderCalculator::sequence(ordered_ids);
            for (id, order) in &updates {
                conn.execute(
                    "UPDATE entries SET display_order = ? WHERE id = ?",
                    (*order, id.as_str()),
                )
                .await
                .map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to reorder entry {}: {}", id, e))
                })?;
            }
            Ok(updates)
        }
        .await;

        Self::finish(&conn, result).await
    }

    async fn count_milestones(&self, entry_id: &str) -> Result<usize> {
        let conn = self.conn().await?;
        Self::query_count(
            &conn,
            "SELECT COUNT(*) FROM milestones WHERE entry_id = ?",
            [entry_id],
        )
        .await
    }

    async fn create_milestone(&self, milestone: Milestone) -> Result<Milestone> {
        let conn = self.conn().await?;
        Self::insert_milestone(&conn, &milestone).await?;
        Ok(milestone)
    }

    async fn create_milestones(&self, milestones: Vec<Milestone>) -> Result<Vec<Milestone>> {
        if milestones.is_empty() {
            return Ok(milestones);
        }

        let conn = self.conn().await?;
        Self::begin(&conn).await?;

        let result: Result<()> = async {
            for milestone in &milestones {
                Self::insert_milestone(&conn, milestone).await?;
            }
            Ok(())
        }
        .await;

        Self::finish(&conn, result).await?;
        Ok(milestones)
    }

    async fn get_milestone(&self, id: &str) -> Result<Option<Milestone>> {
        let conn = self.conn().await?;
        Self::get_milestone_on(&conn, id).await
    }

    async fn list_milestones(&self, entry_id: &str) -> Result<Vec<Milestone>> {
        let conn = self.conn().await?;
        Self::query_milestones(
            &conn,
            &format!(
                "SELECT {} FROM milestones WHERE entry_id = ? ORDER BY display_order ASC, rowid ASC",
                MILESTONE_COLUMNS
            ),
            [entry_id],
        )
        .await
    }

    async fn update_milestone(&self, milestone: Milestone, set_display_order: bool) -> Result<Milestone> {
        let conn = self.conn().await?;
        Self::begin(&conn).await?;

        let result: Result<Milestone> = async {
            let missing = || HierarchyConflict::MissingMilestone {
                milestone_id: milestone.id.clone(),
            };
            let changed = conn
                .execute(
                    "UPDATE milestones SET title = ?, milestone_type = ?, target = ?, current = ?, description = ?, display_order = COALESCE(?, display_order), modified_at = ? WHERE id = ?",
                    libsql::params![
                        milestone.title.as_str(),
                        milestone.kind().as_str(),
                        milestone.progress.target(),
                        milestone.progress.current(),
                        milestone.description.as_deref(),
                        set_display_order.then_some(milestone.display_order),
                        Self::format_timestamp(&milestone.modified_at),
                        milestone.id.as_str(),
                    ],
                )
                .await
                .map_err(|e| DatabaseError::sql_execution(format!("Failed to update milestone: {}", e)))?;
            if changed == 0 {
                return Err(missing().into());
            }

            // Structural columns come from the row, not from the caller's copy
            Self::get_milestone_on(&conn, &milestone.id)
                .await?
                .ok_or_else(|| missing().into())
        }
        .await;

        Self::finish(&conn, result).await
    }

    async fn delete_milestones(&self, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let conn = self.conn().await?;
        Self::begin(&conn).await?;

        let result: Result<u64> = async {
            let mut removed = 0;
            for id in ids {
                removed += conn
                    .execute("DELETE FROM milestones WHERE id = ?", [id.as_str()])
                    .await
                    .map_err(|e| {
                        DatabaseError::sql_execution(format!("Failed to delete milestone {}: {}", id, e))
                    })?;
            }
            Ok(removed)
        }
        .await;

        Self::finish(&conn, result).await
    }

    async fn max_sibling_order(&self, entry_id: &str, parent_id: Option<&str>) -> Result<Option<i64>> {
        let conn = self.conn().await?;
        Self::sibling_max_on(&conn, entry_id, parent_id).await
    }

    async fn move_milestone(&self, id: &str, new_parent_id: Option<&str>) -> Result<Milestone> {
        let conn = self.conn().await?;
        Self::begin(&conn).await?;

        let result: Result<Milestone> = async {
            let mut milestone = Self::get_milestone_on(&conn, id).await?.ok_or_else(|| {
                HierarchyConflict::MissingMilestone {
                    milestone_id: id.to_string(),
                }
            })?;

            if let Some(parent_id) = new_parent_id {
                let mut rows = conn
                    .query(
                        "SELECT id, parent_id FROM milestones WHERE entry_id = ?",
                        [milestone.entry_id.as_str()],
                    )
                    .await?;
                let mut parents: HashMap<String, Option<String>> = HashMap::new();
                while let Some(row) = rows.next().await? {
                    let node_id: String = row.get(0).context("Failed to get id")?;
                    let node_parent: Option<String> = row.get(1).context("Failed to get parent_id")?;
                    parents.insert(node_id, node_parent);
                }

                if !parents.contains_key(parent_id) {
                    return Err(HierarchyConflict::ParentOutsideEntry {
                        parent_id: parent_id.to_string(),
                        entry_id: milestone.entry_id.clone(),
                    }
                    .into());
                }
                if would_create_cycle(&parents, id, parent_id) {
                    return Err(HierarchyConflict::Cycle {
                        milestone_id: id.to_string(),
                        new_parent_id: parent_id.to_string(),
                    }
                    .into());
                }
            }

            let max = Self::sibling_max_on(&conn, &milestone.entry_id, new_parent_id).await?;
            milestone.parent_id = new_parent_id.map(str::to_string);
            milestone.display_order = DisplayOrderCalculator::next_order(max);
            milestone.modified_at = Utc::now();

            conn.execute(
                "UPDATE milestones SET parent_id = ?, display_order = ?, modified_at = ? WHERE id = ?",
                (
                    milestone.parent_id.as_deref(),
                    milestone.display_order,
                    Self::format_timestamp(&milestone.modified_at),
                    milestone.id.as_str(),
                ),
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to move milestone: {}", e)))?;

            Ok(milestone)
        }
        .await;

        Self::finish(&conn, result).await
    }

    async fn reorder_milestones(
        &self,
        entry_id: &str,
        parent_id: Option<&str>,
        ordered_ids: &[String],
    ) -> Result<Vec<(String, i64)>> {
        let conn = self.conn().await?;
        Self::begin(&conn).await?;

        let result: Result<Vec<(String, i64)>> = async {
            let mut rows = match parent_id {
                Some(parent_id) => {
                    conn.query(
                        "SELECT id FROM milestones WHERE entry_id = ? AND parent_id = ?",
                        (entry_id, parent_id),
                    )
                    .await?
                }
                None => {
                    conn.query(
                        "SELECT id FROM milestones WHERE entry_id = ? AND parent_id IS NULL",
                        [entry_id],
                    )
                    .await?
                }
            };
            let mut children: HashSet<String> = HashSet::new();
            while let Some(row) = rows.next().await? {
                children.insert(row.get::<String>(0).context("Failed to get id")?);
            }

            let provided: HashSet<&str> = ordered_ids.iter().map(String::as_str).collect();
            if provided.len() != ordered_ids.len()
                || children.len() != provided.len()
                || !children.iter().all(|id| provided.contains(id.as_str()))
            {
                return Err(HierarchyConflict::SiblingSetChanged {
                    expected: children.len(),
                    provided: ordered_ids.len(),
                }
                .into());
            }

            let updates = DisplayOrderCalculator::sequence(ordered_ids);
            let now = Self::format_timestamp(&Utc::now());
            for (id, order) in &updates {
                conn.execute(
                    "UPDATE milestones SET display_order = ?, modified_at = ? WHERE id = ?",
                    (*order, now.as_str(), id.as_str()),
                )
                .await
                .map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to reorder milestone {}: {}", id, e))
                })?;
            }
            Ok(updates)
        }
        .await;

        Self::finish(&conn, result).await
    }

    async fn get_preferences(&self) -> Result<Option<UserPreferences>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT include_optional_entries FROM user_preferences WHERE id = 1",
                (),
            )
            .await?;
        match rows.next().await? {
            Some(row) => {
                let include: i64 = row.get(0).context("Failed to get include_optional_entries")?;
                Ok(Some(UserPreferences {
                    include_optional_entries: include != 0,
                }))
            }
            None => Ok(None),
        }
    }

    async fn save_preferences(&self, preferences: UserPreferences) -> Result<UserPreferences> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO user_preferences (id, include_optional_entries, modified_at) VALUES (1, ?, ?)
             ON CONFLICT(id) DO UPDATE SET include_optional_entries = excluded.include_optional_entries,
                                           modified_at = excluded.modified_at",
            (
                i64::from(preferences.include_optional_entries),
                Self::format_timestamp(&Utc::now()),
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to save preferences: {}", e)))?;
        Ok(preferences)
    }
}
