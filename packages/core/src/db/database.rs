//! Tracker database
//!
//! Owns the libsql handle for the on-disk tracker file and lays down its
//! schema on open.
//!
//! Tables:
//!
//! - `franchises`: named collections with a display accent
//! - `entries`: works tracked inside a franchise, ordered by `display_order`
//! - `milestones`: per-entry progress trees stored as parent pointers
//! - `user_preferences`: a single settings row (`id = 1`)
//!
//! `milestones.parent_id` carries no foreign key. The store removes subtrees
//! itself and the tree loader promotes rows whose parent is gone.
//!
//! SQLite keeps `busy_timeout` and `foreign_keys` per connection, so every
//! async caller should go through [`DatabaseService::open_connection`].
//!
//! ```no_run
//! # use completionist_core::db::DatabaseService;
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let tracker = DatabaseService::new("./data/completionist.db".into()).await?;
//! let conn = tracker.open_connection().await?;
//! # let _ = conn;
//! # Ok(())
//! # }
//! ```

use crate::config::CoreConfig;
use crate::db::error::DatabaseError;
use libsql::{Builder, Connection, Database};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Busy timeout used when no configuration overrides it
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

const TABLES: [(&str, &str); 4] = [
    (
        "franchises",
        "CREATE TABLE IF NOT EXISTS franchises (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            accent TEXT NOT NULL,
            created_at TEXT NOT NULL,
            modified_at TEXT NOT NULL
        )",
    ),
    (
        "entries",
        "CREATE TABLE IF NOT EXISTS entries (
            id TEXT PRIMARY KEY,
            franchise_id TEXT NOT NULL REFERENCES franchises(id),
            title TEXT NOT NULL,
            media_type TEXT NOT NULL DEFAULT 'GAME',
            is_optional INTEGER NOT NULL DEFAULT 0,
            display_order INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            modified_at TEXT NOT NULL
        )",
    ),
    (
        "milestones",
        "CREATE TABLE IF NOT EXISTS milestones (
            id TEXT PRIMARY KEY,
            entry_id TEXT NOT NULL REFERENCES entries(id),
            parent_id TEXT,
            title TEXT NOT NULL,
            milestone_type TEXT NOT NULL CHECK (milestone_type IN ('CHECKBOX', 'COUNTER')),
            target INTEGER,
            current INTEGER NOT NULL DEFAULT 0,
            description TEXT,
            display_order INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            modified_at TEXT NOT NULL
        )",
    ),
    (
        "user_preferences",
        "CREATE TABLE IF NOT EXISTS user_preferences (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            include_optional_entries INTEGER NOT NULL DEFAULT 1,
            modified_at TEXT NOT NULL
        )",
    ),
];

const INDEXES: [(&str, &str); 4] = [
    (
        "idx_entries_franchise_order",
        "CREATE INDEX IF NOT EXISTS idx_entries_franchise_order ON entries(franchise_id, display_order)",
    ),
    (
        "idx_milestones_entry_order",
        "CREATE INDEX IF NOT EXISTS idx_milestones_entry_order ON milestones(entry_id, display_order)",
    ),
    (
        "idx_milestones_parent",
        "CREATE INDEX IF NOT EXISTS idx_milestones_parent ON milestones(entry_id, parent_id, display_order)",
    ),
    (
        "idx_franchises_name",
        "CREATE INDEX IF NOT EXISTS idx_franchises_name ON franchises(name)",
    ),
];

/// Runs a PRAGMA; libsql reports their rows, so `execute` is not usable here
async fn apply_pragma(conn: &Connection, pragma: &str) -> Result<(), DatabaseError> {
    let fail = |e: libsql::Error| DatabaseError::sql_execution(format!("{}: {}", pragma, e));
    let mut stmt = conn.prepare(pragma).await.map_err(fail)?;
    stmt.query(()).await.map_err(fail)?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<(), DatabaseError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() && !p.exists() => p,
        _ => return Ok(()),
    };
    std::fs::create_dir_all(parent).map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => DatabaseError::permission_denied(path.to_path_buf()),
        _ => DatabaseError::CreateDir(e),
    })
}

/// Shared handle to the tracker database file
#[derive(Debug, Clone)]
pub struct DatabaseService {
    handle: Arc<Database>,
    path: PathBuf,
    busy_timeout_ms: u64,
}

impl DatabaseService {
    /// Opens `path` with the default busy timeout, creating the file, its
    /// directory and the schema as needed. Reopening an existing file is safe.
    pub async fn new(path: PathBuf) -> Result<Self, DatabaseError> {
        Self::open(path, DEFAULT_BUSY_TIMEOUT_MS).await
    }

    pub async fn from_config(config: &CoreConfig) -> Result<Self, DatabaseError> {
        Self::open(config.database_path.clone(), config.busy_timeout_ms).await
    }

    async fn open(path: PathBuf, busy_timeout_ms: u64) -> Result<Self, DatabaseError> {
        let fresh = !path.exists();
        ensure_parent_dir(&path)?;

        let handle = Builder::new_local(&path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(path.clone(), e))?;

        let service = Self {
            handle: Arc::new(handle),
            path,
            busy_timeout_ms,
        };
        service.migrate(fresh).await?;
        debug!(path = %service.path.display(), fresh, "tracker database ready");
        Ok(service)
    }

    async fn migrate(&self, fresh: bool) -> Result<(), DatabaseError> {
        let conn = self.open_connection().await?;
        apply_pragma(&conn, "PRAGMA journal_mode = WAL").await?;

        for (table, ddl) in TABLES {
            conn.execute(ddl, ()).await.map_err(|e| {
                DatabaseError::initialization_failed(format!("table {}: {}", table, e))
            })?;
        }
        for (index, ddl) in INDEXES {
            conn.execute(ddl, ()).await.map_err(|e| {
                DatabaseError::initialization_failed(format!("index {}: {}", index, e))
            })?;
        }

        // Connections opened right after creation must see the new schema
        if fresh {
            apply_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)").await?;
        }
        Ok(())
    }

    /// Bare connection, no busy timeout and no foreign key enforcement
    pub fn raw_connection(&self) -> Result<Connection, DatabaseError> {
        Ok(self.handle.connect()?)
    }

    /// Connection with the configured busy timeout and foreign keys on
    pub async fn open_connection(&self) -> Result<Connection, DatabaseError> {
        let conn = self.raw_connection()?;
        apply_pragma(&conn, &format!("PRAGMA busy_timeout = {}", self.busy_timeout_ms)).await?;
        apply_pragma(&conn, "PRAGMA foreign_keys = ON").await?;
        Ok(conn)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn busy_timeout_ms(&self) -> u64 {
        self.busy_timeout_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn names_of(conn: &Connection, kind: &str) -> Vec<String> {
        let mut rows = conn
            .query(
                "SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name",
                libsql::params![kind],
            )
            .await
            .unwrap();
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            out.push(row.get::<String>(0).unwrap());
        }
        out
    }

    async fn pragma_text(conn: &Connection, pragma: &str) -> String {
        let mut rows = conn.query(pragma, ()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        row.get_value(0)
            .map(|v| match v {
                libsql::Value::Integer(i) => i.to_string(),
                libsql::Value::Text(s) => s,
                other => format!("{:?}", other),
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_file_and_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracker.db");

        let tracker = DatabaseService::new(path.clone()).await.unwrap();
        assert!(path.exists());
        assert_eq!(tracker.path(), path.as_path());
        assert_eq!(tracker.busy_timeout_ms(), DEFAULT_BUSY_TIMEOUT_MS);

        let conn = tracker.raw_connection().unwrap();
        let tables = names_of(&conn, "table").await;
        assert_eq!(
            tables,
            vec!["entries", "franchises", "milestones", "user_preferences"]
        );

        let indexes = names_of(&conn, "index").await;
        for (index, _) in INDEXES {
            assert!(indexes.iter().any(|n| n == index), "{} missing", index);
        }
    }

    #[tokio::test]
    async fn test_connection_pragmas() {
        let dir = TempDir::new().unwrap();
        let tracker = DatabaseService::new(dir.path().join("tracker.db"))
            .await
            .unwrap();

        let conn = tracker.open_connection().await.unwrap();
        assert_eq!(pragma_text(&conn, "PRAGMA journal_mode").await.to_lowercase(), "wal");
        assert_eq!(pragma_text(&conn, "PRAGMA foreign_keys").await, "1");
        assert_eq!(pragma_text(&conn, "PRAGMA busy_timeout").await, "5000");
    }

    #[tokio::test]
    async fn test_missing_directories_are_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("tracker.db");
        DatabaseService::new(path.clone()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_reopen_keeps_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracker.db");

        let first = DatabaseService::new(path.clone()).await.unwrap();
        first
            .open_connection()
            .await
            .unwrap()
            .execute(
                "INSERT INTO franchises (id, name, accent, created_at, modified_at)
                 VALUES ('f1', 'Zelda', '#22c55e', 'now', 'now')",
                (),
            )
            .await
            .unwrap();

        let second = DatabaseService::new(path).await.unwrap();
        let conn = second.open_connection().await.unwrap();
        let mut rows = conn.query("SELECT name FROM franchises", ()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<String>(0).unwrap(), "Zelda");
    }

    #[tokio::test]
    async fn test_from_config_applies_busy_timeout() {
        let dir = TempDir::new().unwrap();
        let config = CoreConfig {
            database_path: dir.path().join("configured.db"),
            busy_timeout_ms: 250,
            ..CoreConfig::default()
        };

        let tracker = DatabaseService::from_config(&config).await.unwrap();
        assert_eq!(tracker.busy_timeout_ms(), 250);
        let conn = tracker.open_connection().await.unwrap();
        assert_eq!(pragma_text(&conn, "PRAGMA busy_timeout").await, "250");
    }
}
