//! Storage errors
//!
//! [`DatabaseError`] covers the libsql file and its statements.
//! [`HierarchyConflict`] is raised by the store when a tree write no longer
//! matches what the service validated.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while opening or talking to the tracker database
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("cannot open tracker database {path}: {source}")]
    Open {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Schema setup (tables, indexes) did not complete
    #[error("tracker schema setup failed: {0}")]
    Schema(String),

    #[error("no write access to {path}")]
    PathNotWritable { path: PathBuf },

    #[error("cannot create database directory: {0}")]
    CreateDir(#[from] std::io::Error),

    #[error(transparent)]
    Libsql(#[from] libsql::Error),

    #[error("statement failed: {context}")]
    Statement { context: String },

    #[error("transaction failed: {context}")]
    Transaction { context: String },
}

impl DatabaseError {
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::Open { path, source }
    }

    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PathNotWritable { path }
    }

    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::Statement {
            context: context.into(),
        }
    }

    pub fn transaction_failed(context: impl Into<String>) -> Self {
        Self::Transaction {
            context: context.into(),
        }
    }
}

/// Structural conflict found while re-checking hierarchy state inside a
/// write transaction
///
/// The service layer validates before calling the store; the store repeats
/// the check against rows read in the same transaction so a concurrent
/// writer cannot slip a cycle or a stale sibling set past validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyConflict {
    #[error("Moving milestone {milestone_id} under {new_parent_id} would create a cycle")]
    Cycle {
        milestone_id: String,
        new_parent_id: String,
    },

    #[error("Parent milestone {parent_id} is not part of entry {entry_id}")]
    ParentOutsideEntry { parent_id: String, entry_id: String },

    #[error("Milestone {milestone_id} no longer exists")]
    MissingMilestone { milestone_id: String },

    #[error("orderedIds must list exactly the current children of the parent ({expected} expected, {provided} provided)")]
    SiblingSetChanged { expected: usize, provided: usize },

    #[error("orderedEntryIds must include all entries of the franchise ({expected} expected, {provided} provided)")]
    EntrySetChanged { expected: usize, provided: usize },
}
