//! Service Layer Error Types
//!
//! Every failure a service can report falls into one of four categories:
//! validation, not-found, conflict, or internal. The procedure boundary maps
//! categories to stable error codes.

use crate::db::{DatabaseError, HierarchyConflict};
use crate::models::ValidationError;
use thiserror::Error;

/// Coarse failure class surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed input or a structural rule the input would break
    Validation,
    /// A referenced id does not exist or is outside the expected scope
    NotFound,
    /// A structural precondition blocks the operation
    Conflict,
    /// Storage or other unexpected failure
    Internal,
}

/// Service operation errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Cycle, reorder mismatch, duplicate-into-descendant and similar
    #[error("Invalid hierarchy: {reason}")]
    InvalidHierarchy { reason: String },

    #[error("Milestone not found: {id}")]
    MilestoneNotFound { id: String },

    #[error("Entry not found: {id}")]
    EntryNotFound { id: String },

    #[error("Franchise not found: {id}")]
    FranchiseNotFound { id: String },

    /// Parent missing or belonging to another entry
    #[error("Invalid parent: {parent_id}")]
    InvalidParent { parent_id: String },

    #[error("Cannot delete franchise with {count} entries. Delete child entries first.")]
    FranchiseHasEntries { count: usize },

    #[error("Database operation failed: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Store operation failed: {context}")]
    StoreFailed { context: String },
}

impl ServiceError {
    pub fn invalid_hierarchy(reason: impl Into<String>) -> Self {
        Self::InvalidHierarchy {
            reason: reason.into(),
        }
    }

    pub fn milestone_not_found(id: impl Into<String>) -> Self {
        Self::MilestoneNotFound { id: id.into() }
    }

    pub fn entry_not_found(id: impl Into<String>) -> Self {
        Self::EntryNotFound { id: id.into() }
    }

    pub fn franchise_not_found(id: impl Into<String>) -> Self {
        Self::FranchiseNotFound { id: id.into() }
    }

    pub fn invalid_parent(parent_id: impl Into<String>) -> Self {
        Self::InvalidParent {
            parent_id: parent_id.into(),
        }
    }

    pub fn store_failed(context: impl Into<String>) -> Self {
        Self::StoreFailed {
            context: context.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ServiceError::ValidationFailed(_) | ServiceError::InvalidHierarchy { .. } => {
                ErrorCategory::Validation
            }
            ServiceError::MilestoneNotFound { .. }
            | ServiceError::EntryNotFound { .. }
            | ServiceError::FranchiseNotFound { .. }
            | ServiceError::InvalidParent { .. } => ErrorCategory::NotFound,
            ServiceError::FranchiseHasEntries { .. } => ErrorCategory::Conflict,
            ServiceError::DatabaseError(_) | ServiceError::StoreFailed { .. } => {
                ErrorCategory::Internal
            }
        }
    }
}

impl From<anyhow::Error> for ServiceError {
    /// Store errors carry hierarchy conflicts detected inside transactions;
    /// those are reported as the validation or not-found failures they are.
    fn from(err: anyhow::Error) -> Self {
        if let Some(conflict) = err.downcast_ref::<HierarchyConflict>() {
            return match conflict {
                HierarchyConflict::ParentOutsideEntry { parent_id, .. } => {
                    ServiceError::invalid_parent(parent_id.clone())
                }
                HierarchyConflict::MissingMilestone { milestone_id } => {
                    ServiceError::milestone_not_found(milestone_id.clone())
                }
                other => ServiceError::invalid_hierarchy(other.to_string()),
            };
        }
        match err.downcast::<DatabaseError>() {
            Ok(db_err) => ServiceError::DatabaseError(db_err),
            Err(err) => ServiceError::store_failed(format!("{:#}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            ServiceError::from(ValidationError::EmptyTitle).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            ServiceError::invalid_parent("p").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            ServiceError::FranchiseHasEntries { count: 2 }.category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            ServiceError::store_failed("disk").category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_hierarchy_conflict_maps_to_validation() {
        let err: anyhow::Error = HierarchyConflict::Cycle {
            milestone_id: "a".to_string(),
            new_parent_id: "c".to_string(),
        }
        .into();
        let service_err = ServiceError::from(err);
        assert_eq!(service_err.category(), ErrorCategory::Validation);
        assert!(service_err.to_string().contains("cycle"));
    }

    #[test]
    fn test_conflict_message_names_entry_count() {
        let err = ServiceError::FranchiseHasEntries { count: 3 };
        assert_eq!(
            err.to_string(),
            "Cannot delete franchise with 3 entries. Delete child entries first."
        );
    }
}
