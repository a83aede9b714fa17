//! Named-procedure dispatch

use crate::procedures::handlers::{completion, entries, franchises, milestones, preferences};
use crate::procedures::types::{ProcedureError, ProcedureRequest, ProcedureResponse};
use crate::services::CoreServices;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

/// Every procedure name the router accepts
pub const PROCEDURES: &[&str] = &[
    "franchise.list",
    "franchise.listAdmin",
    "franchise.create",
    "franchise.update",
    "franchise.delete",
    "entry.listByFranchise",
    "entry.listByFranchiseAdmin",
    "entry.create",
    "entry.update",
    "entry.delete",
    "entry.bulkDelete",
    "entry.reorder",
    "milestone.tree",
    "milestone.treeAdmin",
    "milestone.create",
    "milestone.update",
    "milestone.reparent",
    "milestone.reorder",
    "milestone.delete",
    "milestone.increment",
    "milestone.setCurrent",
    "milestone.duplicateSubtree",
    "milestone.batchCreate",
    "completion.entry",
    "completion.franchise",
    "completion.recompute",
    "preferences.get",
    "preferences.set",
    "preferences.toggleOptionalEntries",
];

#[derive(Clone)]
pub struct ProcedureRouter {
    services: CoreServices,
}

impl ProcedureRouter {
    pub fn new(services: CoreServices) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &CoreServices {
        &self.services
    }

    /// Run the procedure `name` with JSON `params`
    #[instrument(skip(self, params))]
    pub async fn dispatch(&self, name: &str, params: Value) -> Result<Value, ProcedureError> {
        let s = &self.services;
        match name {
            "franchise.list" => franchises::handle_list(s, params).await,
            "franchise.listAdmin" => franchises::handle_list_admin(s, params).await,
            "franchise.create" => franchises::handle_create(s, params).await,
            "franchise.update" => franchises::handle_update(s, params).await,
            "franchise.delete" => franchises::handle_delete(s, params).await,

            "entry.listByFranchise" => entries::handle_list_by_franchise(s, params).await,
            "entry.listByFranchiseAdmin" => entries::handle_list_by_franchise_admin(s, params).await,
            "entry.create" => entries::handle_create(s, params).await,
            "entry.update" => entries::handle_update(s, params).await,
            "entry.delete" => entries::handle_delete(s, params).await,
            "entry.bulkDelete" => entries::handle_bulk_delete(s, params).await,
            "entry.reorder" => entries::handle_reorder(s, params).await,

            "milestone.tree" => milestones::handle_tree(s, params).await,
            "milestone.treeAdmin" => milestones::handle_tree_admin(s, params).await,
            "milestone.create" => milestones::handle_create(s, params).await,
            "milestone.update" => milestones::handle_update(s, params).await,
            "milestone.reparent" => milestones::handle_reparent(s, params).await,
            "milestone.reorder" => milestones::handle_reorder(s, params).await,
            "milestone.delete" => milestones::handle_delete(s, params).await,
            "milestone.increment" => milestones::handle_increment(s, params).await,
            "milestone.setCurrent" => milestones::handle_set_current(s, params).await,
            "milestone.duplicateSubtree" => milestones::handle_duplicate_subtree(s, params).await,
            "milestone.batchCreate" => milestones::handle_batch_create(s, params).await,

            "completion.entry" => completion::handle_entry(s, params).await,
            "completion.franchise" => completion::handle_franchise(s, params).await,
            "completion.recompute" => completion::handle_recompute(s, params).await,

            "preferences.get" => preferences::handle_get(s, params).await,
            "preferences.set" => preferences::handle_set(s, params).await,
            "preferences.toggleOptionalEntries" => {
                preferences::handle_toggle_optional_entries(s, params).await
            }

            _ => {
                warn!(method = name, "unknown procedure");
                Err(ProcedureError::method_not_found(name))
            }
        }
    }

    /// Dispatch a full request and wrap the outcome in a response envelope
    pub async fn handle(&self, request: ProcedureRequest) -> ProcedureResponse {
        match self.dispatch(&request.method, request.params).await {
            Ok(result) => {
                debug!(method = %request.method, "procedure succeeded");
                ProcedureResponse::success(request.id, result)
            }
            Err(err) => {
                if err.code == crate::procedures::types::INTERNAL_ERROR {
                    error!(method = %request.method, code = err.code, "procedure failed: {}", err.message);
                } else {
                    warn!(method = %request.method, code = err.code, "procedure rejected: {}", err.message);
                }
                ProcedureResponse::error(request.id, err)
            }
        }
    }
}
