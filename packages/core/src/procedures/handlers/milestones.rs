//! Milestone procedures
//!
//! Thin wrappers over [`MilestoneService`](crate::services::MilestoneService):
//! parse camelCase params, call the service, shape the JSON result.

use crate::models::MilestoneUpdate;
use crate::procedures::types::{parse_params, to_result, ProcedureError};
use crate::services::{BatchCreateMilestones, CoreServices, CreateMilestone};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryIdParams {
    pub entry_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneIdParams {
    pub milestone_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMilestoneParams {
    pub milestone_id: String,
    #[serde(flatten)]
    pub update: MilestoneUpdate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReparentParams {
    pub milestone_id: String,
    #[serde(default)]
    pub new_parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderParams {
    pub entry_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub ordered_ids: Vec<String>,
}

fn default_delta() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncrementParams {
    pub milestone_id: String,
    #[serde(default = "default_delta")]
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCurrentParams {
    pub milestone_id: String,
    pub value: i64,
}

pub async fn handle_tree(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: EntryIdParams = parse_params(params)?;
    let roots = services.milestones.tree(&params.entry_id).await?;
    Ok(json!({ "entryId": params.entry_id, "roots": to_result(&roots)? }))
}

pub async fn handle_tree_admin(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: EntryIdParams = parse_params(params)?;
    let roots = services.milestones.tree_admin(&params.entry_id).await?;
    Ok(json!({ "entryId": params.entry_id, "roots": to_result(&roots)? }))
}

pub async fn handle_create(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let input: CreateMilestone = parse_params(params)?;
    let milestone = services.milestones.create(input).await?;
    to_result(&milestone)
}

pub async fn handle_update(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: UpdateMilestoneParams = parse_params(params)?;
    let milestone = services
        .milestones
        .update(&params.milestone_id, params.update)
        .await?;
    to_result(&milestone)
}

pub async fn handle_reparent(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: ReparentParams = parse_params(params)?;
    let milestone = services
        .milestones
        .reparent(&params.milestone_id, params.new_parent_id.as_deref())
        .await?;
    to_result(&milestone)
}

pub async fn handle_reorder(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: ReorderParams = parse_params(params)?;
    let updates = services
        .milestones
        .reorder(&params.entry_id, params.parent_id.as_deref(), &params.ordered_ids)
        .await?;
    let updates: Vec<Value> = updates
        .into_iter()
        .map(|(id, display_order)| json!({ "id": id, "displayOrder": display_order }))
        .collect();
    Ok(json!({ "updates": updates }))
}

pub async fn handle_delete(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: MilestoneIdParams = parse_params(params)?;
    let deleted = services.milestones.delete(&params.milestone_id).await?;
    Ok(json!({ "deletedIds": deleted }))
}

pub async fn handle_increment(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: IncrementParams = parse_params(params)?;
    let change = services
        .milestones
        .increment(&params.milestone_id, params.delta)
        .await?;
    to_result(&change)
}

pub async fn handle_set_current(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: SetCurrentParams = parse_params(params)?;
    let milestone = services
        .milestones
        .set_current(&params.milestone_id, params.value)
        .await?;
    to_result(&milestone)
}

pub async fn handle_duplicate_subtree(
    services: &CoreServices,
    params: Value,
) -> Result<Value, ProcedureError> {
    let params: ReparentParams = parse_params(params)?;
    let copies = services
        .milestones
        .duplicate_subtree(&params.milestone_id, params.new_parent_id.as_deref())
        .await?;
    let root_id = copies.first().map(|m| m.id.clone());
    Ok(json!({ "rootId": root_id, "created": to_result(&copies)? }))
}

pub async fn handle_batch_create(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let input: BatchCreateMilestones = parse_params(params)?;
    let created = services.milestones.batch_create(input).await?;
    Ok(json!({ "created": to_result(&created)? }))
}
