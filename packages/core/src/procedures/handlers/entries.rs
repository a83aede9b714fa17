//! Entry procedures

use crate::models::EntryUpdate;
use crate::procedures::types::{parse_params, to_result, ProcedureError};
use crate::services::{CoreServices, CreateEntry};
use serde::Deserialize;
use serde_json::{json, Value};

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListByFranchiseParams {
    pub franchise_id: String,
    #[serde(default = "default_true")]
    pub include_optional_entries: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FranchiseIdParams {
    pub franchise_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryParams {
    pub entry_id: String,
    #[serde(flatten)]
    pub update: EntryUpdate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryIdParams {
    pub entry_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteParams {
    pub entry_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderEntriesParams {
    pub franchise_id: String,
    pub ordered_entry_ids: Vec<String>,
}

pub async fn handle_list_by_franchise(
    services: &CoreServices,
    params: Value,
) -> Result<Value, ProcedureError> {
    let params: ListByFranchiseParams = parse_params(params)?;
    let rows = services
        .entries
        .list_by_franchise(&params.franchise_id, params.include_optional_entries)
        .await?;
    Ok(json!({ "entries": to_result(&rows)? }))
}

pub async fn handle_list_by_franchise_admin(
    services: &CoreServices,
    params: Value,
) -> Result<Value, ProcedureError> {
    let params: FranchiseIdParams = parse_params(params)?;
    let rows = services
        .entries
        .list_by_franchise_admin(&params.franchise_id)
        .await?;
    Ok(json!({ "entries": to_result(&rows)? }))
}

pub async fn handle_create(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let input: CreateEntry = parse_params(params)?;
    let entry = services.entries.create(input).await?;
    to_result(&entry)
}

pub async fn handle_update(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: UpdateEntryParams = parse_params(params)?;
    let entry = services
        .entries
        .update(&params.entry_id, params.update)
        .await?;
    to_result(&entry)
}

pub async fn handle_delete(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: EntryIdParams = parse_params(params)?;
    let result = services.entries.delete(&params.entry_id).await?;
    to_result(&result)
}

pub async fn handle_bulk_delete(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: BulkDeleteParams = parse_params(params)?;
    let result = services.entries.bulk_delete(&params.entry_ids).await?;
    to_result(&result)
}

pub async fn handle_reorder(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: ReorderEntriesParams = parse_params(params)?;
    let updates = services
        .entries
        .reorder(&params.franchise_id, &params.ordered_entry_ids)
        .await?;
    let updates: Vec<Value> = updates
        .into_iter()
        .map(|(id, display_order)| json!({ "id": id, "displayOrder": display_order }))
        .collect();
    Ok(json!({ "updates": updates }))
}
