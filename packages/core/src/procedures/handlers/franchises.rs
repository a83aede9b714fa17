//! Franchise procedures

use crate::models::FranchiseUpdate;
use crate::procedures::types::{parse_params, to_result, ProcedureError};
use crate::services::CoreServices;
use serde::Deserialize;
use serde_json::{json, Value};

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default = "default_true")]
    pub include_optional_entries: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAdminParams {
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFranchiseParams {
    pub name: String,
    pub accent: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFranchiseParams {
    pub franchise_id: String,
    #[serde(flatten)]
    pub update: FranchiseUpdate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FranchiseIdParams {
    pub franchise_id: String,
}

pub async fn handle_list(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: ListParams = parse_params(params)?;
    let rows = services
        .franchises
        .list(params.include_optional_entries)
        .await?;
    Ok(json!({ "franchises": to_result(&rows)? }))
}

pub async fn handle_list_admin(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: ListAdminParams = parse_params(params)?;
    let rows = services
        .franchises
        .list_admin(params.search.as_deref())
        .await?;
    Ok(json!({ "franchises": to_result(&rows)? }))
}

pub async fn handle_create(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: CreateFranchiseParams = parse_params(params)?;
    let franchise = services
        .franchises
        .create(&params.name, &params.accent)
        .await?;
    to_result(&franchise)
}

pub async fn handle_update(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: UpdateFranchiseParams = parse_params(params)?;
    let franchise = services
        .franchises
        .update(&params.franchise_id, params.update)
        .await?;
    to_result(&franchise)
}

pub async fn handle_delete(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: FranchiseIdParams = parse_params(params)?;
    services.franchises.delete(&params.franchise_id).await?;
    Ok(json!({ "franchiseId": params.franchise_id, "success": true }))
}
