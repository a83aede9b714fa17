//! Completion procedures

use crate::models::RecomputeRequest;
use crate::procedures::types::{parse_params, to_result, ProcedureError};
use crate::services::CoreServices;
use serde::Deserialize;
use serde_json::Value;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryCompletionParams {
    pub entry_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FranchiseCompletionParams {
    pub franchise_id: String,
    #[serde(default = "default_true")]
    pub include_optional_entries: bool,
}

pub async fn handle_entry(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: EntryCompletionParams = parse_params(params)?;
    let completion = services.completion.entry_completion(&params.entry_id).await?;
    to_result(&completion)
}

pub async fn handle_franchise(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: FranchiseCompletionParams = parse_params(params)?;
    let completion = services
        .completion
        .franchise_completion(&params.franchise_id, params.include_optional_entries)
        .await?;
    to_result(&completion)
}

pub async fn handle_recompute(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let request: RecomputeRequest = parse_params(params)?;
    let result = services.completion.recompute(request).await?;
    to_result(&result)
}
