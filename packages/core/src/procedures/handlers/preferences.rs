//! Viewer preference procedures

use crate::procedures::types::{parse_params, to_result, ProcedureError};
use crate::services::CoreServices;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPreferencesParams {
    pub include_optional_entries: bool,
}

pub async fn handle_get(services: &CoreServices, _params: Value) -> Result<Value, ProcedureError> {
    to_result(&services.preferences.get().await?)
}

pub async fn handle_set(services: &CoreServices, params: Value) -> Result<Value, ProcedureError> {
    let params: SetPreferencesParams = parse_params(params)?;
    let preferences = services
        .preferences
        .set(params.include_optional_entries)
        .await?;
    to_result(&preferences)
}

pub async fn handle_toggle_optional_entries(
    services: &CoreServices,
    _params: Value,
) -> Result<Value, ProcedureError> {
    to_result(&services.preferences.toggle_optional_entries().await?)
}
