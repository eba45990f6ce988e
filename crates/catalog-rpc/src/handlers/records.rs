//! Record handlers.

use super::{get_str_param, require_str_param};
use crate::server::AppState;
use catalog_core::{CatalogError, Record};
use serde_json::{json, Value};

pub async fn get(state: &AppState, params: &Value) -> catalog_core::Result<Value> {
    let id = require_str_param(params, "id", "id")?;
    match state.catalog.get(&id).await? {
        Some(record) => Ok(serde_json::to_value(record)?),
        None => Err(CatalogError::not_found(id)),
    }
}

pub async fn save(state: &AppState, params: &Value) -> catalog_core::Result<Value> {
    let payload = params
        .get("record")
        .cloned()
        .ok_or_else(|| CatalogError::InvalidParams {
            message: "Missing required parameter: record".to_string(),
        })?;
    let id = get_str_param(params, "id", "id").map(String::from);

    let record = Record::from_value(payload, id.as_deref())?;
    let saved = state.catalog.save(id, record).await?;
    Ok(json!({ "id": saved }))
}

pub async fn delete(state: &AppState, params: &Value) -> catalog_core::Result<Value> {
    let id = require_str_param(params, "id", "id")?;
    state.catalog.delete(&id).await?;
    Ok(json!(true))
}
