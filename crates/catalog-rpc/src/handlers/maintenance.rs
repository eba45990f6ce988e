//! Reindex, consistency, backup & status handlers.

use super::require_backup_path;
use crate::server::AppState;
use serde_json::{json, Value};

pub async fn reindex_all(state: &AppState, _params: &Value) -> catalog_core::Result<Value> {
    let report = state.catalog.reindex_all().await?;
    Ok(serde_json::to_value(report)?)
}

pub async fn verify(state: &AppState, _params: &Value) -> catalog_core::Result<Value> {
    let report = state.catalog.verify().await?;
    Ok(serde_json::to_value(report)?)
}

pub async fn export(state: &AppState, params: &Value) -> catalog_core::Result<Value> {
    let path = require_backup_path(params, state.catalog.root())?;
    let count = state.catalog.export_json(&path).await?;
    Ok(json!({ "path": path, "exported_count": count }))
}

pub async fn import(state: &AppState, params: &Value) -> catalog_core::Result<Value> {
    let path = require_backup_path(params, state.catalog.root())?;
    let report = state.catalog.import_json(&path).await?;
    Ok(serde_json::to_value(report)?)
}

pub async fn status(state: &AppState, _params: &Value) -> catalog_core::Result<Value> {
    let status = state.catalog.status().await?;
    Ok(serde_json::to_value(status)?)
}
