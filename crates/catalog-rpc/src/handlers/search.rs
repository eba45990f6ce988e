//! Search & autocomplete handlers.

use super::{get_count_param, get_str_param, require_str_param};
use crate::server::AppState;
use catalog_core::config::AutocompleteConfig;
use catalog_core::{CatalogError, SuggestField};
use serde_json::Value;

pub async fn search(state: &AppState, params: &Value) -> catalog_core::Result<Value> {
    let query = get_str_param(params, "query", "query").unwrap_or("");
    let limit = get_count_param(params, "limit", "limit")?
        .unwrap_or(state.catalog.config().default_search_limit);

    let hits = state.catalog.search(query, limit).await;
    Ok(serde_json::to_value(hits)?)
}

pub async fn suggest(state: &AppState, params: &Value) -> catalog_core::Result<Value> {
    let field_name = require_str_param(params, "field", "field")?;
    let field = SuggestField::parse(&field_name).ok_or_else(|| CatalogError::InvalidParams {
        message: format!("Unknown suggestion field: {}", field_name),
    })?;
    let prefix = get_str_param(params, "prefix", "prefix").unwrap_or("");
    let limit = get_count_param(params, "limit", "limit")?
        .unwrap_or(AutocompleteConfig::DEFAULT_SUGGESTION_LIMIT);

    let suggestions = state.catalog.suggest(field, prefix, limit);
    Ok(serde_json::to_value(suggestions)?)
}
