//! JSON-RPC request handlers, split by domain.

mod maintenance;
mod records;
mod search;
mod shared;

pub(crate) use shared::{get_count_param, get_str_param, require_backup_path, require_str_param};

use crate::server::AppState;
use crate::wrapper::wrap_response;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// JSON-RPC code for an unknown method.
const METHOD_NOT_FOUND: i32 = -32601;

// ============================================================================
// JSON-RPC types
// ============================================================================

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
            id,
        }
    }

    /// Error response carrying the record id the error is about, if any.
    fn from_catalog_error(id: Option<Value>, err: &catalog_core::CatalogError) -> Self {
        let mut response = Self::error(id, err.to_rpc_error_code(), err.to_string());
        if let (Some(error), Some(record_id)) = (response.error.as_mut(), err.record_id()) {
            error.data = Some(json!({ "id": record_id }));
        }
        response
    }
}

// ============================================================================
// HTTP endpoints
// ============================================================================

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Main JSON-RPC handler.
pub async fn handle_rpc(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let method = &request.method;
    let params = request.params.unwrap_or(Value::Object(Default::default()));
    let id = request.id.clone();

    debug!("RPC call: {}({:?})", method, params);

    // Handle built-in methods
    if method == "health_check" {
        return (
            StatusCode::OK,
            Json(JsonRpcResponse::success(id, json!({"status": "ok"}))),
        );
    }

    let Some(result) = dispatch_method(&state, method, &params).await else {
        warn!("Method not found: {}", method);
        return (
            StatusCode::OK,
            Json(JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            )),
        );
    };

    match result {
        Ok(value) => {
            let wrapped = wrap_response(method, value);
            (StatusCode::OK, Json(JsonRpcResponse::success(id, wrapped)))
        }
        Err(e) => {
            error!("RPC error for {}: {}", method, e);
            (
                StatusCode::OK,
                Json(JsonRpcResponse::from_catalog_error(id, &e)),
            )
        }
    }
}

// ============================================================================
// Method dispatcher
// ============================================================================

/// Dispatch a method call to the appropriate domain handler.
///
/// Returns `None` for an unknown method.
async fn dispatch_method(
    state: &AppState,
    method: &str,
    params: &Value,
) -> Option<catalog_core::Result<Value>> {
    let result = match method {
        // Search & Autocomplete
        "search" => search::search(state, params).await,
        "suggest" => search::suggest(state, params).await,

        // Records
        "get" => records::get(state, params).await,
        "save" => records::save(state, params).await,
        "delete" => records::delete(state, params).await,

        // Maintenance
        "reindex_all" => maintenance::reindex_all(state, params).await,
        "verify" => maintenance::verify(state, params).await,
        "export" => maintenance::export(state, params).await,
        "import" => maintenance::import(state, params).await,
        "status" => maintenance::status(state, params).await,

        _ => return None,
    };
    Some(result)
}

// ============================================================================
// Tests
// ============================================================================
