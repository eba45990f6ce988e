//! Integration tests for the catalog-rpc JSON-RPC server.
//!
//! These tests drive the router in-process and verify that every method
//! returns the envelopes the front end expects.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use catalog_core::Catalog;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

async fn create_test_router(temp_dir: &TempDir) -> Router {
    let catalog = Catalog::builder(temp_dir.path().join("catalog"))
        .with_background_refresh(false)
        .build()
        .await
        .expect("catalog should open");
    catalog_rpc::build_router(catalog)
}

/// Make an RPC call and return the full JSON-RPC payload.
async fn rpc_call_raw(app: &Router, method: &str, params: Value) -> Value {
    let request = Request::builder()
        .method("POST")
        .uri("/rpc")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": 1
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Make an RPC call, returning the result or the error object.
async fn rpc_call(app: &Router, method: &str, params: Value) -> Result<Value, Value> {
    let json = rpc_call_raw(app, method, params).await;
    if let Some(error) = json.get("error") {
        return Err(error.clone());
    }
    Ok(json.get("result").cloned().unwrap_or(Value::Null))
}

fn weather_record() -> Value {
    json!({
        "name": "Global Weather Stations 2024",
        "description": "Daily weather observations",
        "source": "https://example.org/weather.csv",
        "file_format": "csv",
        "used_in_projects": ["Gideon"],
        "date_created": "2024-01-15"
    })
}

fn hit_ids(result: &Value) -> Vec<String> {
    result["hits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_router(&temp_dir).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");

    let result = rpc_call(&app, "health_check", json!({})).await.unwrap();
    assert_eq!(result["status"], "ok");
}

#[tokio::test]
async fn test_save_search_get_delete() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_router(&temp_dir).await;

    let saved = rpc_call(&app, "save", json!({"record": weather_record()}))
        .await
        .unwrap();
    let id = saved["id"].as_str().unwrap().to_string();
    assert_eq!(id, "global-weather-stations-2024");

    let result = rpc_call(&app, "search", json!({"query": "weather", "limit": 10}))
        .await
        .unwrap();
    assert_eq!(result["success"], true);
    assert_eq!(hit_ids(&result), vec![id.clone()]);
    assert_eq!(result["hits"][0]["name"], "Global Weather Stations 2024");

    let result = rpc_call(&app, "search", json!({"query": "project:gideon"}))
        .await
        .unwrap();
    assert_eq!(hit_ids(&result), vec![id.clone()]);

    let result = rpc_call(&app, "get", json!({"id": id})).await.unwrap();
    assert_eq!(result["record"]["file_format"], "csv");

    let result = rpc_call(&app, "delete", json!({"id": id})).await.unwrap();
    assert_eq!(result, json!({"success": true}));

    let result = rpc_call(&app, "search", json!({"query": "weather"}))
        .await
        .unwrap();
    assert!(hit_ids(&result).is_empty());
}

#[tokio::test]
async fn test_errors_carry_codes_and_ids() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_router(&temp_dir).await;

    let error = rpc_call(&app, "delete", json!({"id": "missing"}))
        .await
        .unwrap_err();
    assert_eq!(error["code"], -32002);
    assert_eq!(error["data"]["id"], "missing");

    let mut bad = weather_record();
    bad["date_created"] = json!("January 2024");
    let error = rpc_call(&app, "save", json!({"id": "bad", "record": bad}))
        .await
        .unwrap_err();
    assert_eq!(error["code"], -32005);
    assert!(error["message"].as_str().unwrap().contains("date_created"));

    let error = rpc_call(&app, "search", json!({"limit": -3})).await.unwrap_err();
    assert_eq!(error["code"], -32602);

    let error = rpc_call(&app, "suggest", json!({"field": "color"}))
        .await
        .unwrap_err();
    assert_eq!(error["code"], -32602);

    let error = rpc_call(&app, "no_such_method", json!({})).await.unwrap_err();
    assert_eq!(error["code"], -32601);
}

#[tokio::test]
async fn test_reindex_verify_and_status() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_router(&temp_dir).await;
    rpc_call(&app, "save", json!({"record": weather_record()}))
        .await
        .unwrap();

    let report = rpc_call(&app, "reindex_all", json!({})).await.unwrap();
    assert_eq!(report["success_count"], 1);
    assert_eq!(report["errors"], json!([]));

    let report = rpc_call(&app, "verify", json!({})).await.unwrap();
    assert_eq!(report["integrity_ok"], true);
    assert_eq!(report["missing_from_index"], json!([]));
    assert_eq!(report["orphaned_in_index"], json!([]));

    let result = rpc_call(&app, "status", json!({})).await.unwrap();
    assert_eq!(result["status"]["record_count"], 1);
    assert_eq!(result["status"]["index_count"], 1);
}

#[tokio::test]
async fn test_suggest_from_catalog_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = Catalog::builder(temp_dir.path().join("catalog"))
        .with_background_refresh(false)
        .build()
        .await
        .unwrap();
    for projects in [json!(["climate-ml"]), json!(["healthcare-climate"]), json!(["climate-ml"])] {
        let mut record = weather_record();
        record["used_in_projects"] = projects;
        catalog.save_json(record).await.unwrap();
    }
    catalog.refresh_suggestions().await.unwrap();
    let app = catalog_rpc::build_router(catalog);

    let result = rpc_call(&app, "suggest", json!({"field": "project", "prefix": "clim"}))
        .await
        .unwrap();
    assert_eq!(
        result,
        json!({"success": true, "suggestions": ["climate-ml", "healthcare-climate"]})
    );

    let result = rpc_call(&app, "suggest", json!({"field": "format", "prefix": "c", "limit": 1}))
        .await
        .unwrap();
    assert_eq!(result["suggestions"], json!(["CSV"]));
}

#[tokio::test]
async fn test_export_and_import() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_router(&temp_dir).await;

    rpc_call(&app, "save", json!({"record": weather_record()}))
        .await
        .unwrap();

    let result = rpc_call(&app, "export", json!({"path": "backup.json"}))
        .await
        .unwrap();
    assert_eq!(result["exported_count"], 1);
    let written = temp_dir.path().join("catalog/backups/backup.json");
    assert!(written.exists());

    let other_dir = TempDir::new().unwrap();
    let other = create_test_router(&other_dir).await;
    let other_backups = other_dir.path().join("catalog/backups");
    std::fs::create_dir_all(&other_backups).unwrap();
    std::fs::copy(&written, other_backups.join("restore.json")).unwrap();

    let report = rpc_call(&other, "import", json!({"path": "restore.json"}))
        .await
        .unwrap();
    assert_eq!(report["imported_count"], 1);
    assert_eq!(report["errors"], json!([]));

    let result = rpc_call(&other, "search", json!({"query": "weather"}))
        .await
        .unwrap();
    assert_eq!(hit_ids(&result), vec!["global-weather-stations-2024"]);
}

#[tokio::test]
async fn test_backup_paths_outside_catalog_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_router(&temp_dir).await;
    let outside = temp_dir.path().join("outside.json");

    for method in ["export", "import"] {
        for path in [json!("/tmp/x"), json!("../x"), json!(outside)] {
            let error = rpc_call(&app, method, json!({"path": path}))
                .await
                .unwrap_err();
            assert_eq!(error["code"], -32602, "{method} {path}");
        }
    }
    assert!(!outside.exists());
}
