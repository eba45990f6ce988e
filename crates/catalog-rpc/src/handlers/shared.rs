//! Shared handler utilities used across RPC domains.

use catalog_core::config::StoreConfig;
use catalog_core::{CatalogError, Result};
use serde_json::Value;
use std::path::{Component, Path, PathBuf};

/// Extract an optional string parameter, supporting both snake_case and camelCase.
pub(crate) fn get_str_param<'a>(params: &'a Value, snake: &str, camel: &str) -> Option<&'a str> {
    params
        .get(snake)
        .or_else(|| params.get(camel))
        .and_then(|v| v.as_str())
}

/// Extract a required string parameter or return an error.
pub(crate) fn require_str_param(params: &Value, snake: &str, camel: &str) -> Result<String> {
    get_str_param(params, snake, camel)
        .map(String::from)
        .ok_or_else(|| CatalogError::InvalidParams {
            message: format!("Missing required parameter: {}", snake),
        })
}

/// Extract an optional non-negative count parameter.
///
/// Absent or `null` yields `None`; anything but a non-negative integer is an
/// error.
pub(crate) fn get_count_param(params: &Value, snake: &str, camel: &str) -> Result<Option<usize>> {
    match params.get(snake).or_else(|| params.get(camel)) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| CatalogError::InvalidParams {
                message: format!("{} must be a non-negative integer", snake),
            }),
    }
}

/// Resolve a required backup file parameter inside `<root>/backups`.
///
/// Only plain relative names are accepted; absolute paths, drive prefixes
/// and `..` components are rejected.
pub(crate) fn require_backup_path(params: &Value, root: &Path) -> Result<PathBuf> {
    let name = require_str_param(params, "path", "path")?;
    let relative = Path::new(&name);
    let plain = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if name.trim().is_empty() || !plain {
        return Err(CatalogError::InvalidParams {
            message: format!(
                "path must be a file name relative to the {} directory: {}",
                StoreConfig::BACKUP_DIRNAME,
                name
            ),
        });
    }
    Ok(root.join(StoreConfig::BACKUP_DIRNAME).join(relative))
}
