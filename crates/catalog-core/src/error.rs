//! Error types for the dataset catalog.
//!
//! Every error that reaches a caller names the record id and/or field it is
//! about, so a front end can render an actionable message.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    // Record errors
    #[error(
        "Validation error for {field} on {}: {message}",
        .id.as_deref().unwrap_or("new record")
    )]
    Validation {
        /// Record the error belongs to (`None` when the id is not known yet).
        id: Option<String>,
        field: String,
        message: String,
    },

    #[error("Dataset not found: {id}")]
    NotFound { id: String },

    // Storage errors
    #[error("Store error: {message}")]
    Store {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("Search index is corrupt: {message}")]
    IndexCorruption { message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid parameters: {message}")]
    InvalidParams { message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Background task failed: {message}")]
    TaskFailed { message: String },
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        CatalogError::Store {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<tokio::task::JoinError> for CatalogError {
    fn from(err: tokio::task::JoinError) -> Self {
        CatalogError::TaskFailed {
            message: err.to_string(),
        }
    }
}

impl CatalogError {
    /// Create a validation error for a record field.
    pub fn validation(
        id: Option<&str>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CatalogError::Validation {
            id: id.map(String::from),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a not-found error for a record id.
    pub fn not_found(id: impl Into<String>) -> Self {
        CatalogError::NotFound { id: id.into() }
    }

    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        CatalogError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Convert to a JSON-RPC error code.
    ///
    /// Custom error codes (application-defined, -32000 to -32099):
    /// - -32002: Dataset not found
    /// - -32004: Cancelled
    /// - -32005: Validation error
    /// - -32010: Index corruption (run a full reindex)
    ///
    /// Bad parameters use the standard -32602; everything else maps to
    /// -32603 (internal error).
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            CatalogError::InvalidParams { .. } => -32602,
            CatalogError::NotFound { .. } => -32002,
            CatalogError::Cancelled => -32004,
            CatalogError::Validation { .. } => -32005,
            CatalogError::IndexCorruption { .. } => -32010,
            _ => -32603,
        }
    }

    /// The record id this error is about, if any.
    pub fn record_id(&self) -> Option<&str> {
        match self {
            CatalogError::Validation { id, .. } => id.as_deref(),
            CatalogError::NotFound { id } => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CatalogError::not_found("global-weather");
        assert_eq!(err.to_string(), "Dataset not found: global-weather");

        let err = CatalogError::validation(Some("a"), "date_created", "expected YYYY-MM-DD");
        assert_eq!(
            err.to_string(),
            "Validation error for date_created on a: expected YYYY-MM-DD"
        );

        let err = CatalogError::validation(None, "name", "required");
        assert_eq!(
            err.to_string(),
            "Validation error for name on new record: required"
        );
    }

    #[test]
    fn test_rpc_error_codes() {
        assert_eq!(CatalogError::not_found("x").to_rpc_error_code(), -32002);
        assert_eq!(CatalogError::Cancelled.to_rpc_error_code(), -32004);
        assert_eq!(
            CatalogError::validation(None, "name", "required").to_rpc_error_code(),
            -32005
        );
        assert_eq!(
            CatalogError::IndexCorruption {
                message: "bad".into()
            }
            .to_rpc_error_code(),
            -32010
        );
        assert_eq!(
            CatalogError::InvalidParams {
                message: "limit".into()
            }
            .to_rpc_error_code(),
            -32602
        );
        assert_eq!(
            CatalogError::Config {
                message: "bad".into()
            }
            .to_rpc_error_code(),
            -32603
        );
    }

    #[test]
    fn test_record_id() {
        assert_eq!(CatalogError::not_found("x").record_id(), Some("x"));
        assert_eq!(CatalogError::Cancelled.record_id(), None);
    }
}
