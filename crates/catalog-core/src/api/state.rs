//! Shared catalog state.

use std::sync::Arc;

use crate::autocomplete::AutocompleteEngine;
use crate::config::CatalogConfig;
use crate::db::CatalogDb;
use crate::error::{CatalogError, Result};
use crate::search::{LatestQuery, SearchExecutor};
use crate::store::RecordStore;

/// Everything a catalog instance owns.
///
/// Wrapped in `Arc` so blocking work can be moved onto the tokio blocking
/// pool without borrowing from the `Catalog`.
pub(crate) struct CatalogState {
    pub(crate) db: Arc<CatalogDb>,
    pub(crate) store: Arc<RecordStore>,
    pub(crate) executor: SearchExecutor,
    pub(crate) autocomplete: Arc<AutocompleteEngine>,
    pub(crate) latest: LatestQuery,
    pub(crate) config: CatalogConfig,
}

impl CatalogState {
    /// Run `f` on the blocking pool with a handle to the state.
    pub(crate) async fn blocking<T, F>(self: &Arc<Self>, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&CatalogState) -> Result<T> + Send + 'static,
    {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || f(&state))
            .await
            .map_err(|e| CatalogError::TaskFailed {
                message: format!("Catalog task failed: {}", e),
            })?
    }
}
