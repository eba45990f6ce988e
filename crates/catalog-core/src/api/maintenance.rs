//! Reindex, consistency, backup and lifecycle methods on Catalog.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::state::CatalogState;
use crate::autocomplete::EnginePhase;
use crate::backup::{self, ImportReport};
use crate::cancel::CancellationToken;
use crate::error::{CatalogError, Result};
use crate::index::MatchExpression;
use crate::reindex::{ReindexReport, Reindexer};
use crate::store;
use crate::Catalog;

/// Differences between the store and the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub store_count: usize,
    pub index_count: usize,
    /// Stored ids with no index entry.
    pub missing_from_index: Vec<String>,
    /// Indexed ids with no stored record.
    pub orphaned_in_index: Vec<String>,
    /// Whether the index passed its structural check.
    pub integrity_ok: bool,
    pub integrity_message: Option<String>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.integrity_ok && self.missing_from_index.is_empty() && self.orphaned_in_index.is_empty()
    }
}

/// Snapshot of catalog state for status polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStatus {
    pub root: PathBuf,
    pub record_count: usize,
    pub index_count: usize,
    pub autocomplete: EnginePhase,
}

/// A reindex running in the background.
pub struct ReindexHandle {
    cancel: CancellationToken,
    task: JoinHandle<Result<ReindexReport>>,
}

impl ReindexHandle {
    /// Ask the rebuild to stop. The previous index stays in place.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the rebuild. A cancelled rebuild yields `Cancelled`.
    pub async fn wait(self) -> Result<ReindexReport> {
        self.task.await.map_err(|e| CatalogError::TaskFailed {
            message: format!("Reindex task failed: {}", e),
        })?
    }
}

impl Catalog {
    // ========================================
    // Reindex Methods
    // ========================================

    /// Rebuild the search index from the store.
    ///
    /// Records that fail validation are reported in the result and left out
    /// of the index. A failure leaves the previous index untouched.
    pub async fn reindex_all(&self) -> Result<ReindexReport> {
        let report = self
            .inner
            .blocking(|state| rebuild_from_store(state, &CancellationToken::new()))
            .await?;
        self.inner.autocomplete.request_refresh();
        Ok(report)
    }

    /// Start a cancelable rebuild on the blocking pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_reindex(&self) -> ReindexHandle {
        let cancel = CancellationToken::new();
        let state = Arc::clone(&self.inner);
        let token = cancel.clone();

        let task = tokio::task::spawn_blocking(move || {
            let report = rebuild_from_store(&state, &token)?;
            state.autocomplete.request_refresh();
            Ok(report)
        });

        ReindexHandle { cancel, task }
    }

    // ========================================
    // Consistency Methods
    // ========================================

    /// Compare the store with the index and check the index structure.
    ///
    /// Only reports; `reindex_all` is the repair.
    pub async fn verify(&self) -> Result<ConsistencyReport> {
        self.inner.blocking(verify_state).await
    }

    // ========================================
    // Backup Methods
    // ========================================

    /// Write every record to `path` as a JSON array. Returns the count.
    pub async fn export_json(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref().to_path_buf();
        self.inner
            .blocking(move |state| backup::export_json(&state.store, &path))
            .await
    }

    /// Load records from a JSON array, replacing records with the same id.
    pub async fn import_json(&self, path: impl AsRef<Path>) -> Result<ImportReport> {
        let path = path.as_ref().to_path_buf();
        let report = self
            .inner
            .blocking(move |state| backup::import_json(&state.store, &path))
            .await?;
        self.inner.autocomplete.request_refresh();
        Ok(report)
    }

    // ========================================
    // Lifecycle Methods
    // ========================================

    pub async fn status(&self) -> Result<CatalogStatus> {
        let (record_count, index_count) = self
            .inner
            .blocking(|state| Ok((state.store.count()?, state.store.index().count()?)))
            .await?;

        Ok(CatalogStatus {
            root: self.inner.db.root().to_path_buf(),
            record_count,
            index_count,
            autocomplete: self.inner.autocomplete.phase(),
        })
    }

    /// Stop background work and checkpoint the database.
    ///
    /// The catalog stays usable for direct calls afterwards, but suggestions
    /// are no longer refreshed in the background.
    pub async fn shutdown(&self) -> Result<()> {
        self.inner.autocomplete.shutdown().await;
        self.inner
            .blocking(|state| state.db.checkpoint_wal())
            .await?;
        info!("Catalog at {} shut down", self.inner.db.root().display());
        Ok(())
    }
}

/// Rebuild the index from the store's own rows under the write lock.
pub(crate) fn rebuild_from_store(
    state: &CatalogState,
    cancel: &CancellationToken,
) -> Result<ReindexReport> {
    let index = state.store.index();
    let report = state.db.write(|conn| {
        let rows = store::rows_in(conn)?;
        Reindexer::new(index).rebuild_in(conn, rows.into_iter().map(Ok), cancel)
    })?;

    if let Err(e) = index.optimize() {
        warn!("Index optimize after rebuild failed: {}", e);
    }
    Ok(report)
}

fn verify_state(state: &CatalogState) -> Result<ConsistencyReport> {
    let index = state.store.index();
    let (store_ids, index_ids) = state.db.read(|conn| {
        let store_ids = store::ids_in(conn)?;
        let index_ids: Vec<String> = index
            .search_in(conn, &MatchExpression::all(), None)?
            .into_iter()
            .map(|hit| hit.id)
            .collect();
        Ok((store_ids, index_ids))
    })?;

    let (integrity_ok, integrity_message) = match index.integrity_check() {
        Ok(()) => (true, None),
        Err(e @ CatalogError::IndexCorruption { .. }) => (false, Some(e.to_string())),
        Err(e) => return Err(e),
    };

    // Both lists are sorted by id.
    let missing_from_index = sorted_difference(&store_ids, &index_ids);
    let orphaned_in_index = sorted_difference(&index_ids, &store_ids);

    let report = ConsistencyReport {
        store_count: store_ids.len(),
        index_count: index_ids.len(),
        missing_from_index,
        orphaned_in_index,
        integrity_ok,
        integrity_message,
    };
    if !report.is_consistent() {
        warn!(
            "Catalog inconsistent: {} missing from index, {} orphaned, integrity {}",
            report.missing_from_index.len(),
            report.orphaned_in_index.len(),
            if report.integrity_ok { "ok" } else { "failed" }
        );
    }
    Ok(report)
}

/// Elements of sorted `a` absent from sorted `b`.
fn sorted_difference(a: &[String], b: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut j = 0;
    for id in a {
        while j < b.len() && b[j] < *id {
            j += 1;
        }
        if j >= b.len() || b[j] != *id {
            out.push(id.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sorted_difference() {
        assert_eq!(
            sorted_difference(&ids(&["a", "b", "d"]), &ids(&["b", "c"])),
            ids(&["a", "d"])
        );
        assert!(sorted_difference(&ids(&[]), &ids(&["a"])).is_empty());
        assert_eq!(sorted_difference(&ids(&["a"]), &ids(&[])), ids(&["a"]));
    }
}
