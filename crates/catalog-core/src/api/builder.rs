//! Builder for configuring Catalog initialization.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::api::maintenance::rebuild_from_store;
use crate::api::state::CatalogState;
use crate::autocomplete::AutocompleteEngine;
use crate::cancel::CancellationToken;
use crate::config::CatalogConfig;
use crate::db::CatalogDb;
use crate::error::{CatalogError, Result};
use crate::index::SearchIndex;
use crate::search::{LatestQuery, SearchExecutor};
use crate::store::RecordStore;
use crate::Catalog;

/// Builder for configuring Catalog initialization.
///
/// # Example
///
/// ```rust,no_run
/// use catalog_core::{Catalog, CatalogConfig};
///
/// # async fn run() -> catalog_core::Result<()> {
/// let catalog = Catalog::builder("./my-catalog")
///     .auto_create_dirs(true)
///     .config(CatalogConfig::default())
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct CatalogBuilder {
    root: PathBuf,
    config: CatalogConfig,
    auto_create_dirs: bool,
    background_refresh: bool,
}

impl CatalogBuilder {
    /// Create a new builder for the catalog rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config: CatalogConfig::default(),
            auto_create_dirs: true,
            background_refresh: true,
        }
    }

    pub fn config(mut self, config: CatalogConfig) -> Self {
        self.config = config;
        self
    }

    /// Create the catalog root if it doesn't exist.
    ///
    /// Default: `true`
    pub fn auto_create_dirs(mut self, enable: bool) -> Self {
        self.auto_create_dirs = enable;
        self
    }

    /// Run the periodic autocomplete refresh loop.
    ///
    /// When disabled, suggestions are only rebuilt by
    /// [`Catalog::refresh_suggestions`].
    ///
    /// Default: `true`
    pub fn with_background_refresh(mut self, enable: bool) -> Self {
        self.background_refresh = enable;
        self
    }

    /// Open the catalog.
    ///
    /// Fails if another process has the catalog open. When the search index
    /// had to be created for an existing store, it is rebuilt before this
    /// returns.
    pub async fn build(self) -> Result<Catalog> {
        self.config.validate()?;

        if !self.root.exists() {
            if self.auto_create_dirs {
                std::fs::create_dir_all(&self.root).map_err(|e| CatalogError::Io {
                    message: format!("Failed to create catalog root: {}", self.root.display()),
                    path: Some(self.root.clone()),
                    source: Some(e),
                })?;
            } else {
                return Err(CatalogError::Config {
                    message: format!("Catalog root does not exist: {}", self.root.display()),
                });
            }
        }

        let root = self.root.clone();
        let config = self.config.clone();
        let state = tokio::task::spawn_blocking(move || open_state(root, config))
            .await
            .map_err(|e| CatalogError::TaskFailed {
                message: format!("Catalog open task failed: {}", e),
            })??;
        let state = Arc::new(state);

        if self.background_refresh {
            state.autocomplete.init();
        }

        info!("Opened dataset catalog at {}", self.root.display());
        Ok(Catalog { inner: state })
    }
}

/// Open the database and wire up the components. Runs on the blocking pool.
fn open_state(root: PathBuf, config: CatalogConfig) -> Result<CatalogState> {
    let db = Arc::new(CatalogDb::open(&root)?);
    let index = Arc::new(SearchIndex::new(Arc::clone(&db), config.field_weights.clone()));
    let store = Arc::new(RecordStore::new(Arc::clone(&index)));
    let autocomplete = Arc::new(AutocompleteEngine::new(
        Arc::clone(&store),
        config.autocomplete_refresh_interval,
    ));

    let state = CatalogState {
        db,
        store,
        executor: SearchExecutor::new(index),
        autocomplete,
        latest: LatestQuery::new(),
        config,
    };

    if state.db.index_created() && state.store.count()? > 0 {
        info!("Search index missing for an existing store; rebuilding");
        let report = rebuild_from_store(&state, &CancellationToken::new())?;
        if !report.is_clean() {
            warn!("{} datasets could not be indexed", report.errors.len());
        }
    }

    if let Err(e) = state.autocomplete.refresh() {
        warn!("Initial autocomplete refresh failed: {}", e);
    }

    Ok(state)
}
