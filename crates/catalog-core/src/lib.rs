//! Catalog Core - Headless library for cataloging and searching dataset metadata.
//!
//! Records describing external datasets live in an authoritative store; a
//! derived full-text index answers free-text and field-filtered queries with
//! BM25 ranking, and an autocomplete engine suggests projects, formats and
//! data types from what is already in the catalog. It can be used
//! programmatically without any HTTP/RPC layer.
//!
//! # Example
//!
//! ```rust,no_run
//! use catalog_core::{Catalog, Record};
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> catalog_core::Result<()> {
//!     let catalog = Catalog::new("/path/to/catalog").await?;
//!
//!     let record = Record::draft(
//!         "Global Weather Data",
//!         "Daily temperature and precipitation",
//!         "https://example.org/weather.csv",
//!         NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
//!     );
//!     let id = catalog.save(None, record).await?;
//!
//!     for hit in catalog.search("weather", 10).await {
//!         println!("{} {}", hit.id, hit.snippet);
//!     }
//!
//!     catalog.delete(&id).await?;
//!     catalog.shutdown().await
//! }
//! ```

pub mod autocomplete;
pub mod backup;
pub mod cancel;
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod query;
pub mod record;
pub mod reindex;
pub mod search;
pub mod store;

mod api;

// Re-export commonly used types
pub use api::{CatalogBuilder, CatalogStatus, ConsistencyReport, ReindexHandle};
pub use autocomplete::{canonicalize, AutocompleteEngine, EnginePhase, SuggestField};
pub use backup::ImportReport;
pub use cancel::{CancellationToken, CancelledError};
pub use config::{CatalogConfig, FieldWeights};
pub use error::{CatalogError, Result};
pub use index::{IndexEntry, IndexField, RelevanceScore, SearchIndex};
pub use query::{parse_query, FieldFilter, FilterOp, ParsedQuery, TextTerm};
pub use record::Record;
pub use reindex::{ReindexError, ReindexReport};
pub use search::SearchHit;
pub use store::RecordStore;

use std::path::PathBuf;
use std::sync::Arc;

use api::CatalogState;

/// Main entry point for a dataset catalog.
///
/// Owns the database, the search index and the autocomplete engine. Cloning
/// is cheap and every clone talks to the same catalog. Only one process may
/// have a catalog open at a time.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogState>,
}

impl Catalog {
    /// Create a builder for Catalog.
    ///
    /// Use the builder to pass a [`CatalogConfig`] or to turn off the
    /// background suggestion refresh.
    pub fn builder(root: impl Into<PathBuf>) -> CatalogBuilder {
        CatalogBuilder::new(root)
    }

    /// Open (or create) the catalog at `root` with the default configuration.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        CatalogBuilder::new(root).build().await
    }

    /// Directory the catalog lives in.
    pub fn root(&self) -> &std::path::Path {
        self.inner.db.root()
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.inner.config
    }
}
