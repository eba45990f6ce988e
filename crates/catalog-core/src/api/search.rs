//! Search and suggestion methods on Catalog.

use crate::autocomplete::SuggestField;
use crate::error::Result;
use crate::query::parse_query;
use crate::search::SearchHit;
use crate::Catalog;
use std::future::Future;
use tracing::{debug, error};

impl Catalog {
    // ========================================
    // Search Methods
    // ========================================

    /// Search the catalog.
    ///
    /// Never fails: an empty query browses the most recently updated
    /// records, and a failing lookup is logged and answered with no hits.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        match self.try_search(query, limit).await {
            Ok(hits) => hits,
            Err(e) => {
                error!("Search for {:?} failed: {}", query, e);
                Vec::new()
            }
        }
    }

    /// Search the catalog, surfacing store and index errors.
    pub async fn try_search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let parsed = parse_query(query);
        self.inner
            .blocking(move |state| state.executor.execute(&parsed, limit))
            .await
    }

    /// Search for as-you-type input.
    ///
    /// The call takes its place in line immediately, before the returned
    /// future is first polled. It resolves to `None` when a later
    /// `search_latest` call was made while it ran; only the latest call's
    /// hits should be shown.
    pub fn search_latest(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Option<Vec<SearchHit>>> + Send + 'static {
        let ticket = self.inner.latest.issue();
        let catalog = self.clone();
        let query = query.to_string();

        async move {
            let hits = catalog.search(&query, limit).await;
            if catalog.inner.latest.is_current(ticket) {
                Some(hits)
            } else {
                debug!("Discarding superseded results for {:?}", query);
                None
            }
        }
    }

    // ========================================
    // Autocomplete Methods
    // ========================================

    /// Suggestions for a partially typed value.
    ///
    /// Answers from the latest suggestion snapshot and never waits for a
    /// running refresh.
    pub fn suggest(&self, field: SuggestField, prefix: &str, limit: usize) -> Vec<String> {
        self.inner.autocomplete.suggest(field, prefix, limit)
    }

    /// Rebuild the suggestion snapshot now.
    pub async fn refresh_suggestions(&self) -> Result<()> {
        self.inner
            .blocking(|state| state.autocomplete.refresh())
            .await
    }
}
