//! Query execution: index lookup, ranking and the join back to the store.

mod filter;
pub mod latest;

pub use latest::{LatestQuery, QueryTicket};

use crate::config::IndexConfig;
use crate::error::Result;
use crate::index::{IndexColumn, IndexHit, MatchExpression, MatchTerm, RelevanceScore, SearchIndex};
use crate::query::{FieldFilter, FilterField, ParsedQuery, TextTerm};
use crate::record::Record;
use crate::store;
use filter::{is_index_filter, record_matches};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// A search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub snippet: String,
    /// Raw BM25 score; lower is better. `0` for browse results.
    pub score: RelevanceScore,
    pub record: Record,
}

impl SearchHit {
    fn ranked(hit: IndexHit, record: Record) -> Self {
        Self {
            id: hit.id,
            name: record.name.clone(),
            snippet: hit.snippet,
            score: hit.score,
            record,
        }
    }

    fn unranked(record: Record) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            snippet: leading_text(&record.description, IndexConfig::BROWSE_SNIPPET_CHARS),
            score: RelevanceScore::UNRANKED,
            record,
        }
    }
}

/// How a parsed query is answered.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    /// Free text OR'ed, AND the column equality filters. Empty means browse.
    pub expression: MatchExpression,
    /// Filters checked on the joined records.
    pub record_filters: Vec<FieldFilter>,
}

impl SearchPlan {
    pub fn from_query(query: &ParsedQuery) -> Self {
        let terms: Vec<MatchTerm<'_>> = query
            .terms
            .iter()
            .map(|term| match term {
                TextTerm::Word(word) => MatchTerm::Prefix(word),
                TextTerm::Phrase(phrase) => MatchTerm::Phrase(phrase),
            })
            .collect();

        let mut columns: Vec<(IndexColumn, &str)> = Vec::new();
        let mut record_filters = Vec::new();
        for filter in &query.filters {
            match filter.field {
                FilterField::Column(column) if is_index_filter(filter) => {
                    columns.push((column, filter.value.as_str()));
                }
                _ => record_filters.push(filter.clone()),
            }
        }

        Self {
            expression: MatchExpression::build(&terms, &columns),
            record_filters,
        }
    }

    fn accepts(&self, record: &Record) -> bool {
        self.record_filters.iter().all(|f| record_matches(f, record))
    }
}

/// Runs parsed queries against the index and store.
pub struct SearchExecutor {
    index: Arc<SearchIndex>,
}

impl SearchExecutor {
    pub fn new(index: Arc<SearchIndex>) -> Self {
        Self { index }
    }

    /// Execute `query`, returning at most `limit` hits.
    ///
    /// With no usable terms or index filters the result is every record
    /// (after record filters), most recently updated first with ties by id.
    /// Otherwise hits are ordered best match first with ties by id. Ranked
    /// ids whose store row is gone are dropped.
    ///
    /// The index lookup and the store join read one snapshot.
    pub fn execute(&self, query: &ParsedQuery, limit: usize) -> Result<Vec<SearchHit>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let plan = SearchPlan::from_query(query);
        // Record filters run after the fetch, so the fetch can't be capped.
        let fetch_limit = plan.record_filters.is_empty().then_some(limit);

        let hits = self.index.db().read(|conn| {
            let joined: Vec<SearchHit> = if plan.expression.is_empty() {
                store::browse_in(conn, fetch_limit)?
                    .into_iter()
                    .map(SearchHit::unranked)
                    .collect()
            } else {
                let ranked = self.index.search_in(conn, &plan.expression, fetch_limit)?;
                let ids: Vec<String> = ranked.iter().map(|hit| hit.id.clone()).collect();
                let mut records = store::get_many_in(conn, &ids)?;

                ranked
                    .into_iter()
                    .filter_map(|hit| match records.remove(&hit.id) {
                        Some(record) => Some(SearchHit::ranked(hit, record)),
                        None => {
                            debug!("Dropping index hit {} without a stored record", hit.id);
                            None
                        }
                    })
                    .collect()
            };

            Ok(joined
                .into_iter()
                .filter(|hit| plan.accepts(&hit.record))
                .take(limit)
                .collect::<Vec<_>>())
        })?;

        debug!(
            "Search {:?} returned {} hits in {:.2}ms",
            plan.expression.as_str(),
            hits.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(hits)
    }
}

/// The first `max_chars` characters of `text`, with an ellipsis if cut.
fn leading_text(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", text[..cut].trim_end(), IndexConfig::SNIPPET_ELLIPSIS),
        None => text.to_string(),
    }
}
