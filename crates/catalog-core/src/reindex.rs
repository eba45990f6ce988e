//! Full index rebuilds.
//!
//! A rebuild replaces the whole index inside one write transaction. Readers
//! keep seeing the old index until it commits. A failing source or a
//! cancellation rolls everything back.

use crate::cancel::CancellationToken;
use crate::error::{CatalogError, Result};
use crate::index::{IndexEntry, SearchIndex};
use crate::record::Record;
use crate::store::SourceRecord;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

/// A record that could not be indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexError {
    pub id: String,
    pub message: String,
}

/// Outcome of a rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexReport {
    pub success_count: usize,
    pub errors: Vec<ReindexError>,
}

impl ReindexReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Rebuilds the index from a record source.
pub struct Reindexer<'a> {
    index: &'a SearchIndex,
}

impl<'a> Reindexer<'a> {
    pub fn new(index: &'a SearchIndex) -> Self {
        Self { index }
    }

    /// Rebuild inside the caller's write transaction.
    ///
    /// Records that fail validation are reported and skipped; the rest are
    /// indexed. An `Err` from `source` or a cancellation aborts with an error,
    /// and the caller's transaction must then be rolled back.
    pub fn rebuild_in<I>(
        &self,
        conn: &Connection,
        source: I,
        cancel: &CancellationToken,
    ) -> Result<ReindexReport>
    where
        I: IntoIterator<Item = Result<SourceRecord>>,
    {
        let start = Instant::now();
        self.index.reset_in(conn)?;

        let mut report = ReindexReport::default();
        for item in source {
            cancel.check()?;
            let SourceRecord { id, payload } = item?;

            match parse_source(&id, &payload) {
                Ok(record) => {
                    self.index.upsert_in(conn, &IndexEntry::from_record(&record))?;
                    report.success_count += 1;
                }
                Err(e) => {
                    warn!("Skipping dataset {} during reindex: {}", id, e);
                    report.errors.push(ReindexError {
                        id,
                        message: e.to_string(),
                    });
                }
            }
        }
        cancel.check()?;

        info!(
            "Rebuilt search index: {} indexed, {} errors in {:.2}s",
            report.success_count,
            report.errors.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(report)
    }

    /// Rebuild from an external source in a transaction of its own, then
    /// optimize the fresh index.
    pub fn rebuild_all<I>(&self, source: I, cancel: &CancellationToken) -> Result<ReindexReport>
    where
        I: IntoIterator<Item = Result<SourceRecord>>,
    {
        let report = self
            .index
            .db()
            .write(|conn| self.rebuild_in(conn, source, cancel))?;
        self.index.optimize()?;
        Ok(report)
    }
}

/// Validate a source row. The payload's own id, when present, must match.
fn parse_source(id: &str, payload: &str) -> Result<Record> {
    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| CatalogError::validation(Some(id), "record", format!("invalid JSON: {}", e)))?;
    let mut record = Record::from_value(value, Some(id))?;

    if record.id.is_empty() {
        record.id = id.to_string();
    } else if record.id != id {
        return Err(CatalogError::validation(
            Some(id),
            "id",
            format!("payload id {} does not match row id", record.id),
        ));
    }
    record.validate()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldWeights;
    use crate::db::CatalogDb;
    use crate::index::{IndexColumn, IndexField, MatchExpression};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_test_index() -> (SearchIndex, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(CatalogDb::open(temp_dir.path()).unwrap());
        (SearchIndex::new(db, FieldWeights::default()), temp_dir)
    }

    fn source(id: &str, name: &str) -> Result<SourceRecord> {
        Ok(SourceRecord {
            id: id.to_string(),
            payload: serde_json::json!({
                "name": name,
                "description": "desc",
                "source": "src",
                "date_created": "2024-01-01"
            })
            .to_string(),
        })
    }

    fn ids(index: &SearchIndex) -> Vec<String> {
        index
            .search(&MatchExpression::all(), None)
            .unwrap()
            .into_iter()
            .map(|h| h.id)
            .collect()
    }

    #[test]
    fn test_rebuild_replaces_index() {
        let (index, _temp) = create_test_index();
        index
            .upsert(&IndexEntry::new("stale").with_field(IndexColumn::Name, IndexField::Scalar("old".into())))
            .unwrap();

        let report = Reindexer::new(&index)
            .rebuild_all(vec![source("a", "A"), source("b", "B")], &CancellationToken::new())
            .unwrap();

        assert_eq!(report.success_count, 2);
        assert!(report.is_clean());
        assert_eq!(ids(&index), vec!["a", "b"]);
    }

    #[test]
    fn test_bad_records_are_collected() {
        let (index, _temp) = create_test_index();
        let bad_date = Ok(SourceRecord {
            id: "bad-date".into(),
            payload: r#"{"name":"n","description":"d","source":"s","date_created":"01/02/2024"}"#.into(),
        });
        let not_json = Ok(SourceRecord {
            id: "not-json".into(),
            payload: "{".into(),
        });

        let report = Reindexer::new(&index)
            .rebuild_all(
                vec![source("a", "A"), bad_date, not_json, source("z", "Z")],
                &CancellationToken::new(),
            )
            .unwrap();

        assert_eq!(report.success_count, 2);
        let failed: Vec<_> = report.errors.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(failed, vec!["bad-date", "not-json"]);
        assert!(report.errors[0].message.contains("date_created"));
        assert_eq!(ids(&index), vec!["a", "z"]);
    }

    #[test]
    fn test_source_failure_keeps_old_index() {
        let (index, _temp) = create_test_index();
        Reindexer::new(&index)
            .rebuild_all(vec![source("old", "Old")], &CancellationToken::new())
            .unwrap();

        let failing = vec![
            source("new", "New"),
            Err(CatalogError::Store {
                message: "disk went away".into(),
                source: None,
            }),
        ];
        let err = Reindexer::new(&index)
            .rebuild_all(failing, &CancellationToken::new())
            .unwrap_err();

        assert!(matches!(err, CatalogError::Store { .. }));
        assert_eq!(ids(&index), vec!["old"]);
    }

    #[test]
    fn test_cancel_keeps_old_index() {
        let (index, _temp) = create_test_index();
        Reindexer::new(&index)
            .rebuild_all(vec![source("old", "Old")], &CancellationToken::new())
            .unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let source_iter = (0..10).map(move |i| {
            if i == 3 {
                trigger.cancel();
            }
            source(&format!("new-{}", i), "New")
        });

        let err = Reindexer::new(&index).rebuild_all(source_iter, &cancel).unwrap_err();
        assert!(matches!(err, CatalogError::Cancelled));
        assert_eq!(ids(&index), vec!["old"]);
    }

    #[test]
    fn test_mismatched_payload_id_is_reported() {
        let (index, _temp) = create_test_index();
        let mismatched = Ok(SourceRecord {
            id: "row".into(),
            payload: r#"{"id":"other","name":"n","description":"d","source":"s","date_created":"2024-01-01"}"#.into(),
        });

        let report = Reindexer::new(&index)
            .rebuild_all(vec![mismatched], &CancellationToken::new())
            .unwrap();
        assert_eq!(report.success_count, 0);
        assert_eq!(report.errors[0].id, "row");
    }
}
