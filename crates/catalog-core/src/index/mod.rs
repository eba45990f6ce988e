//! Full-text search index over dataset records.
//!
//! The index is a pair of FTS5 tables living in the same database as the
//! record store: a stemmed table for ranked word matching and an unstemmed
//! twin so partly typed words still find their completions. Both are a pure
//! projection of the store: every entry can be rebuilt from the store's rows,
//! and neither is read as a source of record data.

pub mod entry;
pub mod fts5;
pub mod query;
pub mod score;

pub use entry::{IndexColumn, IndexEntry, IndexField};
pub use query::{MatchExpression, MatchTerm};
pub use score::RelevanceScore;

use crate::config::{FieldWeights, IndexConfig};
use crate::db::CatalogDb;
use crate::error::Result;
use fts5::{corruption_or_store, Fts5Config, Fts5Manager};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// One ranked index match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHit {
    pub id: String,
    pub score: RelevanceScore,
    /// Excerpt of the best matching column with matches bracketed.
    pub snippet: String,
}

/// The search index.
///
/// Methods suffixed `_in` run on a connection the caller already holds inside
/// a transaction; the others open their own.
pub struct SearchIndex {
    db: Arc<CatalogDb>,
    fts5_config: Fts5Config,
    words_config: Fts5Config,
    weights: FieldWeights,
}

impl SearchIndex {
    pub fn new(db: Arc<CatalogDb>, weights: FieldWeights) -> Self {
        Self {
            db,
            fts5_config: Fts5Config::default(),
            words_config: Fts5Config::words(),
            weights,
        }
    }

    fn table(&self) -> &str {
        &self.fts5_config.table_name
    }

    fn words_table(&self) -> &str {
        &self.words_config.table_name
    }

    fn manager(&self) -> Fts5Manager<'_> {
        Fts5Manager::new(&self.fts5_config)
    }

    /// Managers for both tables, stemmed first.
    fn managers(&self) -> [Fts5Manager<'_>; 2] {
        [
            Fts5Manager::new(&self.fts5_config),
            Fts5Manager::new(&self.words_config),
        ]
    }

    /// Insert or replace the entry for `entry.id`.
    pub fn upsert(&self, entry: &IndexEntry) -> Result<()> {
        self.db.write(|conn| self.upsert_in(conn, entry))
    }

    /// Remove the entry for `id`. Removing an absent id is a no-op.
    pub fn remove(&self, id: &str) -> Result<()> {
        self.db.write(|conn| self.remove_in(conn, id).map(|_| ()))
    }

    pub fn upsert_in(&self, conn: &Connection, entry: &IndexEntry) -> Result<()> {
        self.remove_in(conn, &entry.id)?;

        let [name, description, source, file_format, data_types, used_in_projects] =
            entry.flattened();
        for table in [self.table(), self.words_table()] {
            conn.execute(
                &format!(
                    "INSERT INTO {} (id, name, description, source, file_format, data_types, used_in_projects)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    table
                ),
                params![
                    entry.id,
                    name,
                    description,
                    source,
                    file_format,
                    data_types,
                    used_in_projects
                ],
            )?;
        }

        debug!("Indexed dataset: {}", entry.id);
        Ok(())
    }

    /// Returns whether an entry was removed.
    pub fn remove_in(&self, conn: &Connection, id: &str) -> Result<bool> {
        conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", self.words_table()),
            params![id],
        )?;
        let removed = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", self.table()),
            params![id],
        )?;
        Ok(removed > 0)
    }

    /// Ranked matches for `expression`, best first, ties by ascending id.
    ///
    /// The expression runs against both tables; an entry matched by either
    /// keeps its better score and the snippet that came with it.
    ///
    /// An empty expression lists every entry unranked, ordered by id.
    pub fn search(&self, expression: &MatchExpression, limit: Option<usize>) -> Result<Vec<IndexHit>> {
        self.db.read(|conn| self.search_in(conn, expression, limit))
    }

    pub fn search_in(
        &self,
        conn: &Connection,
        expression: &MatchExpression,
        limit: Option<usize>,
    ) -> Result<Vec<IndexHit>> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        if expression.is_empty() {
            return Ok(self
                .all_ids_in(conn, limit)?
                .into_iter()
                .map(|id| IndexHit {
                    id,
                    score: RelevanceScore::UNRANKED,
                    snippet: String::new(),
                })
                .collect());
        }

        let weights = self.bm25_weights();
        let arm = |table: &str| {
            format!(
                "SELECT id, bm25({table}, 0.0, {weights}) AS score,
                        snippet({table}, -1, ?2, ?3, ?4, {tokens}) AS excerpt
                 FROM {table}
                 WHERE {table} MATCH ?1",
                table = table,
                weights = weights,
                tokens = IndexConfig::SNIPPET_TOKENS,
            )
        };
        // SQLite takes bare columns of a MIN() aggregate from the minimal row,
        // so `excerpt` belongs to the best-scoring table.
        let sql = format!(
            "SELECT id, MIN(score) AS best, excerpt
             FROM ({} UNION ALL {})
             GROUP BY id
             ORDER BY best, id
             LIMIT ?5",
            arm(self.table()),
            arm(self.words_table()),
        );

        let mut stmt = conn.prepare(&sql).map_err(corruption_or_store)?;
        let rows = stmt
            .query_map(
                params![
                    expression.as_str(),
                    IndexConfig::SNIPPET_OPEN,
                    IndexConfig::SNIPPET_CLOSE,
                    IndexConfig::SNIPPET_ELLIPSIS,
                    limit
                ],
                |row| {
                    Ok(IndexHit {
                        id: row.get(0)?,
                        score: RelevanceScore::from_raw(row.get(1)?),
                        snippet: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    })
                },
            )
            .map_err(corruption_or_store)?;

        let mut hits = Vec::new();
        for row in rows {
            hits.push(row.map_err(corruption_or_store)?);
        }

        debug!("Index query {} matched {} entries", expression, hits.len());
        Ok(hits)
    }

    /// Every indexed id, ascending.
    pub fn all_ids(&self) -> Result<Vec<String>> {
        self.db.read(|conn| self.all_ids_in(conn, -1))
    }

    fn all_ids_in(&self, conn: &Connection, limit: i64) -> Result<Vec<String>> {
        let mut stmt = conn
            .prepare(&format!("SELECT id FROM {} ORDER BY id LIMIT ?1", self.table()))
            .map_err(corruption_or_store)?;
        let rows = stmt
            .query_map([limit], |row| row.get(0))
            .map_err(corruption_or_store)?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row.map_err(corruption_or_store)?);
        }
        Ok(ids)
    }

    pub fn count(&self) -> Result<usize> {
        self.db.read(|conn| Ok(self.manager().get_stats(conn)?.row_count))
    }

    /// Drop every entry, inside the caller's transaction.
    pub fn reset_in(&self, conn: &Connection) -> Result<()> {
        self.managers().iter().try_for_each(|m| m.reset(conn))
    }

    pub fn optimize(&self) -> Result<()> {
        self.db
            .with_writer(|conn| self.managers().iter().try_for_each(|m| m.optimize(conn)))
    }

    /// Check the index structure; fails with `IndexCorruption` when broken.
    pub fn integrity_check(&self) -> Result<()> {
        self.db.with_writer(|conn| {
            self.managers()
                .iter()
                .try_for_each(|m| m.integrity_check(conn))
        })
    }

    pub(crate) fn db(&self) -> &Arc<CatalogDb> {
        &self.db
    }

    /// Column weights in table order, formatted for `bm25()`.
    fn bm25_weights(&self) -> String {
        IndexColumn::ALL
            .iter()
            .map(|column| {
                let weight = match column {
                    IndexColumn::Name => self.weights.name,
                    IndexColumn::Description => self.weights.description,
                    IndexColumn::Source => self.weights.source,
                    IndexColumn::FileFormat => self.weights.file_format,
                    IndexColumn::DataTypes => self.weights.data_types,
                    IndexColumn::UsedInProjects => self.weights.used_in_projects,
                };
                format!("{:.4}", weight)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
