//! FTS5 virtual table setup and maintenance.

use crate::config::IndexConfig;
use crate::error::{CatalogError, Result};
use crate::index::entry::IndexColumn;
use rusqlite::{Connection, ErrorCode};
use tracing::{debug, info};

/// Configuration for the FTS5 table.
#[derive(Debug, Clone)]
pub struct Fts5Config {
    /// Name of the FTS5 virtual table.
    pub table_name: String,
    /// Tokenizer configuration.
    pub tokenizer: String,
    /// Prefix lengths to keep dedicated index entries for.
    pub prefix: String,
}

impl Default for Fts5Config {
    fn default() -> Self {
        Self {
            table_name: IndexConfig::TABLE_NAME.to_string(),
            tokenizer: IndexConfig::TOKENIZER.to_string(),
            prefix: IndexConfig::PREFIX_LENGTHS.to_string(),
        }
    }
}

impl Fts5Config {
    /// The unstemmed companion table used for as-you-type prefix matching.
    pub fn words() -> Self {
        Self {
            table_name: IndexConfig::WORDS_TABLE_NAME.to_string(),
            tokenizer: IndexConfig::WORDS_TOKENIZER.to_string(),
            prefix: IndexConfig::PREFIX_LENGTHS.to_string(),
        }
    }
}

/// Manager for FTS5 setup and maintenance.
pub struct Fts5Manager<'a> {
    config: &'a Fts5Config,
}

impl<'a> Fts5Manager<'a> {
    pub fn new(config: &'a Fts5Config) -> Self {
        Self { config }
    }

    /// Check if the FTS5 table exists.
    pub fn table_exists(&self, conn: &Connection) -> Result<bool> {
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [&self.config.table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Create the table if it doesn't exist yet.
    pub fn ensure_setup(&self, conn: &Connection) -> Result<()> {
        if !self.table_exists(conn)? {
            self.create_table(conn)?;
        }
        Ok(())
    }

    /// Create the FTS5 virtual table.
    ///
    /// `id` is stored but not tokenized; every other column is searchable.
    pub fn create_table(&self, conn: &Connection) -> Result<()> {
        let columns: Vec<&str> = IndexColumn::ALL.iter().map(|c| c.column_name()).collect();
        let sql = format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS {} USING fts5(
                id UNINDEXED,
                {},
                tokenize='{}',
                prefix='{}'
            )",
            self.config.table_name,
            columns.join(",\n                "),
            self.config.tokenizer,
            self.config.prefix
        );

        conn.execute(&sql, [])?;
        info!("Created FTS5 table: {}", self.config.table_name);
        Ok(())
    }

    /// Drop and recreate the table, leaving it empty.
    ///
    /// Runs inside the caller's transaction, so a rollback restores the old
    /// table with its contents.
    pub fn reset(&self, conn: &Connection) -> Result<()> {
        conn.execute(&format!("DROP TABLE IF EXISTS {}", self.config.table_name), [])?;
        self.create_table(conn)?;
        debug!("Reset FTS5 table {}", self.config.table_name);
        Ok(())
    }

    /// Merge the index b-trees after bulk changes.
    pub fn optimize(&self, conn: &Connection) -> Result<()> {
        let sql = format!(
            "INSERT INTO {}({}) VALUES('optimize')",
            self.config.table_name, self.config.table_name
        );
        conn.execute(&sql, [])?;
        debug!("Optimized FTS5 index");
        Ok(())
    }

    /// Run FTS5's structural self-check.
    pub fn integrity_check(&self, conn: &Connection) -> Result<()> {
        let sql = format!(
            "INSERT INTO {}({}) VALUES('integrity-check')",
            self.config.table_name, self.config.table_name
        );
        conn.execute(&sql, []).map_err(corruption_or_store)?;
        Ok(())
    }

    /// Get statistics about the FTS5 index.
    pub fn get_stats(&self, conn: &Connection) -> Result<Fts5Stats> {
        let row_count: usize = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.config.table_name),
            [],
            |row| row.get(0),
        )?;

        Ok(Fts5Stats {
            table_name: self.config.table_name.clone(),
            row_count,
            tokenizer: self.config.tokenizer.clone(),
        })
    }
}

/// Statistics about an FTS5 index.
#[derive(Debug, Clone)]
pub struct Fts5Stats {
    pub table_name: String,
    pub row_count: usize,
    pub tokenizer: String,
}

/// Map a SQLite failure to [`CatalogError::IndexCorruption`] when it reports a
/// structurally broken index, and to a store error otherwise.
pub(crate) fn corruption_or_store(err: rusqlite::Error) -> CatalogError {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseCorrupt) => CatalogError::IndexCorruption {
            message: err.to_string(),
        },
        _ => CatalogError::from(err),
    }
}
