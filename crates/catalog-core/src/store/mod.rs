//! The authoritative record store.
//!
//! Records live as JSON payloads in the `datasets` table. Every write also
//! updates the search index inside the same transaction, store row first,
//! so readers never see one without the other.

mod scan;

pub use scan::RecordIter;

use crate::config::StoreConfig;
use crate::db::CatalogDb;
use crate::error::{CatalogError, Result};
use crate::index::{IndexEntry, SearchIndex};
use crate::record::{self, Record};
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A store row as written, before any validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub id: String,
    pub payload: String,
}

/// Record store bound to its search index.
pub struct RecordStore {
    db: Arc<CatalogDb>,
    index: Arc<SearchIndex>,
}

impl RecordStore {
    pub fn new(index: Arc<SearchIndex>) -> Self {
        Self {
            db: Arc::clone(index.db()),
            index,
        }
    }

    pub fn index(&self) -> &Arc<SearchIndex> {
        &self.index
    }

    /// Store `record` under `id`, replacing any previous version.
    ///
    /// The record's own `id` must be empty or equal to `id`. Nothing is
    /// written if validation fails.
    pub fn put(&self, id: &str, record: &Record) -> Result<()> {
        let record = Self::prepare(id, record)?;
        self.db.write(|conn| self.put_in(conn, &record))
    }

    /// Store a new record under an id generated from its name.
    ///
    /// Returns the id. The id is chosen inside the write transaction, so two
    /// creates with the same name never collide.
    pub fn create(&self, record: &Record) -> Result<String> {
        if !record.id.is_empty() {
            return Err(CatalogError::validation(
                Some(&record.id),
                "id",
                "a new record must not carry an id",
            ));
        }
        record.validate()?;
        self.db.write(|conn| self.create_in(conn, record.clone()))
    }

    pub fn get(&self, id: &str) -> Result<Option<Record>> {
        self.db.read(|conn| get_in(conn, id))
    }

    /// Delete the record and its index entry.
    pub fn delete(&self, id: &str) -> Result<()> {
        self.db.write(|conn| self.delete_in(conn, id))
    }

    /// Lazily iterate every record in id order.
    ///
    /// Each call starts a fresh scan; pages are read on demand, so the scan
    /// holds no lock between pages.
    pub fn list_all(&self) -> RecordIter {
        RecordIter::new(Arc::clone(&self.db))
    }

    pub fn exists(&self, id: &str) -> Result<bool> {
        self.db.read(|conn| exists_in(conn, id))
    }

    pub fn count(&self) -> Result<usize> {
        self.db.read(count_in)
    }

    pub(crate) fn prepare(id: &str, record: &Record) -> Result<Record> {
        if !record.id.is_empty() && record.id != id {
            return Err(CatalogError::validation(
                Some(id),
                "id",
                format!("record id {} does not match {}", record.id, id),
            ));
        }
        if !record::is_valid_id(id) {
            return Err(CatalogError::validation(
                Some(id),
                "id",
                "must be lowercase letters and digits separated by single hyphens",
            ));
        }
        let mut record = record.clone();
        record.id = id.to_string();
        record.validate()?;
        Ok(record)
    }

    /// Write the row, then its index entry. `record` must already be validated.
    pub(crate) fn put_in(&self, conn: &Connection, record: &Record) -> Result<()> {
        let payload = serde_json::to_string(record)?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO datasets (id, payload_json, created_at, updated_at, revision)
             VALUES (?1, ?2, ?3, ?3, (SELECT COALESCE(MAX(revision), 0) + 1 FROM datasets))
             ON CONFLICT(id) DO UPDATE SET
                 payload_json=excluded.payload_json,
                 updated_at=excluded.updated_at,
                 revision=excluded.revision",
            params![record.id, payload, now],
        )?;
        self.index.upsert_in(conn, &IndexEntry::from_record(record))?;

        debug!("Stored dataset: {}", record.id);
        Ok(())
    }

    pub(crate) fn create_in(&self, conn: &Connection, mut record: Record) -> Result<String> {
        let base = record::slugify(&record.name);
        let mut n = 1;
        let id = loop {
            let candidate = record::candidate(&base, n);
            if !exists_in(conn, &candidate)? {
                break candidate;
            }
            n += 1;
        };

        record.id = id.clone();
        self.put_in(conn, &record)?;
        Ok(id)
    }

    pub(crate) fn delete_in(&self, conn: &Connection, id: &str) -> Result<()> {
        let removed = conn.execute("DELETE FROM datasets WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(CatalogError::not_found(id));
        }
        self.index.remove_in(conn, id)?;

        debug!("Deleted dataset: {}", id);
        Ok(())
    }
}

pub(crate) fn get_in(conn: &Connection, id: &str) -> Result<Option<Record>> {
    let payload: Option<String> = conn
        .query_row(
            "SELECT payload_json FROM datasets WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;

    payload.map(|p| parse_payload(id, &p)).transpose()
}

/// Fetch several records at once.
///
/// Ids without a row, or whose payload no longer parses, are absent from the
/// map.
pub(crate) fn get_many_in(conn: &Connection, ids: &[String]) -> Result<HashMap<String, Record>> {
    let mut records = HashMap::with_capacity(ids.len());

    for chunk in ids.chunks(StoreConfig::LOOKUP_CHUNK_SIZE) {
        let placeholders = vec!["?"; chunk.len()].join(",");
        let sql = format!(
            "SELECT id, payload_json FROM datasets WHERE id IN ({})",
            placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (id, payload) = row?;
            match parse_payload(&id, &payload) {
                Ok(record) => {
                    records.insert(id, record);
                }
                Err(e) => warn!("Skipping unreadable dataset {}: {}", id, e),
            }
        }
    }

    Ok(records)
}

/// Records in browse order: most recently written first, ties by id.
pub(crate) fn browse_in(conn: &Connection, limit: Option<usize>) -> Result<Vec<Record>> {
    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    let mut stmt = conn.prepare(
        "SELECT id, payload_json FROM datasets ORDER BY revision DESC, id ASC LIMIT ?1",
    )?;
    let rows = stmt.query_map([limit], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (id, payload) = row?;
        match parse_payload(&id, &payload) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping unreadable dataset {}: {}", id, e),
        }
    }
    Ok(records)
}

/// Every row, unparsed, in id order.
pub(crate) fn rows_in(conn: &Connection) -> Result<Vec<SourceRecord>> {
    let mut stmt = conn.prepare("SELECT id, payload_json FROM datasets ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(SourceRecord {
            id: row.get(0)?,
            payload: row.get(1)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Every stored id, ascending.
pub(crate) fn ids_in(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM datasets ORDER BY id")?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

pub(crate) fn exists_in(conn: &Connection, id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM datasets WHERE id = ?1", params![id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

pub(crate) fn count_in(conn: &Connection) -> Result<usize> {
    Ok(conn.query_row("SELECT COUNT(*) FROM datasets", [], |row| row.get(0))?)
}

pub(crate) fn parse_payload(id: &str, payload: &str) -> Result<Record> {
    let value: serde_json::Value = serde_json::from_str(payload).map_err(|e| CatalogError::Json {
        message: format!("Failed to parse stored payload for {}: {}", id, e),
        source: Some(e),
    })?;
    Record::from_value(value, Some(id))
}
