//! Lazy keyset-paginated scan over the store.

use super::parse_payload;
use crate::config::StoreConfig;
use crate::db::CatalogDb;
use crate::error::Result;
use crate::record::Record;
use rusqlite::params;
use std::collections::VecDeque;
use std::sync::Arc;

/// Iterator over every record, in id order.
///
/// Rows are fetched a page at a time (`id > last ORDER BY id`), so records
/// written during the scan after the current position are picked up and no
/// connection lock is held between pages. A row whose payload no longer
/// parses yields an `Err` and the scan continues; a failed page read yields
/// one `Err` and ends the scan.
pub struct RecordIter {
    db: Arc<CatalogDb>,
    last_id: Option<String>,
    page: VecDeque<(String, String)>,
    finished: bool,
}

impl RecordIter {
    pub(crate) fn new(db: Arc<CatalogDb>) -> Self {
        Self {
            db,
            last_id: None,
            page: VecDeque::new(),
            finished: false,
        }
    }

    fn fetch_page(&mut self) -> Result<()> {
        let after = self.last_id.clone().unwrap_or_default();
        let rows = self.db.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, payload_json FROM datasets WHERE id > ?1 ORDER BY id LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![after, StoreConfig::SCAN_PAGE_SIZE as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut page = Vec::new();
            for row in rows {
                page.push(row?);
            }
            Ok(page)
        })?;

        if rows.len() < StoreConfig::SCAN_PAGE_SIZE {
            self.finished = true;
        }
        if let Some((id, _)) = rows.last() {
            self.last_id = Some(id.clone());
        }
        self.page.extend(rows);
        Ok(())
    }
}

impl Iterator for RecordIter {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.page.is_empty() {
            if self.finished {
                return None;
            }
            if let Err(e) = self.fetch_page() {
                self.finished = true;
                return Some(Err(e));
            }
        }

        let (id, payload) = self.page.pop_front()?;
        Some(parse_payload(&id, &payload))
    }
}
