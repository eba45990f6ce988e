//! JSON backup and restore of the record store.
//!
//! A backup holds only store records; the index is rebuilt from them. The
//! export file is written atomically:
//! 1. Serialize to a temp file next to the target (PID+TID suffix)
//! 2. fsync the temp file
//! 3. Rename it over the target

use crate::error::{CatalogError, Result};
use crate::record::Record;
use crate::reindex::ReindexError;
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::process;
use std::thread;
use tracing::{debug, info, warn};

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported_count: usize,
    /// Entries that failed validation, by id (or `#<position>` when the entry
    /// has no id).
    pub errors: Vec<ReindexError>,
}

/// Write every record to `path` as a JSON array, in id order.
///
/// Returns the number of records written. Fails without touching `path` if
/// any stored record can't be read.
pub fn export_json(store: &RecordStore, path: &Path) -> Result<usize> {
    let records = store.list_all().collect::<Result<Vec<Record>>>()?;
    atomic_write_json(path, &records)?;
    info!("Exported {} datasets to {}", records.len(), path.display());
    Ok(records.len())
}

/// Load records from a JSON array written by [`export_json`] (or by hand).
///
/// Valid entries are upserted in one transaction; entries without an id get
/// one generated from their name. Invalid entries are reported and skipped.
pub fn import_json(store: &RecordStore, path: &Path) -> Result<ImportReport> {
    let contents = fs::read_to_string(path).map_err(|e| CatalogError::Io {
        message: format!("Failed to read {}", path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e),
    })?;
    let entries: Vec<Value> = serde_json::from_str(&contents).map_err(|e| CatalogError::Json {
        message: format!("Failed to parse {}: {}", path.display(), e),
        source: Some(e),
    })?;

    let mut report = ImportReport::default();
    let mut valid = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        let hint = format!("#{}", position + 1);
        match Record::from_value(entry, Some(&hint)) {
            Ok(record) => valid.push(record),
            Err(e) => {
                warn!("Skipping import entry {}: {}", hint, e);
                report.errors.push(ReindexError {
                    id: e.record_id().unwrap_or(&hint).to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    report.imported_count = store.index().db().write(|conn| {
        for record in &valid {
            if record.id.is_empty() {
                store.create_in(conn, record.clone())?;
            } else {
                store.put_in(conn, record)?;
            }
        }
        Ok(valid.len())
    })?;

    info!(
        "Imported {} datasets from {} ({} rejected)",
        report.imported_count,
        path.display(),
        report.errors.len()
    );
    Ok(report)
}

/// Serialize `data` to `path` via a synced temp file and a rename.
pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| CatalogError::Io {
                message: format!("Failed to create directory {}", parent.display()),
                path: Some(parent.to_path_buf()),
                source: Some(e),
            })?;
        }
    }

    let temp_path = path.with_extension(format!("json.{}.{}.tmp", process::id(), thread_id()));
    let serialized = serde_json::to_string_pretty(data).map_err(|e| CatalogError::Json {
        message: format!("Failed to serialize data: {}", e),
        source: Some(e),
    })?;

    let write_temp = || -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(serialized.as_bytes())?;
        file.flush()?;
        file.sync_all()
    };
    if let Err(e) = write_temp() {
        let _ = fs::remove_file(&temp_path);
        return Err(CatalogError::Io {
            message: format!("Failed to write temp file {}", temp_path.display()),
            path: Some(temp_path),
            source: Some(e),
        });
    }

    fs::rename(&temp_path, path).map_err(|e| CatalogError::Io {
        message: format!("Failed to rename {} to {}", temp_path.display(), path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e),
    })?;

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

fn thread_id() -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    thread::current().id().hash(&mut hasher);
    hasher.finish()
}
