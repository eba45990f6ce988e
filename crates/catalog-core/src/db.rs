//! The SQLite database holding both the record store and the search index.
//!
//! One writer connection and one reader connection share the database file in
//! WAL mode. Writes run in `BEGIN IMMEDIATE` transactions on the writer; reads
//! run in deferred transactions on the reader and see the last committed
//! snapshot. An advisory lock file keeps other processes from opening the same
//! catalog for writing.

use crate::config::StoreConfig;
use crate::error::{CatalogError, Result};
use crate::index::fts5::{Fts5Config, Fts5Manager};
use fs2::FileExt;
use rusqlite::{Connection, OpenFlags, TransactionBehavior};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Shared handle to the catalog database.
pub struct CatalogDb {
    root: PathBuf,
    db_path: PathBuf,
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    /// True when this open had to create an empty search index.
    index_created: bool,
    // Held for the lifetime of the handle; dropping it releases the lock.
    _lock_file: File,
}

impl CatalogDb {
    /// Open (or create) the catalog database under `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            std::fs::create_dir_all(&root).map_err(|e| CatalogError::Io {
                message: format!("Failed to create directory {}", root.display()),
                path: Some(root.clone()),
                source: Some(e),
            })?;
        }

        let lock_file = Self::acquire_lock(&root)?;

        let db_path = root.join(StoreConfig::DB_FILENAME);
        let writer = Connection::open(&db_path)?;
        Self::configure_connection(&writer)?;
        Self::ensure_schema(&writer)?;

        let mut index_created = false;
        for fts5_config in [Fts5Config::default(), Fts5Config::words()] {
            let fts5 = Fts5Manager::new(&fts5_config);
            index_created |= !fts5.table_exists(&writer)?;
            fts5.ensure_setup(&writer)?;
        }

        let reader = Connection::open_with_flags(
            &db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        reader.busy_timeout(std::time::Duration::from_millis(StoreConfig::BUSY_TIMEOUT_MS))?;

        info!("Opened catalog database at {}", db_path.display());

        Ok(Self {
            root,
            db_path,
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
            index_created,
            _lock_file: lock_file,
        })
    }

    fn acquire_lock(root: &Path) -> Result<File> {
        let lock_path = root.join(StoreConfig::LOCK_FILENAME);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| CatalogError::io_with_path(e, &lock_path))?;

        lock_file.try_lock_exclusive().map_err(|_| CatalogError::Store {
            message: format!(
                "Catalog at {} is already in use by another process",
                root.display()
            ),
            source: None,
        })?;

        debug!("Acquired catalog lock at {}", lock_path.display());
        Ok(lock_file)
    }

    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(&format!(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA busy_timeout={};
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            ",
            StoreConfig::BUSY_TIMEOUT_MS
        ))?;
        Ok(())
    }

    fn ensure_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS datasets (
                id TEXT PRIMARY KEY,
                payload_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                revision INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_datasets_revision ON datasets(revision)",
            [],
        )?;
        Ok(())
    }

    /// Directory the catalog lives in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Whether the search index was missing when the database was opened.
    pub fn index_created(&self) -> bool {
        self.index_created
    }

    /// Run `f` inside an immediate write transaction.
    ///
    /// The transaction commits only if `f` returns `Ok`; any error (including
    /// cancellation) rolls it back.
    pub fn write<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = lock_conn(&self.writer, "writer")?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run `f` against one consistent read snapshot.
    pub fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = lock_conn(&self.reader, "reader")?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run `f` on the writer connection outside of an explicit transaction.
    ///
    /// Used for maintenance commands that manage their own statements.
    pub fn with_writer<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = lock_conn(&self.writer, "writer")?;
        f(&conn)
    }

    /// Checkpoint the WAL file into the main database.
    pub fn checkpoint_wal(&self) -> Result<()> {
        let conn = lock_conn(&self.writer, "writer")?;
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        debug!("Checkpointed WAL");
        Ok(())
    }
}

fn lock_conn<'a>(conn: &'a Mutex<Connection>, role: &str) -> Result<MutexGuard<'a, Connection>> {
    conn.lock().map_err(|_| CatalogError::Store {
        message: format!("Failed to acquire {} connection lock", role),
        source: None,
    })
}
