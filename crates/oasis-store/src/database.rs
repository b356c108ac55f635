//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation.  Writes go through a
//! [`WriteTx`], which commits explicitly and rolls back when dropped.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use oasis_shared::constants::DB_FILE_NAME;
use rusqlite::{Connection, Transaction};

use crate::error::{Result, StoreError};
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/oasis/oasis.db`
    /// - macOS:   `~/Library/Application Support/com.oasis.oasis/oasis.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\oasis\oasis\data\oasis.db`
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "oasis", "oasis").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join(DB_FILE_NAME);

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// Open a private in-memory database.  Nothing survives the handle.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Start a write transaction.  Nothing is visible to readers until
    /// [`WriteTx::commit`] succeeds.
    pub fn begin_write(&mut self) -> Result<WriteTx<'_>> {
        Ok(WriteTx {
            tx: self.conn.transaction()?,
        })
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn
            .path()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}

/// An open write transaction.  Record mutations live in
/// [`records`](crate::records).
pub struct WriteTx<'a> {
    tx: Transaction<'a>,
}

impl<'a> WriteTx<'a> {
    pub(crate) fn conn(&self) -> &Connection {
        &self.tx
    }

    /// Commit every change made through this transaction.
    pub fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }
}
