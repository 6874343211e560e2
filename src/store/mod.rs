#![forbid(unsafe_code)]

//! Connection factory for the backing SQLite file.
//!
//! A [`Store`] holds no live connection. Every load, view, or query call
//! opens a fresh connection through [`Store::connect`] or
//! [`Store::connect_read_only`], runs its statement(s), and drops it.

mod options;

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::types::{FlightError, Result};

pub use options::{JournalMode, StoreOptions, Synchronous};

/// Handle to a single SQLite database file.
#[derive(Clone, Debug)]
pub struct Store {
    path: PathBuf,
    opts: StoreOptions,
}

impl Store {
    /// Creates a handle for `path`. Nothing is opened until a call needs it.
    pub fn new(path: impl Into<PathBuf>, opts: StoreOptions) -> Self {
        Self {
            path: path.into(),
            opts,
        }
    }

    /// Creates a handle and fails if the file is missing and creation is disabled.
    ///
    /// # Errors
    ///
    /// Returns [`FlightError::MissingDatabase`] when the file does not exist and
    /// `create_if_missing` is false, or an I/O error when the parent directory
    /// cannot be created.
    pub fn open(path: impl Into<PathBuf>, opts: StoreOptions) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            if !opts.create_if_missing {
                return Err(FlightError::missing_database(&path));
            }
            ensure_parent_dir(&path)?;
        }
        Ok(Self::new(path, opts))
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Connection options.
    pub fn options(&self) -> &StoreOptions {
        &self.opts
    }

    /// Opens a read-write connection with the configured pragmas applied.
    pub fn connect(&self) -> Result<Connection> {
        let flags = if self.opts.create_if_missing {
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE
        };
        let conn = Connection::open_with_flags(&self.path, flags | OpenFlags::SQLITE_OPEN_NO_MUTEX)
            .map_err(|err| self.classify_open_error(err))?;
        conn.busy_timeout(self.opts.busy_timeout)?;
        conn.pragma_update_and_check(
            None,
            "journal_mode",
            self.opts.journal_mode.pragma_value(),
            |_| Ok(()),
        )?;
        conn.pragma_update(None, "synchronous", self.opts.synchronous.pragma_value())?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        debug!(path = %self.path.display(), "store.connect");
        Ok(conn)
    }

    /// Opens a connection that rejects every write.
    pub fn connect_read_only(&self) -> Result<Connection> {
        if !self.path.exists() {
            return Err(FlightError::missing_database(&self.path));
        }
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(self.opts.busy_timeout)?;
        conn.pragma_update(None, "query_only", "ON")?;
        debug!(path = %self.path.display(), "store.connect_read_only");
        Ok(conn)
    }

    fn classify_open_error(&self, err: rusqlite::Error) -> FlightError {
        if !self.opts.create_if_missing && !self.path.exists() {
            FlightError::missing_database(&self.path)
        } else {
            FlightError::Sqlite(err)
        }
    }
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
