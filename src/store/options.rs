use std::time::Duration;

use serde::{Deserialize, Serialize};

/// SQLite `synchronous` pragma setting.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Synchronous {
    /// fsync on every commit.
    Full,
    /// fsync at checkpoints only (safe under WAL).
    Normal,
    /// Never fsync.
    Off,
}

impl Synchronous {
    /// Value passed to `PRAGMA synchronous`.
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Synchronous::Full => "FULL",
            Synchronous::Normal => "NORMAL",
            Synchronous::Off => "OFF",
        }
    }
}

/// SQLite `journal_mode` pragma setting.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    /// Write-ahead log.
    Wal,
    /// Rollback journal deleted after each transaction.
    Delete,
    /// In-memory journal.
    Memory,
}

impl JournalMode {
    /// Value passed to `PRAGMA journal_mode`.
    pub const fn pragma_value(self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Delete => "DELETE",
            JournalMode::Memory => "MEMORY",
        }
    }
}

/// Options applied to every connection a [`super::Store`] opens.
#[derive(Clone, Debug)]
pub struct StoreOptions {
    /// Whether to create the database file if it doesn't exist.
    pub create_if_missing: bool,
    /// Journal mode applied on connect.
    pub journal_mode: JournalMode,
    /// Durability level applied on connect.
    pub synchronous: Synchronous,
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            journal_mode: JournalMode::Wal,
            synchronous: Synchronous::Normal,
            busy_timeout: Duration::from_millis(5_000),
        }
    }
}
