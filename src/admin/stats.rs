use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::load::{marker, LOAD_VERSION};
use crate::schema::{relation_exists, row_count, RelationKind, ALL_TABLES};
use crate::store::Store;
use crate::types::{FlightError, Result};
use crate::views::ALL_VIEWS;

/// Snapshot of a store's contents and files.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    /// Per-table row counts.
    pub tables: Vec<TableStats>,
    /// Which reporting views exist.
    pub views: Vec<ViewStats>,
    /// Load marker for the current version, if present.
    pub load: LoadStats,
    /// File sizes.
    pub filesystem: FilesystemStats,
}

/// Row count of one table; `None` when the table has not been created.
#[derive(Debug, Clone, Serialize)]
pub struct TableStats {
    /// Table name.
    pub name: String,
    /// Row count.
    pub rows: Option<u64>,
}

/// Presence of one view.
#[derive(Debug, Clone, Serialize)]
pub struct ViewStats {
    /// View name.
    pub name: String,
    /// Whether it exists.
    pub exists: bool,
}

/// Load marker summary.
#[derive(Debug, Clone, Serialize)]
pub struct LoadStats {
    /// Version checked.
    pub version: i64,
    /// Completion timestamp, absent when never loaded.
    pub loaded_at: Option<String>,
}

/// Database and WAL file sizes.
#[derive(Debug, Clone, Serialize)]
pub struct FilesystemStats {
    /// Database path.
    pub db_path: String,
    /// Database size in bytes.
    pub db_size_bytes: u64,
    /// WAL path.
    pub wal_path: String,
    /// WAL size in bytes, zero when absent.
    pub wal_size_bytes: u64,
}

/// Collects [`StatsReport`] for `store` without modifying it.
pub fn stats(store: &Store) -> Result<StatsReport> {
    let path = store.path();
    if !path.exists() {
        return Err(FlightError::MissingDatabase(path.to_path_buf()));
    }
    let conn = store.connect_read_only()?;

    let mut tables = Vec::with_capacity(ALL_TABLES.len());
    for table in ALL_TABLES {
        let rows = if relation_exists(&conn, RelationKind::Table, table.name)? {
            Some(row_count(&conn, table)?)
        } else {
            None
        };
        tables.push(TableStats {
            name: table.name.to_string(),
            rows,
        });
    }

    let mut views = Vec::with_capacity(ALL_VIEWS.len());
    for name in ALL_VIEWS {
        views.push(ViewStats {
            name: name.to_string(),
            exists: relation_exists(&conn, RelationKind::View, name)?,
        });
    }

    let has_marker_table = tables.iter().any(|t| t.name == "cargas" && t.rows.is_some());
    let loaded_at = if has_marker_table {
        marker(&conn, LOAD_VERSION)?
    } else {
        None
    };

    let wal_path = wal_path(path);
    let filesystem = FilesystemStats {
        db_path: path.display().to_string(),
        db_size_bytes: fs::metadata(path)?.len(),
        wal_path: wal_path.display().to_string(),
        wal_size_bytes: fs::metadata(&wal_path).map(|m| m.len()).unwrap_or(0),
    };

    Ok(StatsReport {
        tables,
        views,
        load: LoadStats {
            version: LOAD_VERSION,
            loaded_at,
        },
        filesystem,
    })
}

fn wal_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push("-wal");
    PathBuf::from(os)
}
