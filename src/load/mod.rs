#![forbid(unsafe_code)]

//! One-shot normalization of a wide extract into the relational model.
//!
//! [`load_source`] is the entry point: it ensures the schema, then runs the
//! dimension and fact passes inside a single `IMMEDIATE` transaction guarded
//! by a row in `cargas`. The individual passes are public so callers holding
//! their own connection can run them directly.

pub mod columns;
mod dimensions;
mod facts;

use std::time::Instant;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::schema::{ensure_schema, CARGAS};
use crate::source::SourceTable;
use crate::store::Store;
use crate::types::Result;
use crate::views::ensure_views;

pub use dimensions::{load_dimensions, DimensionSummary};
pub use facts::{load_events, parse_measure};

/// Marker version written by this loader.
pub const LOAD_VERSION: i64 = 1;

/// Outcome of one table pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "rows", rename_all = "snake_case")]
pub enum TableLoad {
    /// Rows inserted by this pass.
    Inserted(u64),
    /// Table already held this many rows; nothing was written.
    Skipped(u64),
}

impl TableLoad {
    /// Rows written by this pass, zero when skipped.
    pub fn inserted(self) -> u64 {
        match self {
            TableLoad::Inserted(rows) => rows,
            TableLoad::Skipped(_) => 0,
        }
    }
}

/// Knobs for [`load_source`].
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Marker version to check and record.
    pub version: i64,
    /// Whether to create the reporting views after a load.
    pub create_views: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            version: LOAD_VERSION,
            create_views: true,
        }
    }
}

/// Summary of [`load_source`].
#[derive(Clone, Debug, Serialize)]
pub struct LoadReport {
    /// Marker version that was checked.
    pub version: i64,
    /// True when the marker already existed and nothing was written.
    pub skipped: bool,
    /// `empresas` pass, absent when skipped.
    pub operators: Option<TableLoad>,
    /// `aeroportos` pass, absent when skipped.
    pub airports: Option<TableLoad>,
    /// `voos` pass, absent when skipped.
    pub events: Option<TableLoad>,
    /// Source records offered to the loader.
    pub source_rows: usize,
    /// Wall time of the load in milliseconds.
    pub elapsed_ms: u128,
}

/// Loads `source` into `store` once per marker version.
///
/// The marker is only recorded once `voos` holds rows; an extract without
/// records commits nothing and leaves the version open for a later load.
///
/// Everything between the marker check and the marker write runs in one
/// `IMMEDIATE` transaction, so a failed load leaves no partial rows and a
/// concurrent loader waits on the write lock and then sees the marker.
///
/// # Errors
///
/// Propagates source-shape errors from the passes and any store error; the
/// transaction is rolled back on every error path.
pub fn load_source(store: &Store, source: &SourceTable, opts: LoadOptions) -> Result<LoadReport> {
    let started = Instant::now();
    let mut conn = store.connect()?;
    ensure_schema(&conn)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if let Some(loaded_at) = marker(&tx, opts.version)? {
        info!(version = opts.version, loaded_at = %loaded_at, "load.skipped");
        drop(tx);
        if opts.create_views {
            ensure_views(&conn)?;
        }
        return Ok(LoadReport {
            version: opts.version,
            skipped: true,
            operators: None,
            airports: None,
            events: None,
            source_rows: source.len(),
            elapsed_ms: started.elapsed().as_millis(),
        });
    }

    let dims = load_dimensions(&tx, source)?;
    let events = load_events(&tx, source)?;
    // An empty `voos` would keep every later load of this version out.
    let populated = match events {
        TableLoad::Inserted(rows) | TableLoad::Skipped(rows) => rows > 0,
    };
    if populated {
        write_marker(&tx, opts.version, dims, events)?;
    } else {
        warn!(version = opts.version, "load.empty_source");
    }
    tx.commit()?;

    if opts.create_views {
        ensure_views(&conn)?;
    }
    let report = LoadReport {
        version: opts.version,
        skipped: false,
        operators: Some(dims.operators),
        airports: Some(dims.airports),
        events: Some(events),
        source_rows: source.len(),
        elapsed_ms: started.elapsed().as_millis(),
    };
    info!(
        version = report.version,
        operators = dims.operators.inserted(),
        airports = dims.airports.inserted(),
        events = events.inserted(),
        elapsed_ms = report.elapsed_ms as u64,
        "load.completed"
    );
    Ok(report)
}

/// Timestamp of the marker row for `version`, if one exists.
pub fn marker(conn: &Connection, version: i64) -> Result<Option<String>> {
    let sql = format!("SELECT carregado_em FROM {} WHERE versao = ?1", CARGAS.name);
    Ok(conn
        .query_row(&sql, [version], |row| row.get(0))
        .optional()?)
}

fn write_marker(
    conn: &Connection,
    version: i64,
    dims: DimensionSummary,
    events: TableLoad,
) -> Result<()> {
    let loaded_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("unknown"));
    conn.execute(
        &CARGAS.insert_sql(),
        params![
            version,
            loaded_at,
            dims.operators.inserted() as i64,
            dims.airports.inserted() as i64,
            events.inserted() as i64,
        ],
    )?;
    Ok(())
}
