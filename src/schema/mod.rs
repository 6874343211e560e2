#![forbid(unsafe_code)]

//! Schema manager: idempotent creation of the normalized tables.

pub mod tables;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::debug;

use crate::types::Result;

pub use tables::{
    get_table, ColumnDef, ColumnType, TableDef, AEROPORTOS, ALL_TABLES, CARGAS, EMPRESAS, VOOS,
};

/// Kind of a named relation in `sqlite_master`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RelationKind {
    /// Base table.
    Table,
    /// View.
    View,
}

impl RelationKind {
    const fn master_type(self) -> &'static str {
        match self {
            RelationKind::Table => "table",
            RelationKind::View => "view",
        }
    }
}

/// Column metadata reported by `PRAGMA table_info`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Declared type, empty for untyped view columns.
    pub declared_type: String,
}

/// Creates every table, foreign key, and natural-key index if absent.
///
/// Safe to call on every start. Errors only when the store rejects the DDL.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    for table in ALL_TABLES {
        conn.execute_batch(&table.create_sql())?;
        if let Some(index_sql) = table.natural_key_index_sql() {
            conn.execute_batch(&index_sql)?;
        }
    }
    debug!(tables = ALL_TABLES.len(), "schema.ensure");
    Ok(())
}

/// Returns true when a relation of `kind` named `name` exists.
pub fn relation_exists(conn: &Connection, kind: RelationKind, name: &str) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = ?1 AND name = ?2",
            params![kind.master_type(), name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Lists the columns of a table or view with their declared types.
pub fn table_columns(conn: &Connection, relation: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
    let rows = stmt.query_map([relation], |row| {
        Ok(ColumnInfo {
            name: row.get(0)?,
            declared_type: row.get(1)?,
        })
    })?;
    let mut columns = Vec::new();
    for column in rows {
        columns.push(column?);
    }
    Ok(columns)
}

/// Number of rows currently in `table`.
pub fn row_count(conn: &Connection, table: &TableDef) -> Result<u64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table.name), [], |row| {
        row.get(0)
    })?;
    Ok(count as u64)
}
