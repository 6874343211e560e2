use rusqlite::{params_from_iter, Connection};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use tracing::{info, warn};

use crate::load::columns::{DESTINATION_HEADERS, OPERATOR_HEADERS, ORIGIN_HEADERS};
use crate::load::TableLoad;
use crate::schema::{row_count, TableDef, AEROPORTOS, EMPRESAS};
use crate::source::{cell, normalize_column_name, NameStyle, SourceTable};
use crate::types::{FlightError, Result};

/// One dimension row, in the column order of its table.
type Tuple = Vec<Option<String>>;

/// Outcome of [`load_dimensions`] per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DimensionSummary {
    /// `empresas` outcome.
    pub operators: TableLoad,
    /// `aeroportos` outcome.
    pub airports: TableLoad,
}

/// Extracts distinct operators and airports from `source` and inserts them.
///
/// Each table is skipped when it already holds rows. Airports are the union
/// of the origin and destination projections, deduplicated after
/// concatenation, so a code seen only as a destination still gets a row.
///
/// # Errors
///
/// [`FlightError::MissingColumn`] when a required header is absent,
/// [`FlightError::MissingValue`] when a natural key cell is blank.
pub fn load_dimensions(conn: &Connection, source: &SourceTable) -> Result<DimensionSummary> {
    let operator_cols = project(source, &OPERATOR_HEADERS, &EMPRESAS)?;
    let origin_cols = project(source, &ORIGIN_HEADERS, &AEROPORTOS)?;
    let destination_cols = project(source, &DESTINATION_HEADERS, &AEROPORTOS)?;

    let operators = load_table(conn, &EMPRESAS, || {
        distinct_tuples(source, &[(&OPERATOR_HEADERS[..], &operator_cols[..])])
    })?;
    let airports = load_table(conn, &AEROPORTOS, || {
        distinct_tuples(
            source,
            &[
                (&ORIGIN_HEADERS[..], &origin_cols[..]),
                (&DESTINATION_HEADERS[..], &destination_cols[..]),
            ],
        )
    })?;

    Ok(DimensionSummary {
        operators,
        airports,
    })
}

fn load_table<F>(conn: &Connection, table: &TableDef, extract: F) -> Result<TableLoad>
where
    F: FnOnce() -> Result<Vec<Tuple>>,
{
    let existing = row_count(conn, table)?;
    if existing > 0 {
        info!(table = table.name, existing, "load.dimensions.skipped");
        return Ok(TableLoad::Skipped(existing));
    }
    let tuples = extract()?;
    let inserted = insert_tuples(conn, table, &tuples)?;
    info!(table = table.name, inserted, "load.dimensions.inserted");
    Ok(TableLoad::Inserted(inserted))
}

/// Resolves `headers` in `source` and checks that their normalized names
/// line up with the data columns of `table`.
fn project(source: &SourceTable, headers: &[&str], table: &TableDef) -> Result<Vec<usize>> {
    let indices = source.column_indices(headers)?;
    let renamed = headers
        .iter()
        .map(|header| normalize_column_name(header, NameStyle::Qualifier));
    if !renamed.eq(table.column_names()) {
        return Err(FlightError::Invalid(
            "source headers do not map onto dimension columns",
        ));
    }
    Ok(indices)
}

/// Concatenates the projections in order and drops exact duplicates, keeping
/// first occurrences. A code that reappears with different attributes keeps
/// its first tuple.
fn distinct_tuples(source: &SourceTable, projections: &[(&[&str], &[usize])]) -> Result<Vec<Tuple>> {
    let mut seen: FxHashSet<Tuple> = FxHashSet::default();
    let mut by_code: FxHashMap<String, usize> = FxHashMap::default();
    let mut out: Vec<Tuple> = Vec::new();

    for (headers, indices) in projections {
        for (row, record) in source.records().iter().enumerate() {
            let tuple: Tuple = indices
                .iter()
                .map(|&idx| cell(record, idx).map(str::to_owned))
                .collect();
            let Some(code) = tuple[0].clone() else {
                return Err(FlightError::MissingValue {
                    column: headers[0].to_string(),
                    row,
                });
            };
            if seen.contains(&tuple) {
                continue;
            }
            if let Some(&first) = by_code.get(&code) {
                warn!(
                    code = %code,
                    kept = ?out[first],
                    dropped = ?tuple,
                    "load.dimensions.conflicting_code"
                );
                seen.insert(tuple);
                continue;
            }
            by_code.insert(code, out.len());
            seen.insert(tuple.clone());
            out.push(tuple);
        }
    }
    Ok(out)
}

fn insert_tuples(conn: &Connection, table: &TableDef, tuples: &[Tuple]) -> Result<u64> {
    let mut stmt = conn.prepare_cached(&table.insert_sql())?;
    let mut inserted = 0u64;
    for tuple in tuples {
        stmt.execute(params_from_iter(tuple.iter()))?;
        inserted += 1;
    }
    Ok(inserted)
}

/// Reads `sigla → id` for a dimension table.
pub(crate) fn code_map(conn: &Connection, table: &TableDef) -> Result<FxHashMap<String, i64>> {
    let mut stmt = conn.prepare(&format!("SELECT sigla, id FROM {}", table.name))?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
    let mut map = FxHashMap::default();
    for entry in rows {
        let (code, id) = entry?;
        map.insert(code, id);
    }
    Ok(map)
}
