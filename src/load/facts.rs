use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, info};

use crate::load::columns::{
    DESTINATION_HEADERS, GROUP_HEADER, MEASURE_HEADERS, MONTH_HEADER, NATURE_HEADER,
    OPERATOR_HEADERS, ORIGIN_HEADERS, YEAR_HEADER,
};
use crate::load::dimensions::code_map;
use crate::load::TableLoad;
use crate::schema::{row_count, ColumnDef, ColumnType, AEROPORTOS, EMPRESAS, VOOS};
use crate::source::{cell, normalize_column_name, NameStyle, SourceTable};
use crate::types::{Dimension, FlightError, Result};

/// Index of the first measure column in [`VOOS`].
const FIRST_MEASURE: usize = 7;

/// Inserts one `voos` row per source record.
///
/// Operator and airport codes are resolved to surrogate ids through the
/// dimension tables, which must already be loaded. The table is skipped when
/// it already holds rows.
///
/// # Errors
///
/// [`FlightError::MissingDimensionKey`] when a code has no dimension row,
/// [`FlightError::InvalidNumber`] when a measure cell is not numeric.
pub fn load_events(conn: &Connection, source: &SourceTable) -> Result<TableLoad> {
    let existing = row_count(conn, &VOOS)?;
    if existing > 0 {
        info!(table = VOOS.name, existing, "load.events.skipped");
        return Ok(TableLoad::Skipped(existing));
    }

    let layout = FactLayout::resolve(source)?;
    let operators = code_map(conn, &EMPRESAS)?;
    let airports = code_map(conn, &AEROPORTOS)?;
    debug!(
        operators = operators.len(),
        airports = airports.len(),
        "load.events.code_maps"
    );

    let mut stmt = conn.prepare_cached(&VOOS.insert_sql())?;
    let mut values: Vec<Value> = Vec::with_capacity(VOOS.columns.len());
    let mut inserted = 0u64;
    for (row, record) in source.records().iter().enumerate() {
        values.clear();
        let lookup = |idx: usize, dimension: Dimension| -> Result<Value> {
            let map = match dimension {
                Dimension::Operator => &operators,
                Dimension::Airport => &airports,
            };
            let code = cell(record, idx).unwrap_or_default();
            map.get(code)
                .map(|&id| Value::Integer(id))
                .ok_or_else(|| FlightError::MissingDimensionKey {
                    dimension,
                    code: code.to_string(),
                    row,
                })
        };

        values.push(lookup(layout.operator, Dimension::Operator)?);
        values.push(parse_measure(
            YEAR_HEADER,
            ColumnType::Integer,
            cell(record, layout.year),
            row,
        )?);
        values.push(parse_measure(
            MONTH_HEADER,
            ColumnType::Integer,
            cell(record, layout.month),
            row,
        )?);
        values.push(lookup(layout.origin, Dimension::Airport)?);
        values.push(lookup(layout.destination, Dimension::Airport)?);
        values.push(text(cell(record, layout.nature)));
        values.push(text(cell(record, layout.group)));
        for ((header, column), &idx) in MEASURE_HEADERS
            .iter()
            .zip(layout.measure_defs)
            .zip(&layout.measures)
        {
            values.push(parse_measure(header, column.ty, cell(record, idx), row)?);
        }

        stmt.execute(params_from_iter(values.iter()))?;
        inserted += 1;
    }
    info!(table = VOOS.name, inserted, "load.events.inserted");
    Ok(TableLoad::Inserted(inserted))
}

/// Source column positions feeding each `voos` column.
struct FactLayout {
    operator: usize,
    year: usize,
    month: usize,
    origin: usize,
    destination: usize,
    nature: usize,
    group: usize,
    measures: Vec<usize>,
    measure_defs: &'static [ColumnDef],
}

impl FactLayout {
    fn resolve(source: &SourceTable) -> Result<Self> {
        let measure_defs = &VOOS.columns[FIRST_MEASURE..];
        let aligned = MEASURE_HEADERS.len() == measure_defs.len()
            && MEASURE_HEADERS
                .iter()
                .zip(measure_defs)
                .all(|(header, def)| normalize_column_name(header, NameStyle::Full) == def.name);
        if !aligned {
            return Err(FlightError::Invalid(
                "measure headers do not map onto event columns",
            ));
        }
        Ok(Self {
            operator: source.column_index(OPERATOR_HEADERS[0])?,
            year: source.column_index(YEAR_HEADER)?,
            month: source.column_index(MONTH_HEADER)?,
            origin: source.column_index(ORIGIN_HEADERS[0])?,
            destination: source.column_index(DESTINATION_HEADERS[0])?,
            nature: source.column_index(NATURE_HEADER)?,
            group: source.column_index(GROUP_HEADER)?,
            measures: source.column_indices(&MEASURE_HEADERS)?,
            measure_defs,
        })
    }
}

fn text(raw: Option<&str>) -> Value {
    raw.map_or(Value::Null, |value| Value::Text(value.to_string()))
}

/// Parses one numeric cell.
///
/// Blank cells are `NULL`. Integral text stays an integer unless the column
/// is `REAL`; decimal text accepts either `.` or `,` as separator.
pub fn parse_measure(column: &str, ty: ColumnType, raw: Option<&str>, row: usize) -> Result<Value> {
    let Some(raw) = raw else {
        return Ok(Value::Null);
    };
    if ty != ColumnType::Real {
        if let Ok(int) = raw.parse::<i64>() {
            return Ok(Value::Integer(int));
        }
    }
    let invalid = || FlightError::InvalidNumber {
        column: column.to_string(),
        value: raw.to_string(),
        row,
    };
    let float: f64 = raw.replace(',', ".").parse().map_err(|_| invalid())?;
    if !float.is_finite() {
        return Err(invalid());
    }
    if ty == ColumnType::Real || float.fract() != 0.0 {
        Ok(Value::Real(float))
    } else {
        Ok(Value::Integer(float as i64))
    }
}
