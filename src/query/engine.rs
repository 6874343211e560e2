//! Read-only query execution over tables and views.

use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use tracing::debug;

use crate::query::predicate::{format_predicate, quote_ident};
use crate::query::{Filter, RowSet, Value};
use crate::store::Store;
use crate::types::{FlightError, Result};

/// Row count, either overall or per distinct value of a column.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Counts {
    /// Number of matching rows.
    Total(u64),
    /// Matching rows per group, ordered by group value.
    Grouped(Vec<GroupCount>),
}

impl Counts {
    /// Sum over all groups.
    pub fn total(&self) -> u64 {
        match self {
            Counts::Total(n) => *n,
            Counts::Grouped(groups) => groups.iter().map(|g| g.count).sum(),
        }
    }
}

/// One group of [`Counts::Grouped`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupCount {
    /// Group value; `Null` collects rows where the column is empty.
    pub value: Value,
    /// Rows in the group.
    pub count: u64,
}

/// One combination of [`QueryEngine::count_by`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KeyCount {
    /// Group values, one per grouping column.
    pub key: Vec<Value>,
    /// Rows in the group.
    pub count: u64,
}

/// Per-group total of [`QueryEngine::grouped_sum`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupSum {
    /// Group value.
    pub value: Value,
    /// Sum of the fields over the group's rows.
    pub total: f64,
}

/// Stateless query front end. Each call opens its own read-only connection.
#[derive(Clone, Debug)]
pub struct QueryEngine {
    store: Store,
}

impl QueryEngine {
    /// Wraps `store`.
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Store this engine reads from.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// `SELECT columns FROM relation WHERE filter`. An empty `columns` slice,
    /// or a lone `"*"`, selects every column.
    pub fn fetch_all(&self, relation: &str, columns: &[&str], filter: &Filter) -> Result<RowSet> {
        let projection = if matches!(columns, [] | ["*"]) {
            "*".to_string()
        } else {
            columns
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Result<Vec<_>>>()?
                .join(", ")
        };
        let stmt = Select::new(relation, &projection, filter)?;
        let conn = self.store.connect_read_only()?;
        let mut prepared = conn
            .prepare(&stmt.sql)
            .map_err(|err| FlightError::query(&stmt.sql, err))?;
        let names: Vec<String> = prepared
            .column_names()
            .into_iter()
            .map(str::to_owned)
            .collect();
        let width = names.len();
        let rows = prepared
            .query_map(
                params_from_iter(stmt.params.iter()),
                |row| -> rusqlite::Result<Vec<Value>> {
                    (0..width).map(|i| row.get::<_, Value>(i)).collect()
                },
            )
            .and_then(|mapped| mapped.collect::<rusqlite::Result<Vec<Vec<Value>>>>())
            .map_err(|err| FlightError::query(&stmt.sql, err))?;
        debug!(relation, rows = rows.len(), "query.fetch_all");
        Ok(RowSet::new(names, rows))
    }

    /// Counts matching rows, optionally grouped by one column.
    pub fn count(&self, relation: &str, filter: &Filter, group_by: Option<&str>) -> Result<Counts> {
        let conn = self.store.connect_read_only()?;
        match group_by {
            None => {
                let stmt = Select::new(relation, "COUNT(*)", filter)?;
                let n: i64 = stmt.scalar(&conn)?;
                Ok(Counts::Total(n.max(0) as u64))
            }
            Some(column) => {
                let column = quote_ident(column)?;
                let mut stmt = Select::new(relation, &format!("{column}, COUNT(*)"), filter)?;
                stmt.sql
                    .push_str(&format!(" GROUP BY {column} ORDER BY {column}"));
                let groups = stmt.rows(&conn, |row| {
                    Ok(GroupCount {
                        value: row.get(0)?,
                        count: row.get::<_, i64>(1)?.max(0) as u64,
                    })
                })?;
                Ok(Counts::Grouped(groups))
            }
        }
    }

    /// Counts matching rows per combination of `columns`, ordered by the
    /// columns left to right.
    pub fn count_by(&self, relation: &str, filter: &Filter, columns: &[&str]) -> Result<Vec<KeyCount>> {
        if columns.is_empty() {
            return Err(FlightError::Invalid("at least one grouping column is required"));
        }
        let keys = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        let mut stmt = Select::new(relation, &format!("{keys}, COUNT(*)"), filter)?;
        stmt.sql
            .push_str(&format!(" GROUP BY {keys} ORDER BY {keys}"));
        let width = columns.len();
        let conn = self.store.connect_read_only()?;
        stmt.rows(&conn, |row| {
            Ok(KeyCount {
                key: (0..width).map(|i| row.get(i)).collect::<rusqlite::Result<_>>()?,
                count: row.get::<_, i64>(width)?.max(0) as u64,
            })
        })
    }

    /// Sum over matching rows of the per-row sum of `fields`; empty fields
    /// count as zero and no matching rows give `0.0`.
    pub fn sum(&self, relation: &str, fields: &[&str], filter: &Filter) -> Result<f64> {
        let expr = format!("TOTAL({})", row_sum(fields)?);
        let stmt = Select::new(relation, &expr, filter)?;
        stmt.scalar(&self.store.connect_read_only()?)
    }

    /// [`sum`](Self::sum) per distinct value of `group_by`, ordered by value.
    pub fn grouped_sum(
        &self,
        relation: &str,
        fields: &[&str],
        filter: &Filter,
        group_by: &str,
    ) -> Result<Vec<GroupSum>> {
        let column = quote_ident(group_by)?;
        let expr = format!("{column}, TOTAL({})", row_sum(fields)?);
        let mut stmt = Select::new(relation, &expr, filter)?;
        stmt.sql
            .push_str(&format!(" GROUP BY {column} ORDER BY {column}"));
        let conn = self.store.connect_read_only()?;
        stmt.rows(&conn, |row| {
            Ok(GroupSum {
                value: row.get(0)?,
                total: row.get(1)?,
            })
        })
    }

    /// Average of `field` over matching rows, ignoring empty cells.
    ///
    /// `None` when nothing matched; callers decide what that means.
    pub fn mean(&self, relation: &str, field: &str, filter: &Filter) -> Result<Option<f64>> {
        let expr = format!("AVG({})", quote_ident(field)?);
        let stmt = Select::new(relation, &expr, filter)?;
        stmt.scalar(&self.store.connect_read_only()?)
    }

    /// Average over matching rows of the per-row sum of `fields`, with empty
    /// cells counted as zero. `None` when nothing matched.
    pub fn mean_of_sum(
        &self,
        relation: &str,
        fields: &[&str],
        filter: &Filter,
    ) -> Result<Option<f64>> {
        let expr = format!("AVG({})", row_sum(fields)?);
        let stmt = Select::new(relation, &expr, filter)?;
        stmt.scalar(&self.store.connect_read_only()?)
    }

    /// Distinct non-empty values of `field` among matching rows, ascending.
    pub fn distinct(&self, relation: &str, field: &str, filter: &Filter) -> Result<Vec<Value>> {
        let column = quote_ident(field)?;
        let not_null = Filter::raw(format!("{column} IS NOT NULL"));
        let filter = filter.clone().and(not_null);
        let mut stmt = Select::new(relation, &format!("DISTINCT {column}"), &filter)?;
        stmt.sql.push_str(&format!(" ORDER BY {column}"));
        let conn = self.store.connect_read_only()?;
        stmt.rows(&conn, |row| row.get(0))
    }
}

/// `COALESCE(a, 0) + COALESCE(b, 0) + …`
fn row_sum(fields: &[&str]) -> Result<String> {
    if fields.is_empty() {
        return Err(FlightError::Invalid("at least one field is required"));
    }
    Ok(fields
        .iter()
        .map(|f| quote_ident(f).map(|q| format!("COALESCE({q}, 0)")))
        .collect::<Result<Vec<_>>>()?
        .join(" + "))
}

/// A rendered single-relation `SELECT`.
struct Select {
    sql: String,
    params: Vec<Value>,
}

impl Select {
    fn new(relation: &str, projection: &str, filter: &Filter) -> Result<Self> {
        let relation = quote_ident(relation)?;
        let mut sql = format!("SELECT {projection} FROM {relation}");
        let mut params = Vec::new();
        if let Some(predicate) = format_predicate(filter, "")? {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate.sql);
            params = predicate.params;
        }
        Ok(Self { sql, params })
    }

    fn scalar<T: rusqlite::types::FromSql>(&self, conn: &Connection) -> Result<T> {
        debug!(sql = %self.sql, "query.scalar");
        conn.query_row(&self.sql, params_from_iter(self.params.iter()), |row| {
            row.get(0)
        })
        .map_err(|err| FlightError::query(&self.sql, err))
    }

    fn rows<T, F>(&self, conn: &Connection, map: F) -> Result<Vec<T>>
    where
        F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    {
        debug!(sql = %self.sql, "query.rows");
        let run = || -> rusqlite::Result<Vec<T>> {
            let mut stmt = conn.prepare(&self.sql)?;
            let mapped = stmt.query_map(params_from_iter(self.params.iter()), map)?;
            mapped.collect()
        };
        run().map_err(|err| FlightError::query(&self.sql, err))
    }
}
