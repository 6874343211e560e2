#![forbid(unsafe_code)]

//! Shared identifiers and the crate-wide error type.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Dimension a natural key belongs to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Dimension {
    /// Operating airline (`empresas`).
    Operator,
    /// Airport, under either role (`aeroportos`).
    Airport,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Operator => f.write_str("operator"),
            Dimension::Airport => f.write_str("airport"),
        }
    }
}

/// Errors produced by the store, loaders, and query engine.
#[derive(Debug, Error)]
pub enum FlightError {
    /// I/O failure while reading a source or coordinates file.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// Error raised by SQLite outside of a rendered query.
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Delimited-text decoding failure.
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    /// Database file not found and creation was not requested.
    #[error("database not found: {0}")]
    MissingDatabase(PathBuf),
    /// Required source column is absent from the header row.
    #[error("missing column '{column}' in source")]
    MissingColumn {
        /// Header name that was expected.
        column: String,
    },
    /// Required cell is empty.
    #[error("missing value for column '{column}' at row {row}")]
    MissingValue {
        /// Header name of the empty cell.
        column: String,
        /// Zero-based data row index.
        row: usize,
    },
    /// Fact row references a code the dimension pass did not insert.
    #[error("{dimension} code '{code}' at row {row} has no dimension row")]
    MissingDimensionKey {
        /// Dimension the code was looked up in.
        dimension: Dimension,
        /// Natural key that failed to resolve.
        code: String,
        /// Zero-based data row index.
        row: usize,
    },
    /// Measure cell is not a number.
    #[error("column '{column}' at row {row}: '{value}' is not a number")]
    InvalidNumber {
        /// Header name of the cell.
        column: String,
        /// Raw cell text.
        value: String,
        /// Zero-based data row index.
        row: usize,
    },
    /// Relation or column name is not a plain identifier.
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
    /// Raw predicate text is not a single well-formed expression.
    #[error("invalid predicate '{predicate}': {reason}")]
    InvalidPredicate {
        /// Predicate text as given.
        predicate: String,
        /// What made it unusable.
        reason: &'static str,
    },
    /// SQLite rejected a rendered query (unknown column, bad raw predicate, ...).
    #[error("query failed: {source} (sql: {sql})")]
    Query {
        /// Statement text that failed.
        sql: String,
        /// Underlying SQLite error.
        #[source]
        source: rusqlite::Error,
    },
    /// Invalid argument.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FlightError>;

impl FlightError {
    pub(crate) fn missing_database(path: impl AsRef<Path>) -> Self {
        FlightError::MissingDatabase(path.as_ref().to_path_buf())
    }

    pub(crate) fn query(sql: impl Into<String>, source: rusqlite::Error) -> Self {
        FlightError::Query {
            sql: sql.into(),
            source,
        }
    }

    pub(crate) fn missing_column(column: impl Into<String>) -> Self {
        FlightError::MissingColumn {
            column: column.into(),
        }
    }
}
