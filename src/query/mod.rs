#![forbid(unsafe_code)]

//! Filter language and read-only query engine.
//!
//! Filters are plain data ([`Filter`]); [`format_predicate`] renders them into
//! parameterized SQL and [`QueryEngine`] runs the resulting statements
//! against tables and views.

/// Query execution against a [`Store`](crate::store::Store).
///
/// Owns statement assembly and result decoding for every query operation.
pub mod engine;

/// Typed predicate trees and suffix retargeting.
pub mod filter;

/// Rendering of filters into SQL text plus bound parameters.
///
/// Also hosts identifier validation and quoting.
pub mod predicate;

/// Tabular results.
pub mod rows;

/// Scalar values shared by filters and results.
pub mod value;

pub use engine::{Counts, GroupCount, GroupSum, KeyCount, QueryEngine};
pub use filter::Filter;
pub use predicate::{format_predicate, quote_ident, validate_ident, Predicate};
pub use rows::RowSet;
pub use value::Value;
