//! Flight statistics store.
//!
//! `flightdb` turns a wide, semicolon-delimited extract of civil aviation
//! movements into a small SQLite star schema (operators, airports, flight
//! events), builds the reporting views on top of it, and answers filtered
//! aggregate queries for dashboards.
//!
//! The usual flow is [`store::Store`] → [`source::SourceTable`] →
//! [`load::load_source`] → [`query::QueryEngine`] / [`report`].

#![warn(missing_docs)]

pub mod admin;
pub mod load;
pub mod query;
pub mod report;
pub mod schema;
pub mod source;
pub mod store;
pub mod types;
pub mod views;

pub use load::{load_source, LoadOptions, LoadReport, TableLoad};
pub use query::{Filter, QueryEngine, RowSet, Value};
pub use source::SourceTable;
pub use store::{Store, StoreOptions};
pub use types::{FlightError, Result};
