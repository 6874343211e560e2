//! Airport coordinates and route legs for map rendering.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::query::{Filter, QueryEngine, Value};
use crate::types::Result;
use crate::views::ROUTES_VIEW;

/// Longitude/latitude pair in decimal degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Longitude.
    pub lon: f64,
    /// Latitude.
    pub lat: f64,
}

/// Resolves an airport code to its position.
pub trait CoordinateLookup {
    /// Position of `code`, `None` when unknown.
    fn coordinates(&self, code: &str) -> Option<Coordinate>;
}

impl<F> CoordinateLookup for F
where
    F: Fn(&str) -> Option<Coordinate>,
{
    fn coordinates(&self, code: &str) -> Option<Coordinate> {
        self(code)
    }
}

#[derive(Deserialize)]
struct CoordinateRecord {
    code: String,
    lon: f64,
    lat: f64,
}

/// In-memory coordinate table keyed by airport code.
#[derive(Clone, Debug, Default)]
pub struct AirportCoordinates {
    by_code: FxHashMap<String, Coordinate>,
}

impl AirportCoordinates {
    /// Reads a `code,lon,lat` CSV with a header row.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let table = Self::from_reader(file)?;
        debug!(
            path = %path.as_ref().display(),
            airports = table.len(),
            "geo.coordinates.loaded"
        );
        Ok(table)
    }

    /// Reads `code,lon,lat` CSV text from any reader. Later rows win.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let mut by_code = FxHashMap::default();
        for record in reader.deserialize::<CoordinateRecord>() {
            let record = record?;
            by_code.insert(
                record.code,
                Coordinate {
                    lon: record.lon,
                    lat: record.lat,
                },
            );
        }
        Ok(Self { by_code })
    }

    /// Adds or replaces one entry.
    pub fn insert(&mut self, code: impl Into<String>, coordinate: Coordinate) {
        self.by_code.insert(code.into(), coordinate);
    }

    /// Number of known airports.
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// True when no airport is known.
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

impl CoordinateLookup for AirportCoordinates {
    fn coordinates(&self, code: &str) -> Option<Coordinate> {
        self.by_code.get(code).copied()
    }
}

/// One end of a [`RouteLeg`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Endpoint {
    /// Airport code.
    pub code: String,
    /// Airport name.
    pub name: Option<String>,
    /// Position, when the lookup knows the code.
    pub coordinate: Option<Coordinate>,
}

/// One event of the routes view with both endpoints resolved.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouteLeg {
    /// Month of the event.
    pub month: Option<i64>,
    /// Departure airport.
    pub origin: Endpoint,
    /// Arrival airport.
    pub destination: Endpoint,
}

impl RouteLeg {
    /// True when both endpoints have coordinates.
    pub fn is_mappable(&self) -> bool {
        self.origin.coordinate.is_some() && self.destination.coordinate.is_some()
    }
}

/// Reads the routes view under `filter` and attaches coordinates.
pub fn route_legs<L>(engine: &QueryEngine, lookup: &L, filter: &Filter) -> Result<Vec<RouteLeg>>
where
    L: CoordinateLookup + ?Sized,
{
    let rows = engine.fetch_all(
        ROUTES_VIEW,
        &[
            "mes",
            "sigla_origem",
            "nome_origem",
            "sigla_destino",
            "nome_destino",
        ],
        filter,
    )?;
    let text = |v: &Value| v.as_str().map(str::to_owned);
    let endpoint = |code: &Value, name: &Value| {
        let code = text(code).unwrap_or_default();
        Endpoint {
            coordinate: lookup.coordinates(&code),
            name: text(name),
            code,
        }
    };

    let legs: Vec<RouteLeg> = rows
        .rows()
        .iter()
        .map(|row| RouteLeg {
            month: match row[0] {
                Value::Int(m) => Some(m),
                _ => None,
            },
            origin: endpoint(&row[1], &row[2]),
            destination: endpoint(&row[3], &row[4]),
        })
        .collect();
    let unmapped = legs.iter().filter(|leg| !leg.is_mappable()).count();
    if unmapped > 0 {
        warn!(unmapped, total = legs.len(), "geo.routes.missing_coordinates");
    }
    Ok(legs)
}
