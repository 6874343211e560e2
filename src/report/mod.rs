#![forbid(unsafe_code)]

//! Reporting helpers layered on the query engine.
//!
//! Everything here returns plain data; rendering is left to the caller.

pub mod facets;
pub mod geo;
pub mod metrics;

pub use facets::{facet_options, Facet, FacetSelection};
pub use geo::{route_legs, AirportCoordinates, Coordinate, CoordinateLookup, Endpoint, RouteLeg};
pub use metrics::{
    breakdown, headline_metrics, monthly_variation, nested_breakdown, seat_occupancy,
    top_operators, Headline, MonthlyChange, NestedBreakdown, OperatorShare, SeatOccupancy,
    OTHERS_LABEL,
};
