//! Headline numbers and breakdowns shown on the dashboard.

use serde::Serialize;
use tracing::debug;

use crate::query::{Counts, Filter, GroupCount, QueryEngine, Value};
use crate::types::Result;
use crate::views::{DETAILED_VIEW, MONTHLY_VIEW};

/// Bucket label for operators outside the top `n`.
pub const OTHERS_LABEL: &str = "OUTRAS";

/// Totals and per-departure ratios over the detailed view.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Headline {
    /// Paid plus free passengers.
    pub passengers: f64,
    /// Departures.
    pub departures: f64,
    /// Flight hours.
    pub flight_hours: f64,
    /// Fuel in litres.
    pub fuel_litres: f64,
    /// Distance flown in km.
    pub distance_km: f64,
    /// Paid plus free cargo plus mail, in kg.
    pub cargo_kg: f64,
    /// Mail in kg.
    pub mail_kg: f64,
    /// Baggage in kg.
    pub baggage_kg: f64,
    /// Passengers per departure; zero without departures.
    pub passengers_per_departure: f64,
    /// Litres per departure; zero without departures.
    pub fuel_per_departure: f64,
}

/// Computes [`Headline`] for events matching `filter`.
///
/// Ratios always come from the totals under the same filter.
pub fn headline_metrics(engine: &QueryEngine, filter: &Filter) -> Result<Headline> {
    let total = |fields: &[&str]| engine.sum(DETAILED_VIEW, fields, filter);
    let passengers = total(&["passageiros_pagos", "passageiros_gratis"])?;
    let departures = total(&["decolagens"])?;
    let fuel_litres = total(&["combustivel_litros"])?;
    let headline = Headline {
        passengers,
        departures,
        flight_hours: total(&["horas_voadas"])?,
        fuel_litres,
        distance_km: total(&["distancia_voada_km"])?,
        cargo_kg: total(&["carga_paga_kg", "carga_gratis_kg", "correio_kg"])?,
        mail_kg: total(&["correio_kg"])?,
        baggage_kg: total(&["bagagem_kg"])?,
        passengers_per_departure: ratio(passengers, departures),
        fuel_per_departure: ratio(fuel_litres, departures),
    };
    debug!(departures, passengers, "report.headline");
    Ok(headline)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// One month of [`MONTHLY_VIEW`] with the change from the previous month.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthlyChange {
    /// Month number.
    pub month: i64,
    /// Paid plus free passengers.
    pub passengers: f64,
    /// Departures.
    pub departures: f64,
    /// Fuel in litres.
    pub fuel_litres: f64,
    /// Paid cargo in kg.
    pub cargo_kg: f64,
    /// Percent change of `passengers`.
    pub passengers_pct: f64,
    /// Percent change of `departures`.
    pub departures_pct: f64,
    /// Percent change of `fuel_litres`.
    pub fuel_pct: f64,
    /// Percent change of `cargo_kg`.
    pub cargo_pct: f64,
}

/// Month-over-month percent change of monthly totals under `filter`.
///
/// An empty filter reads [`MONTHLY_VIEW`]; otherwise the months are summed
/// from the detailed view. The first month, and any change from a zero
/// base, is reported as 0.
pub fn monthly_variation(engine: &QueryEngine, filter: &Filter) -> Result<Vec<MonthlyChange>> {
    let months = if filter.is_empty() {
        summary_months(engine)?
    } else {
        filtered_months(engine, filter)?
    };
    debug!(months = months.len(), "report.monthly");

    let mut out: Vec<MonthlyChange> = Vec::with_capacity(months.len());
    for m in months {
        let change = |previous: fn(&MonthlyChange) -> f64, current: f64| {
            out.last().map_or(0.0, |prev| pct_change(previous(prev), current))
        };
        let row = MonthlyChange {
            passengers_pct: change(|p| p.passengers, m.passengers),
            departures_pct: change(|p| p.departures, m.departures),
            fuel_pct: change(|p| p.fuel_litres, m.fuel_litres),
            cargo_pct: change(|p| p.cargo_kg, m.cargo_kg),
            month: m.month,
            passengers: m.passengers,
            departures: m.departures,
            fuel_litres: m.fuel_litres,
            cargo_kg: m.cargo_kg,
        };
        out.push(row);
    }
    Ok(out)
}

struct MonthTotals {
    month: i64,
    passengers: f64,
    departures: f64,
    fuel_litres: f64,
    cargo_kg: f64,
}

fn month_number(value: &Value) -> i64 {
    match value {
        Value::Int(m) => *m,
        other => other.as_f64().unwrap_or_default() as i64,
    }
}

fn summary_months(engine: &QueryEngine) -> Result<Vec<MonthTotals>> {
    let rows = engine.fetch_all(
        MONTHLY_VIEW,
        &[
            "mes",
            "passageiros",
            "decolagens",
            "combustivel_litros",
            "carga_paga_kg",
        ],
        &Filter::raw("mes IS NOT NULL"),
    )?;
    let num = |v: &Value| v.as_f64().unwrap_or_default();
    Ok(rows
        .rows()
        .iter()
        .map(|row| MonthTotals {
            month: month_number(&row[0]),
            passengers: num(&row[1]),
            departures: num(&row[2]),
            fuel_litres: num(&row[3]),
            cargo_kg: num(&row[4]),
        })
        .collect())
}

fn filtered_months(engine: &QueryEngine, filter: &Filter) -> Result<Vec<MonthTotals>> {
    let filter = filter.clone().and(Filter::raw("mes IS NOT NULL"));
    let per_month = |fields: &[&str]| engine.grouped_sum(DETAILED_VIEW, fields, &filter, "mes");
    let passengers = per_month(&["passageiros_pagos", "passageiros_gratis"])?;
    let departures = per_month(&["decolagens"])?;
    let fuel = per_month(&["combustivel_litros"])?;
    let cargo = per_month(&["carga_paga_kg"])?;
    // Same filter and grouping, so the four lists share their month order.
    Ok(passengers
        .into_iter()
        .zip(departures)
        .zip(fuel)
        .zip(cargo)
        .map(|(((p, d), f), c)| MonthTotals {
            month: month_number(&p.value),
            passengers: p.total,
            departures: d.total,
            fuel_litres: f.total,
            cargo_kg: c.total,
        })
        .collect())
}

fn pct_change(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

/// Departures attributed to one operator, or to [`OTHERS_LABEL`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OperatorShare {
    /// Operator name.
    pub operator: String,
    /// Departures.
    pub departures: f64,
}

/// The `n` operators with most departures, then an `OUTRAS` bucket holding
/// the rest when it is positive.
pub fn top_operators(engine: &QueryEngine, filter: &Filter, n: usize) -> Result<Vec<OperatorShare>> {
    let mut shares: Vec<OperatorShare> = engine
        .grouped_sum(DETAILED_VIEW, &["decolagens"], filter, "nome_empresa")?
        .into_iter()
        .filter(|group| !group.value.is_null())
        .map(|group| OperatorShare {
            operator: group.value.to_string(),
            departures: group.total,
        })
        .collect();
    // Stable sort keeps name order among ties.
    shares.sort_by(|a, b| b.departures.total_cmp(&a.departures));

    let rest: f64 = shares.iter().skip(n).map(|s| s.departures).sum();
    shares.truncate(n);
    if rest > 0.0 {
        shares.push(OperatorShare {
            operator: OTHERS_LABEL.to_string(),
            departures: rest,
        });
    }
    Ok(shares)
}

/// Average occupied and offered seats per event.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeatOccupancy {
    /// Mean paid plus free passengers.
    pub occupied: f64,
    /// Mean seats offered.
    pub seats: f64,
    /// `seats - occupied`.
    pub vacant: f64,
}

/// Mean seat usage over events matching `filter`; `None` when nothing matched.
pub fn seat_occupancy(engine: &QueryEngine, filter: &Filter) -> Result<Option<SeatOccupancy>> {
    let occupied =
        engine.mean_of_sum(DETAILED_VIEW, &["passageiros_pagos", "passageiros_gratis"], filter)?;
    let seats = engine.mean_of_sum(DETAILED_VIEW, &["assentos"], filter)?;
    Ok(occupied.zip(seats).map(|(occupied, seats)| SeatOccupancy {
        occupied,
        seats,
        vacant: seats - occupied,
    }))
}

/// Events per value of `field` in the detailed view.
pub fn breakdown(engine: &QueryEngine, field: &str, filter: &Filter) -> Result<Counts> {
    engine.count(DETAILED_VIEW, filter, Some(field))
}

/// Events under one `outer` value, split by `inner`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NestedBreakdown {
    /// Value of the outer field.
    pub value: Value,
    /// Events across every inner value.
    pub count: u64,
    /// Events per inner value, ordered by value.
    pub children: Vec<GroupCount>,
}

/// Two-level count over the detailed view, e.g. `natureza` then `grupo_voo`.
pub fn nested_breakdown(
    engine: &QueryEngine,
    outer: &str,
    inner: &str,
    filter: &Filter,
) -> Result<Vec<NestedBreakdown>> {
    let mut out: Vec<NestedBreakdown> = Vec::new();
    for group in engine.count_by(DETAILED_VIEW, filter, &[outer, inner])? {
        let mut key = group.key.into_iter();
        let (Some(value), Some(child)) = (key.next(), key.next()) else {
            continue;
        };
        let child = GroupCount {
            value: child,
            count: group.count,
        };
        match out.last_mut() {
            Some(last) if last.value == value => {
                last.count += child.count;
                last.children.push(child);
            }
            _ => out.push(NestedBreakdown {
                value,
                count: child.count,
                children: vec![child],
            }),
        }
    }
    Ok(out)
}
