#![allow(missing_docs)]

mod support;

use flightdb::query::{Filter, QueryEngine, Value};
use flightdb::query::GroupCount;
use flightdb::report::{
    breakdown, facet_options, headline_metrics, monthly_variation, nested_breakdown, route_legs,
    seat_occupancy, top_operators, AirportCoordinates, Coordinate, Facet, FacetSelection,
    OperatorShare, OTHERS_LABEL,
};
use flightdb::views::DETAILED_VIEW;
use tempfile::TempDir;

use support::{leg, loaded_store, mixed, transatlantic};

fn engine() -> (TempDir, QueryEngine) {
    let (dir, store, _) = loaded_store("report", &mixed());
    (dir, QueryEngine::new(store))
}

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}

#[test]
fn headline_totals_and_ratios() {
    let (_dir, q) = engine();
    let h = headline_metrics(&q, &Filter::all()).expect("headline");
    assert_eq!(h.passengers, 637.0);
    assert_eq!(h.departures, 11.0);
    assert_eq!(h.fuel_litres, 37_800.0);
    assert_eq!(h.cargo_kg, 540.0);
    assert_eq!(h.mail_kg, 40.0);
    assert_eq!(h.baggage_kg, 1_200.0);
    assert_eq!(h.flight_hours, 0.75);
    assert!(close(h.passengers_per_departure, 637.0 / 11.0));
    assert!(close(h.fuel_per_departure, 37_800.0 / 11.0));
}

#[test]
fn headline_ratios_follow_active_filter() {
    let (_dir, q) = engine();
    let h = headline_metrics(&q, &Filter::eq("mes", 1)).expect("headline");
    assert_eq!(h.passengers, 185.0);
    assert_eq!(h.departures, 2.0);
    assert_eq!(h.passengers_per_departure, 92.5);
    assert_eq!(h.fuel_per_departure, 8_900.0);

    let none = headline_metrics(&q, &Filter::eq("mes", 9)).expect("headline");
    assert_eq!(none.departures, 0.0);
    assert_eq!(none.passengers_per_departure, 0.0);
    assert_eq!(none.fuel_per_departure, 0.0);
}

#[test]
fn monthly_variation_against_previous_month() {
    let (_dir, q) = engine();
    let months = monthly_variation(&q, &Filter::all()).expect("monthly");
    let order: Vec<i64> = months.iter().map(|m| m.month).collect();
    assert_eq!(order, [1, 2, 3]);

    let first = &months[0];
    assert_eq!(first.passengers, 185.0);
    assert_eq!(first.passengers_pct, 0.0);
    assert_eq!(first.departures_pct, 0.0);

    let second = &months[1];
    assert_eq!(second.passengers, 292.0);
    assert!(close(second.passengers_pct, (292.0 - 185.0) / 185.0 * 100.0));
    assert_eq!(second.departures_pct, 150.0);
    // Cargo grows from a zero base.
    assert_eq!(second.cargo_kg, 500.0);
    assert_eq!(second.cargo_pct, 0.0);

    let third = &months[2];
    assert_eq!(third.departures_pct, -20.0);
    assert_eq!(third.fuel_pct, -100.0);
}

#[test]
fn monthly_variation_follows_the_filter() {
    let (_dir, q) = engine();
    let abroad = Filter::eq("natureza", "INTERNACIONAL");
    let months = monthly_variation(&q, &abroad).expect("monthly");
    let order: Vec<i64> = months.iter().map(|m| m.month).collect();
    assert_eq!(order, [1, 2]);

    assert_eq!(months[0].passengers, 185.0);
    assert_eq!(months[0].fuel_litres, 17_800.0);
    assert_eq!(months[0].passengers_pct, 0.0);

    let second = &months[1];
    assert_eq!(second.passengers, 202.0);
    assert_eq!(second.departures, 2.0);
    assert_eq!(second.departures_pct, 0.0);
    assert!(close(second.passengers_pct, (202.0 - 185.0) / 185.0 * 100.0));
    assert!(close(second.fuel_pct, (20_000.0 - 17_800.0) / 17_800.0 * 100.0));

    let unfiltered = monthly_variation(&q, &Filter::all()).expect("monthly");
    let summed = monthly_variation(&q, &Filter::raw("1 = 1")).expect("monthly");
    assert_eq!(unfiltered, summed);
}

#[test]
fn top_operators_bucket_the_rest() {
    let (_dir, q) = engine();
    let top = top_operators(&q, &Filter::all(), 2).expect("top");
    assert_eq!(
        top,
        [
            OperatorShare {
                operator: "GOL".to_string(),
                departures: 4.0
            },
            OperatorShare {
                operator: "AZUL".to_string(),
                departures: 3.0
            },
            OperatorShare {
                operator: OTHERS_LABEL.to_string(),
                departures: 4.0
            },
        ]
    );

    let everyone = top_operators(&q, &Filter::all(), 10).expect("top");
    assert_eq!(everyone.len(), 4);
    assert!(everyone.iter().all(|s| s.operator != OTHERS_LABEL));
}

#[test]
fn seat_occupancy_averages_per_event() {
    let (_dir, q) = engine();
    let seats = seat_occupancy(&q, &Filter::all())
        .expect("occupancy")
        .expect("some events");
    assert!(close(seats.occupied, 637.0 / 5.0));
    assert!(close(seats.seats, 164.0));
    assert!(close(seats.vacant, 164.0 - 637.0 / 5.0));

    assert!(seat_occupancy(&q, &Filter::eq("mes", 9))
        .expect("occupancy")
        .is_none());
}

#[test]
fn facet_selection_composes_across_roles() {
    let (_dir, q) = engine();
    let selection = FacetSelection {
        airport: Filter::eq("uf", "SP"),
        ..FacetSelection::default()
    };
    let filter = selection.detailed_filter();
    assert_eq!(q.count(DETAILED_VIEW, &filter, None).expect("count").total(), 3);

    let selection = FacetSelection {
        airport: Filter::eq("uf", "SP"),
        operator: Filter::eq("nacionalidade", "BRASILEIRA"),
        flight: Filter::eq("mes", 2),
    };
    let filter = selection.detailed_filter();
    let h = headline_metrics(&q, &filter).expect("headline");
    assert_eq!(h.departures, 3.0);
    assert_eq!(h.passengers, 90.0);

    assert!(FacetSelection::default().detailed_filter().is_empty());
}

#[test]
fn facet_options_are_sorted_and_filtered() {
    let (_dir, q) = engine();
    let ufs = facet_options(&q, Facet::Airport.table(), "uf", &Filter::all()).expect("ufs");
    assert_eq!(ufs, [Value::from("RJ"), Value::from("SP")]);

    let brazilian = facet_options(
        &q,
        Facet::Operator.table(),
        "nome",
        &Filter::eq("nacionalidade", "BRASILEIRA"),
    )
    .expect("names");
    assert_eq!(brazilian, [Value::from("AZUL"), Value::from("GOL")]);

    for facet in Facet::ALL {
        for field in facet.fields() {
            facet_options(&q, facet.table(), field, &Filter::all()).expect("options");
        }
    }
}

#[test]
fn breakdown_counts_by_field() {
    let (_dir, q) = engine();
    let by_group = breakdown(&q, "grupo_voo", &Filter::all()).expect("breakdown");
    assert_eq!(by_group.total(), 5);
    let by_month = breakdown(&q, "mes", &Filter::eq("natureza", "INTERNACIONAL")).expect("breakdown");
    assert_eq!(by_month.total(), 3);
}

#[test]
fn nested_breakdown_splits_nature_by_group() {
    let legs = vec![
        leg("AA", 1, "JFK", "LHR").departures(1),
        leg("AA", 1, "LHR", "JFK").group("FRETAMENTO").departures(1),
        leg("BA", 2, "LHR", "SBGR").departures(2),
        leg("AZU", 2, "SBKP", "SBGR").departures(3),
        leg("GLO", 3, "SBGR", "SBGL").group("FRETAMENTO").departures(4),
    ];
    let (_dir, store, _) = loaded_store("nested", &legs);
    let q = QueryEngine::new(store);

    let tree = nested_breakdown(&q, "natureza", "grupo_voo", &Filter::all()).expect("nested");
    assert_eq!(tree.len(), 2);
    let child = |value: &str, count| GroupCount {
        value: Value::from(value),
        count,
    };
    assert_eq!(tree[0].value, Value::from("DOMÉSTICA"));
    assert_eq!(tree[0].count, 2);
    assert_eq!(tree[0].children, [child("FRETAMENTO", 1), child("REGULAR", 1)]);
    assert_eq!(tree[1].value, Value::from("INTERNACIONAL"));
    assert_eq!(tree[1].count, 3);
    assert_eq!(tree[1].children, [child("FRETAMENTO", 1), child("REGULAR", 2)]);

    let january = nested_breakdown(&q, "natureza", "grupo_voo", &Filter::eq("mes", 1))
        .expect("nested");
    assert_eq!(january.len(), 1);
    assert_eq!(january[0].count, 2);
}

#[test]
fn route_legs_attach_injected_coordinates() {
    let (_dir, store, _) = loaded_store("routes", &transatlantic());
    let q = QueryEngine::new(store);
    let csv = "code,lon,lat\nJFK,-73.7789,40.6398\nLHR,-0.4614,51.4775\n";
    let coordinates = AirportCoordinates::from_reader(csv.as_bytes()).expect("coordinates");

    let legs = route_legs(&q, &coordinates, &Filter::all()).expect("legs");
    assert_eq!(legs.len(), 2);
    assert!(legs.iter().all(|leg| leg.is_mappable()));
    let outbound = legs
        .iter()
        .find(|leg| leg.origin.code == "JFK")
        .expect("JFK departure");
    assert_eq!(outbound.month, Some(1));
    assert_eq!(outbound.destination.code, "LHR");
    assert_eq!(outbound.destination.name.as_deref(), Some("HEATHROW"));
    assert_eq!(
        outbound.origin.coordinate,
        Some(Coordinate {
            lon: -73.7789,
            lat: 40.6398
        })
    );

    let only_jfk = |code: &str| (code == "JFK").then_some(Coordinate { lon: 0.0, lat: 0.0 });
    let legs = route_legs(&q, &only_jfk, &Filter::eq("sigla_origem", "LHR")).expect("legs");
    assert_eq!(legs.len(), 1);
    assert!(!legs[0].is_mappable());
    assert!(legs[0].destination.coordinate.is_some());
}
