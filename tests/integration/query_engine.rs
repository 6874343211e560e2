#![allow(missing_docs)]

mod support;

use std::ops::Bound;

use flightdb::query::{format_predicate, Counts, Filter, GroupCount, QueryEngine, Value};
use flightdb::views::{DESTINATION_SUFFIX, DETAILED_VIEW, ORIGIN_SUFFIX};
use flightdb::FlightError;
use tempfile::TempDir;

use support::{loaded_store, mixed};

fn engine() -> (TempDir, QueryEngine) {
    let (dir, store, _) = loaded_store("query", &mixed());
    (dir, QueryEngine::new(store))
}

#[test]
fn suffixed_predicate_targets_role_column() {
    let filter = Filter::eq("continente", "EUROPA");
    let predicate = format_predicate(&filter, DESTINATION_SUFFIX)
        .expect("render")
        .expect("non-empty");
    assert_eq!(predicate.sql, "`continente_aeroporto_destino` = ?");
    assert_eq!(predicate.params, [Value::from("EUROPA")]);
}

#[test]
fn either_role_matches_union_of_endpoints() {
    let (_dir, q) = engine();
    let europe = Filter::eq("continente", "EUROPA");
    let either = europe
        .with_suffix(ORIGIN_SUFFIX)
        .or(europe.with_suffix(DESTINATION_SUFFIX));
    // JFK→LHR, LHR→JFK, LHR→SBGR
    assert_eq!(q.count(DETAILED_VIEW, &either, None).expect("count").total(), 3);

    let origin_only = europe.with_suffix(ORIGIN_SUFFIX);
    assert_eq!(q.count(DETAILED_VIEW, &origin_only, None).expect("count").total(), 2);
    let destination_only = europe.with_suffix(DESTINATION_SUFFIX);
    assert_eq!(
        q.count(DETAILED_VIEW, &destination_only, None)
            .expect("count")
            .total(),
        1
    );
}

#[test]
fn aggregates_have_neutral_values_on_empty_match() {
    let (_dir, q) = engine();
    let nothing = Filter::eq("mes", 12);
    assert_eq!(
        q.sum(DETAILED_VIEW, &["passageiros_pagos"], &nothing).expect("sum"),
        0.0
    );
    assert!(q.distinct(DETAILED_VIEW, "sigla_empresa", &nothing).expect("distinct").is_empty());
    assert_eq!(q.count(DETAILED_VIEW, &nothing, None).expect("count"), Counts::Total(0));
    assert_eq!(q.mean(DETAILED_VIEW, "decolagens", &nothing).expect("mean"), None);
    assert!(q.fetch_all(DETAILED_VIEW, &[], &nothing).expect("fetch").is_empty());
}

#[test]
fn empty_filter_matches_everything() {
    let (_dir, q) = engine();
    assert_eq!(q.count("voos", &Filter::all(), None).expect("count").total(), 5);
    let empty_raw = Filter::raw("  ");
    assert_eq!(q.count("voos", &empty_raw, None).expect("count").total(), 5);
}

#[test]
fn fetch_projects_and_filters() {
    let (_dir, q) = engine();
    let rows = q
        .fetch_all(
            DETAILED_VIEW,
            &["sigla_empresa", "sigla_aeroporto_origem", "sigla_aeroporto_destino"],
            &Filter::eq("mes", 2).and(Filter::eq("natureza", "DOMÉSTICA")),
        )
        .expect("fetch");
    assert_eq!(
        rows.columns(),
        ["sigla_empresa", "sigla_aeroporto_origem", "sigla_aeroporto_destino"]
    );
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.get(0, "sigla_empresa"), Some(&Value::from("AZU")));
    assert_eq!(rows.get(0, "sigla_aeroporto_origem"), Some(&Value::from("SBKP")));

    let json = serde_json::to_value(&rows).expect("json");
    assert_eq!(json[0]["sigla_aeroporto_destino"], "SBGR");
}

#[test]
fn raw_predicates_combine_with_equalities() {
    let (_dir, q) = engine();
    let filter = Filter::from_raw(["decolagens >= 2"]).and(Filter::eq("nacionalidade_empresa", "BRASILEIRA"));
    let total = q.sum(DETAILED_VIEW, &["decolagens"], &filter).expect("sum");
    assert_eq!(total, 7.0);
}

#[test]
fn membership_and_range_filters() {
    let (_dir, q) = engine();
    let in_sp_or_rj = Filter::in_list("uf_aeroporto_destino", ["SP", "RJ"]);
    assert_eq!(q.count(DETAILED_VIEW, &in_sp_or_rj, None).expect("count").total(), 3);

    let nothing = Filter::in_list("uf_aeroporto_destino", Vec::<Value>::new());
    assert_eq!(q.count(DETAILED_VIEW, &nothing, None).expect("count").total(), 0);

    let spring = Filter::range(
        "mes",
        Bound::Included(Value::Int(2)),
        Bound::Excluded(Value::Int(3)),
    );
    assert_eq!(q.count("voos", &spring, None).expect("count").total(), 2);
}

#[test]
fn grouped_counts_follow_group_order() {
    let (_dir, q) = engine();
    let counts = q
        .count(DETAILED_VIEW, &Filter::all(), Some("natureza"))
        .expect("count");
    assert_eq!(
        counts,
        Counts::Grouped(vec![
            GroupCount {
                value: Value::from("DOMÉSTICA"),
                count: 2
            },
            GroupCount {
                value: Value::from("INTERNACIONAL"),
                count: 3
            },
        ])
    );
}

#[test]
fn grouped_sum_by_month() {
    let (_dir, q) = engine();
    let groups = q
        .grouped_sum(
            "voos",
            &["passageiros_pagos", "passageiros_gratis"],
            &Filter::all(),
            "mes",
        )
        .expect("grouped");
    let totals: Vec<(Value, f64)> = groups.into_iter().map(|g| (g.value, g.total)).collect();
    assert_eq!(
        totals,
        [
            (Value::Int(1), 185.0),
            (Value::Int(2), 292.0),
            (Value::Int(3), 160.0)
        ]
    );
}

#[test]
fn identifiers_are_validated_before_sql() {
    let (_dir, q) = engine();
    let err = q
        .fetch_all("voos; DROP TABLE voos", &[], &Filter::all())
        .expect_err("bad relation");
    assert!(matches!(err, FlightError::InvalidIdentifier(_)));
    let err = q
        .sum("voos", &["decolagens) --"], &Filter::all())
        .expect_err("bad field");
    assert!(matches!(err, FlightError::InvalidIdentifier(_)));
    let err = q
        .count("voos", &Filter::eq("mes = 1 OR 1", 1), None)
        .expect_err("bad filter column");
    assert!(matches!(err, FlightError::InvalidIdentifier(_)));
    // Still intact.
    assert_eq!(q.count("voos", &Filter::all(), None).expect("count").total(), 5);
}

#[test]
fn raw_predicate_cannot_truncate_the_statement() {
    let (_dir, q) = engine();
    let err = q
        .count("voos", &Filter::raw("mes = 1); not valid sql at all --"), None)
        .expect_err("truncating predicate");
    assert!(matches!(err, FlightError::InvalidPredicate { .. }));
    let err = q
        .sum(DETAILED_VIEW, &["decolagens"], &Filter::raw("mes = 1; DELETE FROM voos"))
        .expect_err("second statement");
    assert!(matches!(err, FlightError::InvalidPredicate { .. }));
    let quoted = Filter::raw("sigla_empresa <> 'A;(--'");
    assert_eq!(q.count(DETAILED_VIEW, &quoted, None).expect("count").total(), 5);
}

#[test]
fn values_are_bound_not_interpolated() {
    let (_dir, q) = engine();
    let hostile = Filter::eq("sigla_empresa", "AA' OR '1'='1");
    assert_eq!(q.count(DETAILED_VIEW, &hostile, None).expect("count").total(), 0);
}

#[test]
fn unknown_column_surfaces_query_error() {
    let (_dir, q) = engine();
    let err = q
        .sum(DETAILED_VIEW, &["nao_existe"], &Filter::all())
        .expect_err("unknown column");
    match err {
        FlightError::Query { sql, .. } => assert!(sql.contains("nao_existe")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn query_connections_are_read_only() {
    let (_dir, q) = engine();
    let matched = q
        .count("voos", &Filter::raw("mes IN (SELECT mes FROM voos WHERE mes > 2)"), None)
        .expect("subquery in raw predicate");
    assert_eq!(matched.total(), 1);
    let conn = q.store().connect_read_only().expect("connect");
    assert!(conn.execute("DELETE FROM voos", []).is_err());
}
