#![allow(missing_docs)]

mod support;

use std::fs;

use flightdb::load::{load_source, marker, LoadOptions, TableLoad, LOAD_VERSION};
use flightdb::query::{Filter, QueryEngine, Value};
use flightdb::schema::{row_count, AEROPORTOS, EMPRESAS, VOOS};
use flightdb::{FlightError, SourceTable, Store};

use support::{leg, loaded_store, mixed, setup_store, source, transatlantic, write_csv};

fn counts(store: &Store) -> (u64, u64, u64) {
    let conn = store.connect().expect("connect");
    (
        row_count(&conn, &EMPRESAS).expect("empresas"),
        row_count(&conn, &AEROPORTOS).expect("aeroportos"),
        row_count(&conn, &VOOS).expect("voos"),
    )
}

#[test]
fn transatlantic_round_trip() {
    let (_dir, store, report) = loaded_store("round_trip", &transatlantic());
    assert!(!report.skipped);
    assert_eq!(report.operators, Some(TableLoad::Inserted(1)));
    assert_eq!(report.airports, Some(TableLoad::Inserted(2)));
    assert_eq!(report.events, Some(TableLoad::Inserted(2)));
    assert_eq!(report.source_rows, 2);

    let engine = QueryEngine::new(store);
    let total = engine
        .sum(
            "voos",
            &["passageiros_pagos", "passageiros_gratis"],
            &Filter::eq("mes", 1),
        )
        .expect("sum");
    assert_eq!(total, 185.0);
    let codes = engine
        .distinct("aeroportos", "sigla", &Filter::all())
        .expect("distinct");
    assert_eq!(codes, [Value::from("JFK"), Value::from("LHR")]);
}

#[test]
fn dimensions_are_deduplicated_and_unioned() {
    let (_dir, store, report) = loaded_store("dedup", &mixed());
    assert_eq!(report.operators, Some(TableLoad::Inserted(4)));
    // JFK, LHR, SBKP, SBGR as origins; SBGL appears only as a destination.
    assert_eq!(report.airports, Some(TableLoad::Inserted(5)));
    assert_eq!(counts(&store), (4, 5, 5));

    let engine = QueryEngine::new(store);
    let destination_only = engine
        .fetch_all("aeroportos", &["nome", "uf"], &Filter::eq("sigla", "SBGL"))
        .expect("fetch");
    assert_eq!(destination_only.len(), 1);
    assert_eq!(destination_only.get(0, "nome"), Some(&Value::from("GALEÃO")));
    assert_eq!(destination_only.get(0, "uf"), Some(&Value::from("RJ")));
}

#[test]
fn conflicting_code_keeps_first_tuple() {
    let legs = vec![
        leg("AZU", 1, "SBKP", "SBGR").departures(1),
        leg("AZU", 2, "SBGR", "SBKP")
            .operator_name("AZUL LINHAS AEREAS")
            .departures(1),
    ];
    let (_dir, store, report) = loaded_store("conflict", &legs);
    assert_eq!(report.operators, Some(TableLoad::Inserted(1)));
    assert_eq!(report.events, Some(TableLoad::Inserted(2)));

    let engine = QueryEngine::new(store);
    let names = engine
        .distinct("empresas", "nome", &Filter::all())
        .expect("names");
    assert_eq!(names, [Value::from("AZUL")]);
}

#[test]
fn every_event_resolves_its_dimensions() {
    let (_dir, store, _) = loaded_store("integrity", &mixed());
    let conn = store.connect().expect("connect");
    let orphans: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM voos v \
             LEFT JOIN empresas e ON v.empresa_id = e.id \
             LEFT JOIN aeroportos ao ON v.aeroporto_origem_id = ao.id \
             LEFT JOIN aeroportos ad ON v.aeroporto_destino_id = ad.id \
             WHERE e.id IS NULL OR ao.id IS NULL OR ad.id IS NULL",
            [],
            |row| row.get(0),
        )
        .expect("orphans");
    assert_eq!(orphans, 0);

    let route: (String, String) = conn
        .query_row(
            "SELECT ao.sigla, ad.sigla FROM voos v \
             JOIN aeroportos ao ON v.aeroporto_origem_id = ao.id \
             JOIN aeroportos ad ON v.aeroporto_destino_id = ad.id \
             WHERE v.mes = 3",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .expect("route");
    assert_eq!(route, ("SBGR".to_string(), "SBGL".to_string()));
}

#[test]
fn second_load_is_a_no_op() {
    let (_dir, _, store) = setup_store("idempotent");
    let first = load_source(&store, &source(&mixed()), LoadOptions::default()).expect("first");
    assert!(!first.skipped);
    let before = counts(&store);

    let second = load_source(&store, &source(&mixed()), LoadOptions::default()).expect("second");
    assert!(second.skipped);
    assert_eq!(second.events, None);
    assert_eq!(counts(&store), before);

    let conn = store.connect().expect("connect");
    assert!(marker(&conn, LOAD_VERSION).expect("marker").is_some());
}

#[test]
fn empty_extract_does_not_claim_the_version() {
    let (_dir, _, store) = setup_store("empty_then_real");
    let empty = load_source(&store, &source(&[]), LoadOptions::default()).expect("empty load");
    assert!(!empty.skipped);
    assert_eq!(empty.events, Some(TableLoad::Inserted(0)));
    let conn = store.connect().expect("connect");
    assert!(marker(&conn, LOAD_VERSION).expect("marker").is_none());

    let real = load_source(&store, &source(&transatlantic()), LoadOptions::default())
        .expect("real load");
    assert!(!real.skipped);
    assert_eq!(real.events, Some(TableLoad::Inserted(2)));
    assert_eq!(counts(&store), (1, 2, 2));
    assert!(marker(&conn, LOAD_VERSION).expect("marker").is_some());
}

#[test]
fn new_version_skips_populated_tables() {
    let (_dir, _, store) = setup_store("versioned");
    load_source(&store, &source(&transatlantic()), LoadOptions::default()).expect("v1");
    let report = load_source(
        &store,
        &source(&mixed()),
        LoadOptions {
            version: LOAD_VERSION + 1,
            ..LoadOptions::default()
        },
    )
    .expect("v2");
    assert!(!report.skipped);
    assert_eq!(report.operators, Some(TableLoad::Skipped(1)));
    assert_eq!(report.airports, Some(TableLoad::Skipped(2)));
    assert_eq!(report.events, Some(TableLoad::Skipped(2)));
    assert_eq!(counts(&store), (1, 2, 2));
}

#[test]
fn failed_load_writes_nothing() {
    let legs = vec![
        leg("AA", 1, "JFK", "LHR").passengers(100, 5),
        leg("AA", 1, "LHR", "JFK").with("PASSAGEIROS PAGOS", "muitos"),
    ];
    let (_dir, _, store) = setup_store("atomic");
    let err = load_source(&store, &source(&legs), LoadOptions::default()).expect_err("bad cell");
    match err {
        FlightError::InvalidNumber { column, value, row } => {
            assert_eq!(column, "PASSAGEIROS PAGOS");
            assert_eq!(value, "muitos");
            assert_eq!(row, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(counts(&store), (0, 0, 0));
    let conn = store.connect().expect("connect");
    assert!(marker(&conn, LOAD_VERSION).expect("marker").is_none());

    // A corrected extract loads normally afterwards.
    let report =
        load_source(&store, &source(&transatlantic()), LoadOptions::default()).expect("retry");
    assert!(!report.skipped);
    assert_eq!(counts(&store), (1, 2, 2));
}

#[test]
fn blank_natural_key_is_rejected() {
    let mut blank = leg("AA", 1, "JFK", "LHR");
    blank = blank.with("DECOLAGENS", 1);
    let mut table_rows: Vec<Vec<String>> = vec![blank.record()];
    // Origin code is the fourth header.
    table_rows[0][3] = String::new();
    let source = SourceTable::from_records(
        flightdb::load::columns::required_headers(),
        table_rows,
    );
    let (_dir, _, store) = setup_store("blank_key");
    let err = load_source(&store, &source, LoadOptions::default()).expect_err("blank key");
    assert!(matches!(err, FlightError::MissingValue { row: 0, .. }));
    assert_eq!(counts(&store), (0, 0, 0));
}

#[test]
fn missing_header_is_reported_by_name() {
    let source = SourceTable::from_records(["EMPRESA (SIGLA)"], [["AA"]]);
    let (_dir, _, store) = setup_store("missing_header");
    let err = load_source(&store, &source, LoadOptions::default()).expect_err("missing header");
    assert!(matches!(err, FlightError::MissingColumn { .. }));
}

#[test]
fn csv_extract_with_bom_and_header_drift_loads() {
    let (dir, _, store) = setup_store("csv");
    let path = dir.path().join("extract.csv");
    write_csv(&path, &mixed());
    let text = fs::read_to_string(&path).expect("read");
    let drifted = format!("\u{feff}{}", text.replacen("MÊS", "MES", 1));
    fs::write(&path, drifted).expect("write");

    let source = SourceTable::from_path(&path, b';').expect("parse");
    assert_eq!(source.len(), 5);
    let report = load_source(&store, &source, LoadOptions::default()).expect("load");
    assert_eq!(report.events, Some(TableLoad::Inserted(5)));

    let engine = QueryEngine::new(store);
    let hours = engine
        .sum("voos", &["horas_voadas"], &Filter::all())
        .expect("hours");
    assert_eq!(hours, 0.75);
    let months = engine.distinct("voos", "mes", &Filter::all()).expect("months");
    assert_eq!(months, [Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn blank_measures_are_stored_as_null() {
    let (_dir, store, _) = loaded_store("nulls", &transatlantic());
    let engine = QueryEngine::new(store);
    let rows = engine
        .fetch_all("voos", &["combustivel_litros"], &Filter::all())
        .expect("fetch");
    assert!(rows.rows().iter().all(|row| row[0].is_null()));
    assert_eq!(
        engine
            .sum("voos", &["combustivel_litros"], &Filter::all())
            .expect("sum"),
        0.0
    );
}

#[test]
fn load_without_views_leaves_them_absent() {
    let (_dir, _, store) = setup_store("no_views");
    load_source(
        &store,
        &source(&transatlantic()),
        LoadOptions {
            create_views: false,
            ..LoadOptions::default()
        },
    )
    .expect("load");
    let engine = QueryEngine::new(store);
    let err = engine
        .count("RelatorioVoosDetalhado", &Filter::all(), None)
        .expect_err("view absent");
    assert!(matches!(err, FlightError::Query { .. }));
}
