//! Fixture builder shared by the integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use flightdb::load::columns::{
    required_headers, DESTINATION_HEADERS, GROUP_HEADER, MONTH_HEADER, NATURE_HEADER,
    OPERATOR_HEADERS, ORIGIN_HEADERS, YEAR_HEADER,
};
use flightdb::{load_source, LoadOptions, LoadReport, SourceTable, Store, StoreOptions};
use tempfile::TempDir;

/// Attributes of a known airport: sigla, nome, uf, regiao, pais, continente.
pub fn airport(code: &str) -> [&'static str; 6] {
    match code {
        "JFK" => ["JFK", "JOHN F KENNEDY", "", "", "ESTADOS UNIDOS", "AMÉRICA DO NORTE"],
        "LHR" => ["LHR", "HEATHROW", "", "", "REINO UNIDO", "EUROPA"],
        "CDG" => ["CDG", "CHARLES DE GAULLE", "", "", "FRANÇA", "EUROPA"],
        "SBGR" => ["SBGR", "GUARULHOS", "SP", "SUDESTE", "BRASIL", "AMÉRICA DO SUL"],
        "SBKP" => ["SBKP", "VIRACOPOS", "SP", "SUDESTE", "BRASIL", "AMÉRICA DO SUL"],
        "SBGL" => ["SBGL", "GALEÃO", "RJ", "SUDESTE", "BRASIL", "AMÉRICA DO SUL"],
        _ => ["XXX", "DESCONHECIDO", "", "", "", ""],
    }
}

/// Attributes of a known operator: sigla, nome, nacionalidade.
pub fn operator(code: &str) -> [&'static str; 3] {
    match code {
        "AA" => ["AA", "AMERICAN AIRLINES", "ESTRANGEIRA"],
        "BA" => ["BA", "BRITISH AIRWAYS", "ESTRANGEIRA"],
        "AZU" => ["AZU", "AZUL", "BRASILEIRA"],
        "GLO" => ["GLO", "GOL", "BRASILEIRA"],
        _ => ["ZZZ", "OUTRA", ""],
    }
}

/// One row of the wide extract.
#[derive(Clone, Debug)]
pub struct Leg {
    operator: [String; 3],
    origin: [String; 6],
    destination: [String; 6],
    year: String,
    month: String,
    nature: String,
    group: String,
    measures: Vec<(&'static str, String)>,
}

pub fn leg(op: &str, month: i64, origin: &str, destination: &str) -> Leg {
    Leg {
        operator: operator(op).map(String::from),
        origin: airport(origin).map(String::from),
        destination: airport(destination).map(String::from),
        year: "2023".to_string(),
        month: month.to_string(),
        nature: if airport(origin)[4] == airport(destination)[4] {
            "DOMÉSTICA".to_string()
        } else {
            "INTERNACIONAL".to_string()
        },
        group: "REGULAR".to_string(),
        measures: Vec::new(),
    }
}

impl Leg {
    /// Sets a measure cell by its header.
    pub fn with(mut self, header: &'static str, value: impl ToString) -> Self {
        self.measures.push((header, value.to_string()));
        self
    }

    pub fn passengers(self, paid: i64, free: i64) -> Self {
        self.with("PASSAGEIROS PAGOS", paid)
            .with("PASSAGEIROS GRÁTIS", free)
    }

    pub fn departures(self, n: i64) -> Self {
        self.with("DECOLAGENS", n)
    }

    /// Sets the flight group (`GRUPO DE VOO`).
    pub fn group(mut self, group: &str) -> Self {
        self.group = group.to_string();
        self
    }

    /// Overrides the operator's name, keeping its code.
    pub fn operator_name(mut self, name: &str) -> Self {
        self.operator[1] = name.to_string();
        self
    }

    /// Cells in [`required_headers`] order.
    pub fn record(&self) -> Vec<String> {
        required_headers()
            .map(|header| self.cell(header))
            .collect()
    }

    fn cell(&self, header: &str) -> String {
        let lookup = |headers: &[&str], values: &[String]| {
            headers
                .iter()
                .position(|h| *h == header)
                .map(|i| values[i].clone())
        };
        if let Some(v) = lookup(&OPERATOR_HEADERS[..], &self.operator[..])
            .or_else(|| lookup(&ORIGIN_HEADERS[..], &self.origin[..]))
            .or_else(|| lookup(&DESTINATION_HEADERS[..], &self.destination[..]))
        {
            return v;
        }
        match header {
            h if h == YEAR_HEADER => self.year.clone(),
            h if h == MONTH_HEADER => self.month.clone(),
            h if h == NATURE_HEADER => self.nature.clone(),
            h if h == GROUP_HEADER => self.group.clone(),
            _ => self
                .measures
                .iter()
                .rev()
                .find(|(h, _)| *h == header)
                .map(|(_, v)| v.clone())
                .unwrap_or_default(),
        }
    }
}

pub fn source(legs: &[Leg]) -> SourceTable {
    SourceTable::from_records(required_headers(), legs.iter().map(Leg::record))
}

/// Writes `legs` as a `;`-delimited extract.
pub fn write_csv(path: &Path, legs: &[Leg]) {
    let mut text = required_headers().collect::<Vec<_>>().join(";");
    text.push('\n');
    for leg in legs {
        text.push_str(&leg.record().join(";"));
        text.push('\n');
    }
    fs::write(path, text).expect("write csv");
}

/// The two-leg JFK/LHR scenario.
pub fn transatlantic() -> Vec<Leg> {
    vec![
        leg("AA", 1, "JFK", "LHR").passengers(100, 5).departures(1),
        leg("AA", 1, "LHR", "JFK").passengers(80, 0).departures(1),
    ]
}

/// A mix of domestic and international legs across three months.
pub fn mixed() -> Vec<Leg> {
    vec![
        leg("AA", 1, "JFK", "LHR")
            .passengers(100, 5)
            .departures(1)
            .with("COMBUSTÍVEL (LITROS)", 9000)
            .with("ASSENTOS", 120),
        leg("AA", 1, "LHR", "JFK")
            .passengers(80, 0)
            .departures(1)
            .with("COMBUSTÍVEL (LITROS)", 8800)
            .with("ASSENTOS", 120),
        leg("BA", 2, "LHR", "SBGR")
            .passengers(200, 2)
            .departures(2)
            .with("COMBUSTÍVEL (LITROS)", 20000)
            .with("ASSENTOS", 300),
        leg("AZU", 2, "SBKP", "SBGR")
            .passengers(90, 0)
            .departures(3)
            .with("CARGA PAGA (KG)", 500)
            .with("HORAS VOADAS", "0,75")
            .with("ASSENTOS", 100),
        leg("GLO", 3, "SBGR", "SBGL")
            .passengers(150, 10)
            .departures(4)
            .with("CORREIO (KG)", 40)
            .with("BAGAGEM (KG)", 1200)
            .with("ASSENTOS", 180),
    ]
}

pub fn setup_store(name: &str) -> (TempDir, PathBuf, Store) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(format!("{name}.db"));
    let store = Store::open(&path, StoreOptions::default()).expect("open store");
    (dir, path, store)
}

pub fn loaded_store(name: &str, legs: &[Leg]) -> (TempDir, Store, LoadReport) {
    let (dir, _, store) = setup_store(name);
    let report = load_source(&store, &source(legs), LoadOptions::default()).expect("load");
    (dir, store, report)
}
