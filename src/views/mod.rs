#![forbid(unsafe_code)]

//! Live reporting views over the normalized tables.
//!
//! Views are never materialized; each is created once by name and then
//! reflects whatever the base tables hold.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::schema::{relation_exists, RelationKind, AEROPORTOS, EMPRESAS, VOOS};
use crate::types::Result;

/// Events joined with their operator and both airports.
pub const DETAILED_VIEW: &str = "RelatorioVoosDetalhado";
/// Month plus origin/destination attributes, one row per event.
pub const ROUTES_VIEW: &str = "VoosToMap";
/// Per-month totals.
pub const MONTHLY_VIEW: &str = "ResumoMensal";

/// Suffix of operator attributes in [`DETAILED_VIEW`].
pub const OPERATOR_SUFFIX: &str = "_empresa";
/// Suffix of origin airport attributes in [`DETAILED_VIEW`].
pub const ORIGIN_SUFFIX: &str = "_aeroporto_origem";
/// Suffix of destination airport attributes in [`DETAILED_VIEW`].
pub const DESTINATION_SUFFIX: &str = "_aeroporto_destino";
/// Suffix of origin attributes in [`ROUTES_VIEW`].
pub const ROUTE_ORIGIN_SUFFIX: &str = "_origem";
/// Suffix of destination attributes in [`ROUTES_VIEW`].
pub const ROUTE_DESTINATION_SUFFIX: &str = "_destino";

/// Every view, in dependency order.
pub const ALL_VIEWS: [&str; 3] = [DETAILED_VIEW, ROUTES_VIEW, MONTHLY_VIEW];

/// Creates each reporting view that does not exist yet.
///
/// Returns how many views were created by this call.
pub fn ensure_views(conn: &Connection) -> Result<usize> {
    let mut created = 0;
    for name in ALL_VIEWS {
        if relation_exists(conn, RelationKind::View, name)? {
            debug!(view = name, "views.exists");
            continue;
        }
        conn.execute_batch(&view_sql(name))?;
        info!(view = name, "views.created");
        created += 1;
    }
    Ok(created)
}

fn view_sql(name: &str) -> String {
    let body = match name {
        DETAILED_VIEW => detailed_select(),
        ROUTES_VIEW => routes_select(),
        _ => monthly_select(),
    };
    format!("CREATE VIEW IF NOT EXISTS {name} AS\n{body}")
}

fn detailed_select() -> String {
    let mut cols = vec!["v.id".to_string()];
    cols.extend(
        EMPRESAS
            .column_names()
            .map(|c| format!("e.{c} AS {c}{OPERATOR_SUFFIX}")),
    );
    cols.push("v.ano".to_string());
    cols.push("v.mes".to_string());
    for (alias, suffix) in [("ao", ORIGIN_SUFFIX), ("ad", DESTINATION_SUFFIX)] {
        cols.extend(
            AEROPORTOS
                .column_names()
                .map(|c| format!("{alias}.{c} AS {c}{suffix}")),
        );
    }
    // Tags and measures, skipping the keys already expanded above.
    cols.extend(
        VOOS.column_names()
            .filter(|c| !c.ends_with("_id") && *c != "ano" && *c != "mes")
            .map(|c| format!("v.{c}")),
    );
    format!(
        "SELECT\n    {}\nFROM voos AS v\n\
         JOIN empresas AS e ON v.empresa_id = e.id\n\
         JOIN aeroportos AS ao ON v.aeroporto_origem_id = ao.id\n\
         JOIN aeroportos AS ad ON v.aeroporto_destino_id = ad.id",
        cols.join(",\n    ")
    )
}

fn routes_select() -> String {
    let mut cols = vec!["mes".to_string()];
    for (from, to) in [
        (ORIGIN_SUFFIX, ROUTE_ORIGIN_SUFFIX),
        (DESTINATION_SUFFIX, ROUTE_DESTINATION_SUFFIX),
    ] {
        cols.extend(
            AEROPORTOS
                .column_names()
                .map(|c| format!("{c}{from} AS {c}{to}")),
        );
    }
    format!("SELECT {} FROM {DETAILED_VIEW}", cols.join(", "))
}

fn monthly_select() -> String {
    "SELECT mes,\n    \
     TOTAL(COALESCE(passageiros_pagos, 0) + COALESCE(passageiros_gratis, 0)) AS passageiros,\n    \
     TOTAL(decolagens) AS decolagens,\n    \
     TOTAL(combustivel_litros) AS combustivel_litros,\n    \
     TOTAL(carga_paga_kg) AS carga_paga_kg\n\
     FROM voos\nGROUP BY mes\nORDER BY mes"
        .to_string()
}
