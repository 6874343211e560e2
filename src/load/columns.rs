//! Header names of the wide extract, grouped by the relation they feed.

/// Operator group.
pub const OPERATOR_HEADERS: [&str; 3] = [
    "EMPRESA (SIGLA)",
    "EMPRESA (NOME)",
    "EMPRESA (NACIONALIDADE)",
];

/// Airport group under the origin role.
pub const ORIGIN_HEADERS: [&str; 6] = [
    "AEROPORTO DE ORIGEM (SIGLA)",
    "AEROPORTO DE ORIGEM (NOME)",
    "AEROPORTO DE ORIGEM (UF)",
    "AEROPORTO DE ORIGEM (REGIÃO)",
    "AEROPORTO DE ORIGEM (PAÍS)",
    "AEROPORTO DE ORIGEM (CONTINENTE)",
];

/// Airport group under the destination role.
pub const DESTINATION_HEADERS: [&str; 6] = [
    "AEROPORTO DE DESTINO (SIGLA)",
    "AEROPORTO DE DESTINO (NOME)",
    "AEROPORTO DE DESTINO (UF)",
    "AEROPORTO DE DESTINO (REGIÃO)",
    "AEROPORTO DE DESTINO (PAÍS)",
    "AEROPORTO DE DESTINO (CONTINENTE)",
];

/// Event year.
pub const YEAR_HEADER: &str = "ANO";
/// Event month.
pub const MONTH_HEADER: &str = "MÊS";
/// Nature tag (domestic/international).
pub const NATURE_HEADER: &str = "NATUREZA";
/// Flight group tag (regular/charter/...).
pub const GROUP_HEADER: &str = "GRUPO DE VOO";

/// Numeric measures, in the column order of `voos`.
pub const MEASURE_HEADERS: [&str; 19] = [
    "PASSAGEIROS PAGOS",
    "PASSAGEIROS GRÁTIS",
    "CARGA PAGA (KG)",
    "CARGA GRÁTIS (KG)",
    "CORREIO (KG)",
    "ASK",
    "RPK",
    "ATK",
    "RTK",
    "COMBUSTÍVEL (LITROS)",
    "DISTÂNCIA VOADA (KM)",
    "DECOLAGENS",
    "CARGA PAGA KM",
    "CARGA GRATIS KM",
    "CORREIO KM",
    "ASSENTOS",
    "PAYLOAD",
    "HORAS VOADAS",
    "BAGAGEM (KG)",
];

/// Every header the loaders read.
pub fn required_headers() -> impl Iterator<Item = &'static str> {
    OPERATOR_HEADERS
        .into_iter()
        .chain(ORIGIN_HEADERS)
        .chain(DESTINATION_HEADERS)
        .chain([YEAR_HEADER, MONTH_HEADER, NATURE_HEADER, GROUP_HEADER])
        .chain(MEASURE_HEADERS)
}
