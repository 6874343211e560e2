//! Static definitions of the normalized relations.

/// Storage class of a column.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ColumnType {
    /// `INTEGER`
    Integer,
    /// `REAL`
    Real,
    /// `TEXT`
    Text,
}

impl ColumnType {
    /// SQL type name used in DDL.
    pub const fn sql(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

/// One column of a [`TableDef`].
#[derive(Copy, Clone, Debug)]
pub struct ColumnDef {
    /// Column name.
    pub name: &'static str,
    /// Declared type.
    pub ty: ColumnType,
}

impl ColumnDef {
    const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self { name, ty }
    }
}

/// Foreign key from `column` to `references(id)`.
#[derive(Copy, Clone, Debug)]
pub struct ForeignKey {
    /// Referencing column.
    pub column: &'static str,
    /// Referenced table; always keyed by `id`.
    pub references: &'static str,
}

impl ForeignKey {
    const fn new(column: &'static str, references: &'static str) -> Self {
        Self { column, references }
    }
}

/// Declarative table definition. Every table gets an autoincrement `id`
/// unless `surrogate_id` is false.
#[derive(Debug)]
pub struct TableDef {
    /// Table name.
    pub name: &'static str,
    /// Whether an `id INTEGER PRIMARY KEY AUTOINCREMENT` column is prepended.
    pub surrogate_id: bool,
    /// Data columns, in insert order.
    pub columns: &'static [ColumnDef],
    /// Foreign keys.
    pub foreign_keys: &'static [ForeignKey],
    /// Column carrying the natural key, indexed `UNIQUE`.
    pub natural_key: Option<&'static str>,
}

impl TableDef {
    /// Names of the data columns, in insert order.
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this table.
    pub fn create_sql(&self) -> String {
        let mut parts = Vec::with_capacity(self.columns.len() + self.foreign_keys.len() + 1);
        if self.surrogate_id {
            parts.push("id INTEGER PRIMARY KEY AUTOINCREMENT".to_string());
        }
        for (idx, column) in self.columns.iter().enumerate() {
            if !self.surrogate_id && idx == 0 {
                parts.push(format!("{} {} PRIMARY KEY", column.name, column.ty.sql()));
            } else {
                parts.push(format!("{} {}", column.name, column.ty.sql()));
            }
        }
        for fk in self.foreign_keys {
            parts.push(format!(
                "FOREIGN KEY ({}) REFERENCES {}(id)",
                fk.column, fk.references
            ));
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.name,
            parts.join(",\n    ")
        )
    }

    /// `CREATE UNIQUE INDEX IF NOT EXISTS` statement for the natural key.
    pub fn natural_key_index_sql(&self) -> Option<String> {
        self.natural_key.map(|column| {
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_{column} ON {table} ({column})",
                table = self.name,
            )
        })
    }

    /// Parameterized single-row `INSERT` over the data columns.
    pub fn insert_sql(&self) -> String {
        let names: Vec<&str> = self.column_names().collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.name,
            names.join(", "),
            placeholders.join(", ")
        )
    }
}

/// Operators.
pub static EMPRESAS: TableDef = TableDef {
    name: "empresas",
    surrogate_id: true,
    columns: &[
        ColumnDef::new("sigla", ColumnType::Text),
        ColumnDef::new("nome", ColumnType::Text),
        ColumnDef::new("nacionalidade", ColumnType::Text),
    ],
    foreign_keys: &[],
    natural_key: Some("sigla"),
};

/// Airports, shared by the origin and destination roles.
pub static AEROPORTOS: TableDef = TableDef {
    name: "aeroportos",
    surrogate_id: true,
    columns: &[
        ColumnDef::new("sigla", ColumnType::Text),
        ColumnDef::new("nome", ColumnType::Text),
        ColumnDef::new("uf", ColumnType::Text),
        ColumnDef::new("regiao", ColumnType::Text),
        ColumnDef::new("pais", ColumnType::Text),
        ColumnDef::new("continente", ColumnType::Text),
    ],
    foreign_keys: &[],
    natural_key: Some("sigla"),
};

/// Flight-leg events. The first five columns are keys and tags; the rest are
/// the numeric measures copied from the source.
pub static VOOS: TableDef = TableDef {
    name: "voos",
    surrogate_id: true,
    columns: &[
        ColumnDef::new("empresa_id", ColumnType::Integer),
        ColumnDef::new("ano", ColumnType::Integer),
        ColumnDef::new("mes", ColumnType::Integer),
        ColumnDef::new("aeroporto_origem_id", ColumnType::Integer),
        ColumnDef::new("aeroporto_destino_id", ColumnType::Integer),
        ColumnDef::new("natureza", ColumnType::Text),
        ColumnDef::new("grupo_voo", ColumnType::Text),
        ColumnDef::new("passageiros_pagos", ColumnType::Integer),
        ColumnDef::new("passageiros_gratis", ColumnType::Integer),
        ColumnDef::new("carga_paga_kg", ColumnType::Integer),
        ColumnDef::new("carga_gratis_kg", ColumnType::Integer),
        ColumnDef::new("correio_kg", ColumnType::Integer),
        ColumnDef::new("ask", ColumnType::Integer),
        ColumnDef::new("rpk", ColumnType::Integer),
        ColumnDef::new("atk", ColumnType::Integer),
        ColumnDef::new("rtk", ColumnType::Integer),
        ColumnDef::new("combustivel_litros", ColumnType::Integer),
        ColumnDef::new("distancia_voada_km", ColumnType::Integer),
        ColumnDef::new("decolagens", ColumnType::Integer),
        ColumnDef::new("carga_paga_km", ColumnType::Integer),
        ColumnDef::new("carga_gratis_km", ColumnType::Integer),
        ColumnDef::new("correio_km", ColumnType::Integer),
        ColumnDef::new("assentos", ColumnType::Integer),
        ColumnDef::new("payload", ColumnType::Integer),
        ColumnDef::new("horas_voadas", ColumnType::Real),
        ColumnDef::new("bagagem_kg", ColumnType::Integer),
    ],
    foreign_keys: &[
        ForeignKey::new("empresa_id", "empresas"),
        ForeignKey::new("aeroporto_origem_id", "aeroportos"),
        ForeignKey::new("aeroporto_destino_id", "aeroportos"),
    ],
    natural_key: None,
};

/// Load-version markers, one row per completed load.
pub static CARGAS: TableDef = TableDef {
    name: "cargas",
    surrogate_id: false,
    columns: &[
        ColumnDef::new("versao", ColumnType::Integer),
        ColumnDef::new("carregado_em", ColumnType::Text),
        ColumnDef::new("empresas", ColumnType::Integer),
        ColumnDef::new("aeroportos", ColumnType::Integer),
        ColumnDef::new("voos", ColumnType::Integer),
    ],
    foreign_keys: &[],
    natural_key: None,
};

/// All tables, parents before children.
pub static ALL_TABLES: &[&TableDef] = &[&EMPRESAS, &AEROPORTOS, &VOOS, &CARGAS];

/// Looks a table up by name.
pub fn get_table(name: &str) -> Option<&'static TableDef> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}
