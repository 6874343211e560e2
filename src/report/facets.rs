//! Facet pickers and their composition into a detailed-view filter.

use crate::query::{Filter, QueryEngine, Value};
use crate::schema::{AEROPORTOS, EMPRESAS, VOOS};
use crate::types::Result;
use crate::views::{DESTINATION_SUFFIX, OPERATOR_SUFFIX, ORIGIN_SUFFIX};

/// Group of pickable attributes, one per base table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Facet {
    /// Airport attributes, matched under either role.
    Airport,
    /// Operator attributes.
    Operator,
    /// Event tags.
    Flight,
}

impl Facet {
    /// Every facet, in picker order.
    pub const ALL: [Facet; 3] = [Facet::Airport, Facet::Operator, Facet::Flight];

    /// Base table the options are read from.
    pub fn table(self) -> &'static str {
        match self {
            Facet::Airport => AEROPORTOS.name,
            Facet::Operator => EMPRESAS.name,
            Facet::Flight => VOOS.name,
        }
    }

    /// Pickable columns of [`Facet::table`].
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Facet::Airport => &["sigla", "nome", "uf", "regiao", "pais", "continente"],
            Facet::Operator => &["sigla", "nome", "nacionalidade"],
            Facet::Flight => &["ano", "mes", "natureza", "grupo_voo"],
        }
    }
}

/// Current picks, one filter per facet, written against base-table names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FacetSelection {
    /// Airport picks (`uf`, `sigla`, …).
    pub airport: Filter,
    /// Operator picks (`nome`, `nacionalidade`, …).
    pub operator: Filter,
    /// Event picks (`mes`, `natureza`, …).
    pub flight: Filter,
}

impl FacetSelection {
    /// Filter for one facet's own table.
    pub fn table_filter(&self, facet: Facet) -> &Filter {
        match facet {
            Facet::Airport => &self.airport,
            Facet::Operator => &self.operator,
            Facet::Flight => &self.flight,
        }
    }

    /// Filter over `RelatorioVoosDetalhado`.
    ///
    /// An airport pick matches an event when it holds for the origin or for
    /// the destination; operator picks target the `_empresa` columns; event
    /// picks apply as is. The three parts are ANDed.
    pub fn detailed_filter(&self) -> Filter {
        let airport = self
            .airport
            .with_suffix(ORIGIN_SUFFIX)
            .or(self.airport.with_suffix(DESTINATION_SUFFIX));
        airport
            .and(self.operator.with_suffix(OPERATOR_SUFFIX))
            .and(self.flight.clone())
    }
}

/// Sorted distinct values offered by a picker.
pub fn facet_options(
    engine: &QueryEngine,
    relation: &str,
    field: &str,
    filter: &Filter,
) -> Result<Vec<Value>> {
    engine.distinct(relation, field, filter)
}
