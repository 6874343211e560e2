//! Composable row filters.
//!
//! A [`Filter`] is a small tree of column predicates. It carries no SQL of its
//! own except for [`Filter::Raw`]; rendering happens in
//! [`format_predicate`](crate::query::format_predicate).

use std::ops::Bound;

use crate::query::Value;

/// Predicate tree over the columns of one relation.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// `column = value`.
    Eq {
        /// Column to test.
        column: String,
        /// Expected value.
        value: Value,
    },
    /// `column IN (values…)`. An empty list matches nothing.
    In {
        /// Column to test.
        column: String,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// Value between two bounds, each inclusive, exclusive, or open.
    Range {
        /// Column to test.
        column: String,
        /// Lower bound.
        lower: Bound<Value>,
        /// Upper bound.
        upper: Bound<Value>,
    },
    /// Predicate text passed through verbatim. Never retargeted.
    Raw(String),
    /// Every child must hold. Empty means no restriction.
    And(Vec<Filter>),
    /// At least one child must hold. Empty, or with an unrestricted child,
    /// means no restriction.
    Or(Vec<Filter>),
}

impl Default for Filter {
    fn default() -> Self {
        Filter::all()
    }
}

impl Filter {
    /// Filter that restricts nothing.
    pub fn all() -> Self {
        Filter::And(Vec::new())
    }

    /// `column = value`.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    /// `column IN (values…)`.
    pub fn in_list<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Bounded range on `column`.
    pub fn range(column: impl Into<String>, lower: Bound<Value>, upper: Bound<Value>) -> Self {
        Filter::Range {
            column: column.into(),
            lower,
            upper,
        }
    }

    /// Verbatim predicate text.
    pub fn raw(predicate: impl Into<String>) -> Self {
        Filter::Raw(predicate.into())
    }

    /// Conjunction of equalities, one per `(column, value)` pair.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Filter::And(pairs.into_iter().map(|(k, v)| Filter::eq(k, v)).collect())
    }

    /// Conjunction of verbatim predicates.
    pub fn from_raw<I, S>(predicates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::And(predicates.into_iter().map(Filter::raw).collect())
    }

    /// `self AND other`, flattening nested conjunctions.
    pub fn and(self, other: Filter) -> Self {
        let mut parts = match self {
            Filter::And(parts) => parts,
            single => vec![single],
        };
        match other {
            Filter::And(more) => parts.extend(more),
            single => parts.push(single),
        }
        Filter::And(parts)
    }

    /// `self OR other`.
    pub fn or(self, other: Filter) -> Self {
        if self.is_empty() || other.is_empty() {
            return Filter::all();
        }
        let mut parts = match self {
            Filter::Or(parts) => parts,
            single => vec![single],
        };
        match other {
            Filter::Or(more) => parts.extend(more),
            single => parts.push(single),
        }
        Filter::Or(parts)
    }

    /// True when the filter restricts nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Filter::And(parts) => parts.iter().all(Filter::is_empty),
            Filter::Or(parts) => parts.is_empty() || parts.iter().any(Filter::is_empty),
            Filter::Raw(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Copy of the filter with `suffix` appended to every column name.
    ///
    /// Lets a filter written against shared attribute names (`uf`) target
    /// role-specific columns (`uf_aeroporto_origem`). Raw predicates are left
    /// untouched.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let retarget = |column: &str| format!("{column}{suffix}");
        match self {
            Filter::Eq { column, value } => Filter::Eq {
                column: retarget(column),
                value: value.clone(),
            },
            Filter::In { column, values } => Filter::In {
                column: retarget(column),
                values: values.clone(),
            },
            Filter::Range {
                column,
                lower,
                upper,
            } => Filter::Range {
                column: retarget(column),
                lower: lower.clone(),
                upper: upper.clone(),
            },
            Filter::Raw(text) => Filter::Raw(text.clone()),
            Filter::And(parts) => Filter::And(parts.iter().map(|f| f.with_suffix(suffix)).collect()),
            Filter::Or(parts) => Filter::Or(parts.iter().map(|f| f.with_suffix(suffix)).collect()),
        }
    }
}
