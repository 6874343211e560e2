//! Rendering of [`Filter`] trees into parameterized SQL.

use std::ops::Bound;

use crate::query::{Filter, Value};
use crate::types::{FlightError, Result};

/// A rendered `WHERE` body with its positional parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    /// SQL text using `?` placeholders.
    pub sql: String,
    /// Values bound to the placeholders, in order.
    pub params: Vec<Value>,
}

/// Renders `filter` as a predicate, appending `suffix` to every column.
///
/// Returns `None` when the filter restricts nothing. Column names must be
/// plain identifiers; they are quoted with backticks so an unknown column is
/// rejected by the store instead of being read as a string literal.
///
/// # Errors
///
/// [`FlightError::InvalidIdentifier`] for a column that is not an identifier.
pub fn format_predicate(filter: &Filter, suffix: &str) -> Result<Option<Predicate>> {
    let mut params = Vec::new();
    let sql = render(filter, suffix, &mut params)?;
    Ok(sql.map(|sql| Predicate { sql, params }))
}

fn render(filter: &Filter, suffix: &str, params: &mut Vec<Value>) -> Result<Option<String>> {
    let sql = match filter {
        Filter::Eq { column, value } => {
            let column = quote_column(column, suffix)?;
            if value.is_null() {
                format!("{column} IS NULL")
            } else {
                params.push(value.clone());
                format!("{column} = ?")
            }
        }
        Filter::In { column, values } => {
            let column = quote_column(column, suffix)?;
            if values.is_empty() {
                // Matches nothing, like an empty IN list would.
                "0 = 1".to_string()
            } else {
                let marks = vec!["?"; values.len()].join(", ");
                params.extend(values.iter().cloned());
                format!("{column} IN ({marks})")
            }
        }
        Filter::Range {
            column,
            lower,
            upper,
        } => {
            let column = quote_column(column, suffix)?;
            let mut parts = Vec::with_capacity(2);
            match lower {
                Bound::Included(v) => {
                    params.push(v.clone());
                    parts.push(format!("{column} >= ?"));
                }
                Bound::Excluded(v) => {
                    params.push(v.clone());
                    parts.push(format!("{column} > ?"));
                }
                Bound::Unbounded => {}
            }
            match upper {
                Bound::Included(v) => {
                    params.push(v.clone());
                    parts.push(format!("{column} <= ?"));
                }
                Bound::Excluded(v) => {
                    params.push(v.clone());
                    parts.push(format!("{column} < ?"));
                }
                Bound::Unbounded => {}
            }
            match parts.len() {
                0 => format!("{column} IS NOT NULL"),
                1 => parts.remove(0),
                _ => format!("({})", parts.join(" AND ")),
            }
        }
        Filter::Raw(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            check_raw(text)?;
            format!("({text})")
        }
        Filter::And(parts) => return join(parts, " AND ", suffix, params),
        // An unrestricted branch makes the whole disjunction unrestricted.
        Filter::Or(parts) if parts.iter().any(Filter::is_empty) => return Ok(None),
        Filter::Or(parts) => return join(parts, " OR ", suffix, params),
    };
    Ok(Some(sql))
}

fn join(
    parts: &[Filter],
    sep: &str,
    suffix: &str,
    params: &mut Vec<Value>,
) -> Result<Option<String>> {
    let mut rendered = Vec::with_capacity(parts.len());
    for part in parts {
        if let Some(sql) = render(part, suffix, params)? {
            rendered.push(sql);
        }
    }
    Ok(match rendered.len() {
        0 => None,
        1 => rendered.pop(),
        _ => Some(format!("({})", rendered.join(sep))),
    })
}

fn quote_column(column: &str, suffix: &str) -> Result<String> {
    quote_ident(&format!("{column}{suffix}"))
}

/// Rejects raw text that could end the enclosing `WHERE` clause early:
/// statement separators, comments, and unbalanced parentheses or quotes.
/// Quoted literals and identifiers are skipped.
fn check_raw(text: &str) -> Result<()> {
    let invalid = |reason| {
        Err(FlightError::InvalidPredicate {
            predicate: text.to_string(),
            reason,
        })
    };
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' | '`' => quote = Some(ch),
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return invalid("unbalanced parentheses"),
            },
            ';' => return invalid("statement separator"),
            '-' if chars.peek() == Some(&'-') => return invalid("comment"),
            '/' if chars.peek() == Some(&'*') => return invalid("comment"),
            _ => {}
        }
    }
    if quote.is_some() {
        return invalid("unterminated quote");
    }
    if depth != 0 {
        return invalid("unbalanced parentheses");
    }
    Ok(())
}

/// Checks that `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_ident(name: &str) -> Result<&str> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(name)
    } else {
        Err(FlightError::InvalidIdentifier(name.to_string()))
    }
}

/// Validates `name` and wraps it in backticks.
pub fn quote_ident(name: &str) -> Result<String> {
    validate_ident(name).map(|name| format!("`{name}`"))
}
