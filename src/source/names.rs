//! Header-name normalization.
//!
//! Source headers look like `AEROPORTO DE ORIGEM (PAÍS)` or
//! `CARGA PAGA (KG)`; target fields are ASCII snake case.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// How the parenthetical part of a header is treated.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NameStyle {
    /// Keep only the text inside the last parentheses:
    /// `EMPRESA (NACIONALIDADE)` → `nacionalidade`.
    Qualifier,
    /// Keep the whole header, dropping the parentheses themselves:
    /// `CARGA PAGA (KG)` → `carga_paga_kg`.
    Full,
}

/// Lower-cases, strips diacritics, applies `style` to parentheses, and joins
/// words with underscores.
pub fn normalize_column_name(header: &str, style: NameStyle) -> String {
    let lowered = header.trim().to_lowercase();
    let picked = match style {
        NameStyle::Qualifier => match lowered.rsplit_once('(') {
            Some((_, qualifier)) => qualifier.trim_end_matches(')').trim().to_string(),
            None => lowered,
        },
        NameStyle::Full => lowered,
    };
    let ascii = strip_diacritics(&picked.replace(['(', ')'], ""));
    ascii.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Removes combining marks after canonical decomposition (`ê` → `e`).
pub fn strip_diacritics(value: &str) -> String {
    value.nfd().filter(|ch| !is_combining_mark(*ch)).collect()
}
