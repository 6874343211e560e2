#![forbid(unsafe_code)]

//! The raw wide record set the loaders consume.
//!
//! A [`SourceTable`] is a header row plus string records, exactly as read
//! from the delimited extract. Values are not typed here; the loaders decide
//! how each column is interpreted.

mod names;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::types::{FlightError, Result};

pub use names::{normalize_column_name, strip_diacritics, NameStyle};

/// Default field delimiter of the extract.
pub const DEFAULT_DELIMITER: u8 = b';';

/// Header plus records of a wide extract.
#[derive(Clone, Debug, Default)]
pub struct SourceTable {
    headers: StringRecord,
    records: Vec<StringRecord>,
}

impl SourceTable {
    /// Reads a delimited file with a header row.
    pub fn from_path(path: impl AsRef<Path>, delimiter: u8) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let table = Self::from_reader(file, delimiter)?;
        debug!(
            path = %path.as_ref().display(),
            rows = table.len(),
            "source.read"
        );
        Ok(table)
    }

    /// Reads delimited text with a header row from any reader.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        let mut headers = reader.headers()?.clone();
        strip_bom(&mut headers);
        let mut records = Vec::new();
        for record in reader.records() {
            records.push(record?);
        }
        Ok(Self { headers, records })
    }

    /// Builds a table from in-memory headers and rows.
    pub fn from_records<H, N, R, C, S>(headers: H, rows: R) -> Self
    where
        H: IntoIterator<Item = N>,
        N: AsRef<str>,
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let headers = StringRecord::from_iter(headers.into_iter().map(|h| h.as_ref().to_owned()));
        let records = rows
            .into_iter()
            .map(|row| StringRecord::from_iter(row.into_iter().map(|v| v.as_ref().to_owned())))
            .collect();
        Self { headers, records }
    }

    /// Header row.
    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Data records, in file order.
    pub fn records(&self) -> &[StringRecord] {
        &self.records
    }

    /// Number of data records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when there are no data records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of `name` in the header row.
    ///
    /// Matches exactly first, then by normalized name so that accent or case
    /// drift in an extract (`MES` vs `MÊS`) still resolves.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        if let Some(idx) = self.headers.iter().position(|h| h == name) {
            return Ok(idx);
        }
        let wanted = normalize_column_name(name, NameStyle::Full);
        self.headers
            .iter()
            .position(|h| normalize_column_name(h, NameStyle::Full) == wanted)
            .ok_or_else(|| FlightError::missing_column(name))
    }

    /// Resolves every name in `names`, failing on the first absent column.
    pub fn column_indices(&self, names: &[&str]) -> Result<Vec<usize>> {
        names.iter().map(|name| self.column_index(name)).collect()
    }
}

/// Cell text at `idx`, `None` for a missing or blank cell.
pub fn cell(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|value| !value.is_empty())
}

fn strip_bom(headers: &mut StringRecord) {
    let Some(first) = headers.get(0) else {
        return;
    };
    if let Some(stripped) = first.strip_prefix('\u{feff}') {
        let mut fields: Vec<String> = headers.iter().map(str::to_owned).collect();
        fields[0] = stripped.to_owned();
        *headers = StringRecord::from(fields);
    }
}
