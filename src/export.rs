//! CSV export of the Normalized Table.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;

use crate::table::NormalizedTable;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// `{name lower-cased, whitespace → _, / → -}_{start}_{end}.csv`
pub fn csv_file_name(dataset_name: &str, start: NaiveDate, end: NaiveDate) -> String {
    let stem: String = dataset_name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace('/', "-");
    format!(
        "{stem}_{}_{}.csv",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

/// Header row of column names, then one record per row. Nulls are empty
/// fields and dates are `YYYY-MM-DD`.
pub fn write_csv<W: Write>(table: &NormalizedTable, writer: W) -> Result<W, ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if !table.columns.is_empty() {
        csv_writer.write_record(table.column_names())?;
        for row in &table.rows {
            csv_writer.write_record(row.iter().map(|cell| cell.to_plain_string()))?;
        }
    }
    csv_writer.flush()?;
    csv_writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))
}

pub fn to_csv_bytes(table: &NormalizedTable) -> Result<Vec<u8>, ExportError> {
    write_csv(table, Vec::new())
}

/// CSV text of the table; this is what the dashboard hands to the browser.
pub fn to_csv_string(table: &NormalizedTable) -> Result<String, ExportError> {
    let bytes = to_csv_bytes(table)?;
    String::from_utf8(bytes)
        .map_err(|err| ExportError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
}

pub fn write_csv_file(table: &NormalizedTable, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut file = write_csv(table, file)?;
    file.flush()?;
    Ok(())
}
