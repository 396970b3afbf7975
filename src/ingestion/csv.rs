//! CSV ingestion implementation.

use std::path::Path;

use crate::error::SummaryResult;
use crate::types::DataSet;

use super::decode::decode_row;
use super::schema::infer_schema;

/// Build a CSV reader with the settings survey files need.
///
/// The reader is `flexible` so that short or long records reach [`decode_row`] and are reported
/// with their line number instead of as a tokenizer error.
pub fn reader_builder(delimiter: u8) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true).delimiter(delimiter);
    builder
}

/// Ingest a CSV file into an in-memory [`DataSet`].
///
/// Rules:
///
/// - CSV must have headers; the schema is inferred from them.
/// - The first column is text, every other column must hold a decimal number.
/// - Any malformed record aborts ingestion.
pub fn ingest_csv_from_path(path: impl AsRef<Path>, delimiter: u8) -> SummaryResult<DataSet> {
    let mut rdr = reader_builder(delimiter).from_path(path)?;
    ingest_csv_from_reader(&mut rdr)
}

/// Ingest CSV data from an existing CSV reader.
pub fn ingest_csv_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> SummaryResult<DataSet> {
    let headers = rdr.headers()?.clone();
    let schema = infer_schema(&headers.iter().collect::<Vec<_>>())?;

    let mut rows = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        let record = result?;
        // Line the record starts on; quoted fields may span several lines.
        let user_row = record
            .position()
            .map_or(row_idx0 + 2, |pos| pos.line() as usize);
        let tokens: Vec<&str> = record.iter().collect();
        rows.push(decode_row(user_row, &tokens, &schema)?);
    }

    Ok(DataSet::new(schema, rows))
}

/// Header plus untyped records, as read from the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// Column names in file order.
    pub header: Vec<String>,
    /// One entry per data line.
    pub rows: Vec<Vec<String>>,
}

/// Read the header and raw string records without typing them.
pub fn read_raw_rows<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> SummaryResult<RawTable> {
    let header = rdr.headers()?.iter().map(str::to_owned).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_owned).collect());
    }
    Ok(RawTable { header, rows })
}
