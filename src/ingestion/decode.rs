//! Raw row → typed row conversion.

use crate::error::{SummaryError, SummaryResult};
use crate::types::{DataType, Schema, Value};

/// Decode one raw record into a typed row conforming to `schema`.
///
/// `row` is the 1-based line number reported in errors. Text fields are copied verbatim;
/// numeric fields are trimmed and parsed as `f64`.
pub fn decode_row<S: AsRef<str>>(row: usize, raw: &[S], schema: &Schema) -> SummaryResult<Vec<Value>> {
    if raw.len() != schema.len() {
        return Err(SummaryError::ArityMismatch {
            row,
            expected: schema.len(),
            found: raw.len(),
        });
    }

    schema
        .fields
        .iter()
        .zip(raw)
        .map(|(field, token)| parse_typed_value(row, &field.name, field.data_type, token.as_ref()))
        .collect()
}

fn parse_typed_value(row: usize, column: &str, data_type: DataType, raw: &str) -> SummaryResult<Value> {
    match data_type {
        DataType::Utf8 => Ok(Value::Utf8(raw.to_owned())),
        DataType::Float64 => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(SummaryError::ParseError {
                    row,
                    column: column.to_owned(),
                    raw: raw.to_owned(),
                    message: "missing numeric value".to_string(),
                });
            }
            let parse_error = |message: String| SummaryError::ParseError {
                row,
                column: column.to_owned(),
                raw: raw.to_owned(),
                message,
            };
            let value = trimmed.parse::<f64>().map_err(|e| parse_error(e.to_string()))?;
            // `f64::from_str` also accepts NaN and infinities.
            if !value.is_finite() {
                return Err(parse_error("not a finite decimal number".to_string()));
            }
            Ok(Value::Float64(value))
        }
    }
}
