//! Schema inference from a header row.

use std::collections::HashSet;

use crate::error::{SummaryError, SummaryResult};
use crate::types::{DataType, Field, Schema};

/// Infer the record schema from a header row.
///
/// The first column is the respondent identifier and is typed [`DataType::Utf8`]; every other
/// column is [`DataType::Float64`]. No field is nullable.
///
/// Fails with [`SummaryError::SchemaError`] if the header is empty, or if a name is blank or
/// repeated.
pub fn infer_schema<S: AsRef<str>>(header: &[S]) -> SummaryResult<Schema> {
    if header.is_empty() {
        return Err(SummaryError::schema("header is empty"));
    }

    let mut seen = HashSet::with_capacity(header.len());
    let mut fields = Vec::with_capacity(header.len());
    for (idx, name) in header.iter().enumerate() {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(SummaryError::schema(format!(
                "header column {} has an empty name",
                idx + 1
            )));
        }
        if !seen.insert(name) {
            return Err(SummaryError::schema(format!(
                "duplicate header column '{name}'"
            )));
        }
        let data_type = if idx == 0 {
            DataType::Utf8
        } else {
            DataType::Float64
        };
        fields.push(Field::new(name, data_type));
    }

    Ok(Schema::new(fields))
}

#[cfg(test)]
mod tests {
    use super::infer_schema;
    use crate::error::SummaryError;
    use crate::types::DataType;

    #[test]
    fn head_is_text_and_rest_are_floats() {
        let schema = infer_schema(&["tucaseid", "t010101", "telfs"]).unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.fields[0].data_type, DataType::Utf8);
        assert_eq!(schema.fields[1].data_type, DataType::Float64);
        assert_eq!(schema.fields[2].data_type, DataType::Float64);
        assert!(schema.fields.iter().all(|f| !f.nullable));
    }

    #[test]
    fn arity_matches_header_length() {
        for n in 1..=40 {
            let header: Vec<String> = (0..n).map(|i| format!("c{i}")).collect();
            let schema = infer_schema(&header).unwrap();
            assert_eq!(schema.len(), n);
            assert_eq!(schema.fields[0].data_type, DataType::Utf8);
            assert!(schema.fields[1..]
                .iter()
                .all(|f| f.data_type == DataType::Float64));
        }
    }

    #[test]
    fn single_column_header_is_valid() {
        let schema = infer_schema(&["id"]).unwrap();
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn empty_header_is_schema_error() {
        let header: [&str; 0] = [];
        let err = infer_schema(&header).unwrap_err();
        assert!(matches!(err, SummaryError::SchemaError { .. }));
        assert!(err.to_string().contains("header is empty"));
    }

    #[test]
    fn duplicate_and_blank_names_are_rejected() {
        let err = infer_schema(&["id", "t01", "t01"]).unwrap_err();
        assert!(err.to_string().contains("duplicate header column 't01'"));

        let err = infer_schema(&["id", " ", "t01"]).unwrap_err();
        assert!(err.to_string().contains("column 2 has an empty name"));
    }
}
