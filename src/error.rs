use thiserror::Error;

/// Convenience result type used across ingestion, processing and execution.
pub type SummaryResult<T> = Result<T, SummaryError>;

/// Error type returned by the summary pipeline.
///
/// Every variant aborts the run: there is no skip-and-continue mode. Row-level variants carry the
/// 1-based line number of the offending record (the header is line 1).
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV tokenizer error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Error raised by the Polars engine.
    #[error("polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// The header or schema is unusable (empty header, duplicate names, missing columns, etc.).
    #[error("schema error: {message}")]
    SchemaError { message: String },

    /// A data field could not be parsed as the type its schema field requires.
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// A record does not have as many tokens as the schema has fields.
    #[error("failed to parse row {row}: expected {expected} fields, found {found}")]
    ArityMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
}

impl SummaryError {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        Self::SchemaError {
            message: message.into(),
        }
    }

    /// Whether this error was raised while decoding a single record.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::ParseError { .. } | Self::ArityMismatch { .. })
    }
}
