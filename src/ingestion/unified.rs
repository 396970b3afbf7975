//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_from_path`], which reads a survey CSV into an in-memory
//! [`crate::types::DataSet`] with an inferred [`crate::types::Schema`].
//!
//! If an [`super::observability::IngestionObserver`] is provided, success/failure/alerts are
//! reported to it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{SummaryError, SummaryResult};
use crate::types::DataSet;

use super::csv;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// Field delimiter (defaults to `,`).
    pub delimiter: u8,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("delimiter", &(self.delimiter as char))
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Unified ingestion entry point for path-based sources.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row/column stats
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use time_use_summary::ingestion::{ingest_from_path, IngestionOptions, IngestionSeverity, TracingObserver};
///
/// # fn main() -> Result<(), time_use_summary::SummaryError> {
/// let opts = IngestionOptions {
///     observer: Some(Arc::new(TracingObserver)),
///     alert_at_or_above: IngestionSeverity::Critical,
///     ..Default::default()
/// };
///
/// let ds = ingest_from_path("atussum.csv", &opts)?;
/// println!("respondents={}", ds.row_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(path: impl AsRef<Path>, options: &IngestionOptions) -> SummaryResult<DataSet> {
    let path = path.as_ref();
    let ctx = IngestionContext {
        path: path.to_path_buf(),
        delimiter: options.delimiter,
    };

    let result = csv::ingest_csv_from_path(path, options.delimiter);

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(ds) => obs.on_success(
                &ctx,
                IngestionStats {
                    rows: ds.row_count(),
                    columns: ds.schema.len(),
                },
            ),
            Err(e) => {
                let sev = severity_for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

pub(crate) fn severity_for_error(e: &SummaryError) -> IngestionSeverity {
    match e {
        SummaryError::Io(_) => IngestionSeverity::Critical,
        SummaryError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        SummaryError::Polars(_)
        | SummaryError::SchemaError { .. }
        | SummaryError::ParseError { .. }
        | SummaryError::ArityMismatch { .. } => IngestionSeverity::Error,
    }
}

/// Convenience helper for callers that want an owned request object.
#[derive(Clone)]
pub struct IngestionRequest {
    /// Path to the input file.
    pub path: PathBuf,
    /// Options controlling ingestion.
    pub options: IngestionOptions,
}

impl fmt::Debug for IngestionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionRequest")
            .field("path", &self.path)
            .field("options", &self.options)
            .finish()
    }
}

impl IngestionRequest {
    /// Execute the request by calling [`ingest_from_path`].
    pub fn run(&self) -> SummaryResult<DataSet> {
        ingest_from_path(&self.path, &self.options)
    }
}
