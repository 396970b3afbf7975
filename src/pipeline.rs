//! End-to-end summary pipeline over a choice of engines.
//!
//! All engines consume the same typed [`DataSet`] and produce identical [`GroupedRecord`]s:
//!
//! - [`EngineKind::Parallel`]: chunked row projection + partial aggregation on the
//!   [`ExecutionEngine`] pool
//! - [`EngineKind::Frame`]: Polars lazy plans ([`crate::frame`])
//! - [`EngineKind::Sql`] (feature `sql`): rows projected on the engine pool, grouped by Polars SQL

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

use crate::error::SummaryResult;
use crate::execution::ExecutionEngine;
use crate::frame;
use crate::ingestion::{ingest_from_path, IngestionOptions};
use crate::processing::{classify_columns, GroupedRecord, SummaryProjector};
use crate::types::DataSet;

/// Which engine runs projection and aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EngineKind {
    /// In-crate rayon engine.
    #[default]
    Parallel,
    /// Polars lazy API.
    Frame,
    /// Polars SQL over a registered view.
    #[cfg(feature = "sql")]
    Sql,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Parallel => "parallel",
            EngineKind::Frame => "frame",
            #[cfg(feature = "sql")]
            EngineKind::Sql => "sql",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "parallel" => Ok(EngineKind::Parallel),
            "frame" => Ok(EngineKind::Frame),
            #[cfg(feature = "sql")]
            "sql" => Ok(EngineKind::Sql),
            other => Err(format!("unknown engine '{other}'")),
        }
    }
}

/// Options controlling a [`SummaryPipeline`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub engine: EngineKind,
    /// View name the summary frame is registered under for SQL execution.
    pub view_name: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            view_name: "respondent_summary".to_string(),
        }
    }
}

/// Runs classification, projection and aggregation on a borrowed engine handle.
///
/// # Examples
///
/// ```no_run
/// use time_use_summary::execution::{ExecutionEngine, ExecutionOptions};
/// use time_use_summary::ingestion::IngestionOptions;
/// use time_use_summary::pipeline::{PipelineOptions, SummaryPipeline};
///
/// # fn main() -> Result<(), time_use_summary::SummaryError> {
/// let engine = ExecutionEngine::new(ExecutionOptions::default());
/// let pipeline = SummaryPipeline::new(&engine, PipelineOptions::default());
/// for group in pipeline.run_path("atussum.csv", &IngestionOptions::default())? {
///     println!("{:?} {}", group.key().labels(), group.primary_needs);
/// }
/// # Ok(())
/// # }
/// ```
pub struct SummaryPipeline<'e> {
    engine: &'e ExecutionEngine,
    options: PipelineOptions,
}

impl<'e> SummaryPipeline<'e> {
    pub fn new(engine: &'e ExecutionEngine, options: PipelineOptions) -> Self {
        Self { engine, options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Summarize an already-ingested dataset.
    pub fn run(&self, dataset: &DataSet) -> SummaryResult<Vec<GroupedRecord>> {
        let start = Instant::now();
        let header: Vec<&str> = dataset.schema.field_names().collect();
        let groups = classify_columns(&header);
        tracing::debug!(
            primary_needs = groups.primary_needs.len(),
            work = groups.work.len(),
            other = groups.other.len(),
            unclassified = header.len() - groups.iter_all().count(),
            "classified columns"
        );

        let projector = SummaryProjector::new(&groups, &dataset.schema)?;

        let out = match self.options.engine {
            EngineKind::Parallel => self.engine.summarize(&projector, dataset),
            EngineKind::Frame => frame::summarize_frame(&groups, dataset)?,
            #[cfg(feature = "sql")]
            EngineKind::Sql => {
                let records = self.engine.project_parallel(&projector, dataset);
                frame::sql::aggregate_sql(&records, &self.options.view_name)?
            }
        };

        tracing::info!(
            engine = %self.options.engine,
            respondents = dataset.row_count(),
            groups = out.len(),
            elapsed = ?start.elapsed(),
            "summary complete"
        );
        Ok(out)
    }

    /// Ingest `path` and summarize it.
    pub fn run_path(&self, path: impl AsRef<Path>, ingestion: &IngestionOptions) -> SummaryResult<Vec<GroupedRecord>> {
        let dataset = ingest_from_path(path, ingestion)?;
        self.run(&dataset)
    }
}
