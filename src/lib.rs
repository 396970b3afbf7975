//! `time-use-summary` turns a wide time-use survey file (one row per respondent, one
//! "minutes spent on activity X" column per activity code, plus demographic codes) into a small
//! table: average daily hours spent on primary needs, work and other activities, broken down by
//! working status, sex and age bracket.
//!
//! ## Pipeline
//!
//! 1. [`ingestion`]: read the CSV, infer the schema from the header (first column text, the rest
//!    numbers) and decode every record into a typed [`types::DataSet`].
//! 2. [`processing::classify_columns`]: assign activity columns to the three categories by
//!    activity-code prefix.
//! 3. [`processing::SummaryProjector`]: one [`processing::SummaryRecord`] per respondent in the
//!    labor force (`telfs <= 4`), minutes converted to hours.
//! 4. [`processing::aggregate`]: per `(working, sex, age)` averages, rounded half up to whole
//!    hours, sorted by key.
//!
//! Steps 3 and 4 run on one of three interchangeable engines selected through
//! [`pipeline::PipelineOptions`]: the chunked rayon [`execution::ExecutionEngine`], Polars lazy
//! plans ([`frame`]), or Polars SQL (feature `sql`, enabled by default).
//!
//! ## Quick example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use time_use_summary::execution::{ExecutionEngine, ExecutionOptions};
//! use time_use_summary::ingestion::{IngestionOptions, TracingObserver};
//! use time_use_summary::pipeline::{EngineKind, PipelineOptions, SummaryPipeline};
//!
//! # fn main() -> Result<(), time_use_summary::SummaryError> {
//! let engine = ExecutionEngine::new(ExecutionOptions::default());
//! let pipeline = SummaryPipeline::new(
//!     &engine,
//!     PipelineOptions {
//!         engine: EngineKind::Frame,
//!         ..Default::default()
//!     },
//! );
//! let ingestion = IngestionOptions {
//!     observer: Some(Arc::new(TracingObserver)),
//!     ..Default::default()
//! };
//!
//! for group in pipeline.run_path("atussum.csv", &ingestion)? {
//!     let (working, sex, age) = group.key().labels();
//!     println!("{working:>11} {sex:>6} {age:>6} {} {} {}", group.primary_needs, group.work, group.other);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: CSV reading, schema inference, row decoding, ingestion observers
//! - [`types`]: schema + in-memory dataset types
//! - [`processing`]: column classification, projection, aggregation, SQL text
//! - [`execution`]: parallel engine with throttling, metrics and observers
//! - [`frame`]: Polars-backed engine
//! - [`pipeline`]: engine selection and the end-to-end run
//! - [`error`]: the error type shared by all of the above

pub mod error;
pub mod execution;
pub mod frame;
pub mod ingestion;
pub mod pipeline;
pub mod processing;
pub mod types;

pub use error::{SummaryError, SummaryResult};
