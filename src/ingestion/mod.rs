//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest_from_path`] (from [`unified`]) which:
//!
//! - reads a delimited survey file into an in-memory [`crate::types::DataSet`]
//! - infers the schema from the header ([`schema`]) and types every record ([`decode`])
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]

pub mod csv;
pub mod decode;
pub mod observability;
pub mod schema;
pub mod unified;

pub use decode::decode_row;
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    TracingObserver,
};
pub use schema::infer_schema;
pub use unified::{ingest_from_path, IngestionOptions, IngestionRequest};
