//! In-memory summary transformations.
//!
//! The processing layer turns a typed [`crate::types::DataSet`] into the grouped summary table:
//!
//! - [`classify_columns()`]: assign activity columns to primary needs / work / other
//! - [`SummaryProjector`]: one [`SummaryRecord`] per respondent in the labor force
//! - [`aggregate()`]: per-group averages, rounded half up, in key order
//! - [`grouped_summary_query()`]: the same aggregation as SQL text
//!
//! ## Example: classify → project → aggregate
//!
//! ```rust
//! use time_use_summary::ingestion::{decode_row, infer_schema};
//! use time_use_summary::processing::{aggregate, classify_columns, SummaryProjector};
//! use time_use_summary::types::DataSet;
//!
//! let header = ["id", "t010101", "t050101", "t120101", "telfs", "tesex", "teage"];
//! let schema = infer_schema(&header).unwrap();
//! let row = decode_row(2, &["1", "120", "480", "30", "2", "1", "40"], &schema).unwrap();
//! let ds = DataSet::new(schema, vec![row]);
//!
//! let groups = classify_columns(&header);
//! let projector = SummaryProjector::new(&groups, &ds.schema).unwrap();
//! let grouped = aggregate(projector.project(&ds));
//!
//! assert_eq!(grouped.len(), 1);
//! assert_eq!(grouped[0].key().labels(), ("working", "male", "active"));
//! assert_eq!((grouped[0].primary_needs, grouped[0].work, grouped[0].other), (2.0, 8.0, 1.0));
//! ```

pub mod aggregate;
pub mod classify;
pub mod project;
pub mod query;

pub use aggregate::{aggregate, round_half_up, GroupAccumulator, GroupKey, GroupTable, GroupedRecord};
pub use classify::{classify_column, classify_columns, ColumnCategory, ColumnGroups};
pub use project::{AgeBracket, Sex, SummaryProjector, SummaryRecord, WorkingStatus};
pub use query::grouped_summary_query;
