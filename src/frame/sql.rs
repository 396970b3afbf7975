//! Declarative execution through Polars SQL.

use polars::prelude::*;
use polars_sql::SQLContext;

use crate::error::SummaryResult;
use crate::processing::{grouped_summary_query, GroupedRecord, SummaryRecord};

use super::{grouped_records_from_frame, minutes_records_to_frame};

/// Register a minutes frame (see [`super::minutes_frame`]) as `view` and run the grouped-summary
/// query against it.
pub fn grouped_frame_sql(minutes: LazyFrame, view: &str) -> SummaryResult<DataFrame> {
    let mut ctx = SQLContext::new();
    ctx.register(view, minutes);
    let query = grouped_summary_query(view);
    tracing::debug!(%query, "executing grouped summary query");
    Ok(ctx.execute(&query)?.collect()?)
}

/// Group already-projected records with SQL and read the result back.
pub fn aggregate_sql(records: &[SummaryRecord], view: &str) -> SummaryResult<Vec<GroupedRecord>> {
    let minutes = minutes_records_to_frame(records)?;
    let grouped = grouped_frame_sql(minutes.lazy(), view)?;
    grouped_records_from_frame(&grouped)
}
