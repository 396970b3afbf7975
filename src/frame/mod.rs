//! Polars-backed execution of the summary pipeline.
//!
//! The functions here express the projection, filter and grouping as [`LazyFrame`] plans instead
//! of row loops. They produce the same [`GroupedRecord`]s as [`crate::processing::aggregate()`].
//!
//! - [`dataset_to_frame`]: typed rows → [`DataFrame`]
//! - [`minutes_frame`]: per-respondent projection + labor-force filter, in minutes
//! - [`summary_frame`]: the same projection in hours
//! - [`grouped_frame`]: group-by, mean minutes, conversion to hours, half-up rounding, key sort
//! - [`sql::grouped_frame_sql`] (feature `sql`): the same grouping through Polars SQL

#[cfg(feature = "sql")]
pub mod sql;

use polars::prelude::*;

use crate::error::{SummaryError, SummaryResult};
use crate::processing::classify::ColumnGroups;
use crate::processing::project::{
    AGE_COLUMN, LABOR_FORCE_COLUMN, MAX_INCLUDED_LABOR_FORCE_CODE, MINUTES_PER_HOUR, SEX_COLUMN,
};
use crate::processing::query::{GROUP_COLUMNS, VALUE_COLUMNS};
use crate::processing::{AgeBracket, GroupedRecord, Sex, SummaryRecord, WorkingStatus};
use crate::types::{self, DataSet};

/// Build a [`DataFrame`] with one column per schema field.
pub fn dataset_to_frame(dataset: &DataSet) -> SummaryResult<DataFrame> {
    let columns = dataset
        .schema
        .fields
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let name = PlSmallStr::from(field.name.as_str());
            match field.data_type {
                types::DataType::Utf8 => {
                    let values: Vec<&str> = dataset
                        .rows
                        .iter()
                        .map(|row| row.get(idx).and_then(types::Value::as_str).unwrap_or_default())
                        .collect();
                    Column::new(name, values)
                }
                types::DataType::Float64 => {
                    let values: Vec<f64> = dataset
                        .rows
                        .iter()
                        .map(|row| row.get(idx).and_then(types::Value::as_f64).unwrap_or_default())
                        .collect();
                    Column::new(name, values)
                }
            }
        })
        .collect::<Vec<_>>();

    Ok(DataFrame::new(dataset.row_count(), columns)?)
}

fn minutes_expr(columns: &[String]) -> Expr {
    columns
        .iter()
        .fold(lit(0.0), |acc, c| acc + col(c.as_str()))
}

fn between(column: &str, low: f64, high: f64) -> Expr {
    col(column).gt_eq(lit(low)).and(col(column).lt_eq(lit(high)))
}

/// Project each respondent into labels and per-category minute totals, and drop those outside
/// the labor force.
///
/// The filter runs after the projection, on the original `telfs` value carried through it.
/// Output columns: `working, sex, age, primary_needs, work, other`.
pub fn minutes_frame(groups: &ColumnGroups, frame: LazyFrame) -> LazyFrame {
    let telfs = col(LABOR_FORCE_COLUMN);

    let working = when(telfs.clone().gt_eq(lit(1.0)).and(telfs.clone().lt(lit(3.0))))
        .then(lit(WorkingStatus::Working.as_str()))
        .otherwise(lit(WorkingStatus::NotWorking.as_str()))
        .alias("working");
    let sex = when(col(SEX_COLUMN).eq(lit(1.0)))
        .then(lit(Sex::Male.as_str()))
        .otherwise(lit(Sex::Female.as_str()))
        .alias("sex");
    let age = when(between(AGE_COLUMN, 15.0, 22.0))
        .then(lit(AgeBracket::Young.as_str()))
        .when(between(AGE_COLUMN, 23.0, 55.0))
        .then(lit(AgeBracket::Active.as_str()))
        .otherwise(lit(AgeBracket::Elder.as_str()))
        .alias("age");

    let output: Vec<Expr> = GROUP_COLUMNS.iter().chain(&VALUE_COLUMNS).map(|c| col(*c)).collect();

    frame
        .select([
            working,
            sex,
            age,
            minutes_expr(&groups.primary_needs).alias("primary_needs"),
            minutes_expr(&groups.work).alias("work"),
            minutes_expr(&groups.other).alias("other"),
            telfs,
        ])
        .filter(col(LABOR_FORCE_COLUMN).lt_eq(lit(MAX_INCLUDED_LABOR_FORCE_CODE)))
        .select(output)
}

/// [`minutes_frame`] with the value columns converted to hours.
pub fn summary_frame(groups: &ColumnGroups, frame: LazyFrame) -> LazyFrame {
    let hours: Vec<Expr> = VALUE_COLUMNS
        .iter()
        .map(|c| (col(*c) / lit(MINUTES_PER_HOUR)).alias(*c))
        .collect();
    minutes_frame(groups, frame).with_columns(hours)
}

/// Group a minutes frame (see [`minutes_frame`]) by `(working, sex, age)` and average each
/// category in hours.
///
/// The mean is taken over minutes and converted once, then rounded half up
/// (`floor(hours + 0.5)`); rows are sorted by key.
pub fn grouped_frame(minutes: LazyFrame) -> LazyFrame {
    let keys: Vec<Expr> = GROUP_COLUMNS.iter().map(|c| col(*c)).collect();
    let averages: Vec<Expr> = VALUE_COLUMNS
        .iter()
        .map(|c| (col(*c).mean() / lit(MINUTES_PER_HOUR) + lit(0.5)).floor().alias(*c))
        .collect();

    minutes
        .group_by(keys.clone())
        .agg(averages)
        .sort_by_exprs(keys, SortMultipleOptions::default())
}

fn labeled_frame(keys: &[(&str, &str, &str)], values: &[[f64; 3]]) -> SummaryResult<DataFrame> {
    let mut columns = Vec::with_capacity(6);
    columns.push(Column::new(
        GROUP_COLUMNS[0].into(),
        keys.iter().map(|k| k.0).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        GROUP_COLUMNS[1].into(),
        keys.iter().map(|k| k.1).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        GROUP_COLUMNS[2].into(),
        keys.iter().map(|k| k.2).collect::<Vec<_>>(),
    ));
    for (i, name) in VALUE_COLUMNS.iter().enumerate() {
        columns.push(Column::new(
            (*name).into(),
            values.iter().map(|v| v[i]).collect::<Vec<f64>>(),
        ));
    }
    Ok(DataFrame::new(keys.len(), columns)?)
}

fn record_keys(records: &[SummaryRecord]) -> Vec<(&'static str, &'static str, &'static str)> {
    records
        .iter()
        .map(|r| (r.working.as_str(), r.sex.as_str(), r.age.as_str()))
        .collect()
}

/// Materialize projected records as a summary frame, in hours.
pub fn summary_records_to_frame(records: &[SummaryRecord]) -> SummaryResult<DataFrame> {
    let values: Vec<_> = records
        .iter()
        .map(|r| [r.primary_needs, r.work, r.other])
        .collect();
    labeled_frame(&record_keys(records), &values)
}

/// Materialize projected records as a minutes frame, ready for [`grouped_frame`].
pub fn minutes_records_to_frame(records: &[SummaryRecord]) -> SummaryResult<DataFrame> {
    let values: Vec<_> = records.iter().map(|r| r.minutes).collect();
    labeled_frame(&record_keys(records), &values)
}

/// Materialize grouped records, e.g. for display.
pub fn grouped_records_to_frame(records: &[GroupedRecord]) -> SummaryResult<DataFrame> {
    let keys: Vec<_> = records.iter().map(|r| r.key().labels()).collect();
    let values: Vec<_> = records
        .iter()
        .map(|r| [r.primary_needs, r.work, r.other])
        .collect();
    labeled_frame(&keys, &values)
}

fn label<T>(value: Option<&str>, column: &str, parse: fn(&str) -> Option<T>) -> SummaryResult<T> {
    value.and_then(parse).ok_or_else(|| {
        SummaryError::schema(format!(
            "unexpected value {value:?} in grouped column '{column}'"
        ))
    })
}

fn number(value: Option<f64>, column: &str) -> SummaryResult<f64> {
    value.ok_or_else(|| SummaryError::schema(format!("null average in grouped column '{column}'")))
}

/// Read a grouped frame (as produced by [`grouped_frame`]) back into records.
pub fn grouped_records_from_frame(frame: &DataFrame) -> SummaryResult<Vec<GroupedRecord>> {
    let working = frame.column("working")?.str()?;
    let sex = frame.column("sex")?.str()?;
    let age = frame.column("age")?.str()?;
    let primary_needs = frame.column("primary_needs")?.f64()?;
    let work = frame.column("work")?.f64()?;
    let other = frame.column("other")?.f64()?;

    (0..frame.height())
        .map(|i| {
            Ok(GroupedRecord {
                working: label(working.get(i), "working", WorkingStatus::from_label)?,
                sex: label(sex.get(i), "sex", Sex::from_label)?,
                age: label(age.get(i), "age", AgeBracket::from_label)?,
                primary_needs: number(primary_needs.get(i), "primary_needs")?,
                work: number(work.get(i), "work")?,
                other: number(other.get(i), "other")?,
            })
        })
        .collect()
}

/// Run the whole pipeline on Polars: frame, project, group, read back.
pub fn summarize_frame(groups: &ColumnGroups, dataset: &DataSet) -> SummaryResult<Vec<GroupedRecord>> {
    let frame = dataset_to_frame(dataset)?;
    let grouped = grouped_frame(minutes_frame(groups, frame.lazy())).collect()?;
    grouped_records_from_frame(&grouped)
}
