//! Per-respondent projection into [`SummaryRecord`]s.

use std::fmt;

use serde::Serialize;

use crate::error::{SummaryError, SummaryResult};
use crate::types::{DataSet, DataType, Schema, Value};

use super::classify::ColumnGroups;

/// Labor-force status code column.
pub const LABOR_FORCE_COLUMN: &str = "telfs";
/// Sex code column.
pub const SEX_COLUMN: &str = "tesex";
/// Age column.
pub const AGE_COLUMN: &str = "teage";

/// Activity columns hold minutes; summaries are reported in hours.
pub const MINUTES_PER_HOUR: f64 = 60.0;

/// Respondents with a labor-force code above this are not in the labor force and are dropped.
pub const MAX_INCLUDED_LABOR_FORCE_CODE: f64 = 4.0;

/// Working status derived from `telfs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WorkingStatus {
    #[serde(rename = "working")]
    Working,
    #[serde(rename = "not working")]
    NotWorking,
}

impl WorkingStatus {
    /// Employed (`1 <= telfs < 3`) or not.
    pub fn from_code(telfs: f64) -> Self {
        if (1.0..3.0).contains(&telfs) {
            Self::Working
        } else {
            Self::NotWorking
        }
    }

    /// The label used in output and in frames.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Working => "working",
            Self::NotWorking => "not working",
        }
    }

    /// Inverse of [`Self::as_str`].
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "working" => Some(Self::Working),
            "not working" => Some(Self::NotWorking),
            _ => None,
        }
    }
}

/// Sex derived from `tesex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Code 1 is male; anything else is female.
    pub fn from_code(tesex: f64) -> Self {
        if tesex == 1.0 { Self::Male } else { Self::Female }
    }

    /// The label used in output and in frames.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    /// Inverse of [`Self::as_str`].
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }
}

/// Age bracket derived from `teage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeBracket {
    /// 15 to 22 inclusive.
    Young,
    /// 23 to 55 inclusive.
    Active,
    /// Everything else, including ages below 15.
    Elder,
}

impl AgeBracket {
    /// Bracket for an age in years.
    pub fn from_age(teage: f64) -> Self {
        if (15.0..=22.0).contains(&teage) {
            Self::Young
        } else if (23.0..=55.0).contains(&teage) {
            Self::Active
        } else {
            Self::Elder
        }
    }

    /// The label used in output and in frames.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Young => "young",
            Self::Active => "active",
            Self::Elder => "elder",
        }
    }

    /// Inverse of [`Self::as_str`].
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "young" => Some(Self::Young),
            "active" => Some(Self::Active),
            "elder" => Some(Self::Elder),
            _ => None,
        }
    }
}

macro_rules! impl_display_via_label {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

impl_display_via_label!(WorkingStatus, Sex, AgeBracket);

/// One respondent's daily hours per category.
///
/// The minute totals the hours were derived from are kept alongside them. Aggregation sums
/// minutes, which stay exact for whole-minute inputs, and converts to hours once per group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryRecord {
    pub working: WorkingStatus,
    pub sex: Sex,
    pub age: AgeBracket,
    pub primary_needs: f64,
    pub work: f64,
    pub other: f64,
    /// `[primary_needs, work, other]` in minutes.
    #[serde(skip)]
    pub minutes: [f64; 3],
}

impl SummaryRecord {
    /// Build a record from per-category minute totals, in `[primary_needs, work, other]` order.
    pub fn from_minutes(working: WorkingStatus, sex: Sex, age: AgeBracket, minutes: [f64; 3]) -> Self {
        let [primary_needs, work, other] = minutes.map(|m| m / MINUTES_PER_HOUR);
        Self {
            working,
            sex,
            age,
            primary_needs,
            work,
            other,
            minutes,
        }
    }
}

/// Projects typed rows into [`SummaryRecord`]s.
///
/// Column names are resolved to indices once, at construction, so projecting a row is a handful
/// of indexed reads.
#[derive(Debug, Clone)]
pub struct SummaryProjector {
    telfs: usize,
    tesex: usize,
    teage: usize,
    primary_needs: Vec<usize>,
    work: Vec<usize>,
    other: Vec<usize>,
}

impl SummaryProjector {
    /// Resolve `groups` and the demographic columns against `schema`.
    ///
    /// Fails with [`SummaryError::SchemaError`] if a required column is missing or not numeric.
    pub fn new(groups: &ColumnGroups, schema: &Schema) -> SummaryResult<Self> {
        Ok(Self {
            telfs: numeric_index(schema, LABOR_FORCE_COLUMN)?,
            tesex: numeric_index(schema, SEX_COLUMN)?,
            teage: numeric_index(schema, AGE_COLUMN)?,
            primary_needs: numeric_indices(schema, &groups.primary_needs)?,
            work: numeric_indices(schema, &groups.work)?,
            other: numeric_indices(schema, &groups.other)?,
        })
    }

    /// Compute the record for one row, whether or not it passes the filter.
    pub fn summarize_row(&self, row: &[Value]) -> (SummaryRecord, bool) {
        let telfs = number(row, self.telfs);
        let record = SummaryRecord::from_minutes(
            WorkingStatus::from_code(telfs),
            Sex::from_code(number(row, self.tesex)),
            AgeBracket::from_age(number(row, self.teage)),
            [
                minutes(row, &self.primary_needs),
                minutes(row, &self.work),
                minutes(row, &self.other),
            ],
        );
        (record, telfs <= MAX_INCLUDED_LABOR_FORCE_CODE)
    }

    /// The record for one row, or `None` if the respondent is filtered out.
    pub fn project_row(&self, row: &[Value]) -> Option<SummaryRecord> {
        let (record, keep) = self.summarize_row(row);
        keep.then_some(record)
    }

    /// Lazily project every row of `dataset`, in input order.
    pub fn project<'a>(&'a self, dataset: &'a DataSet) -> impl Iterator<Item = SummaryRecord> + 'a {
        dataset.rows.iter().filter_map(|row| self.project_row(row))
    }
}

fn numeric_index(schema: &Schema, name: &str) -> SummaryResult<usize> {
    let idx = schema
        .index_of(name)
        .ok_or_else(|| SummaryError::schema(format!("missing required column '{name}'")))?;
    if schema.fields[idx].data_type != DataType::Float64 {
        return Err(SummaryError::schema(format!(
            "column '{name}' must be numeric"
        )));
    }
    Ok(idx)
}

fn numeric_indices(schema: &Schema, names: &[String]) -> SummaryResult<Vec<usize>> {
    names.iter().map(|n| numeric_index(schema, n)).collect()
}

// Indices were checked against a Float64 field at construction.
fn number(row: &[Value], idx: usize) -> f64 {
    row.get(idx).and_then(Value::as_f64).unwrap_or_default()
}

fn minutes(row: &[Value], idxs: &[usize]) -> f64 {
    idxs.iter().map(|&i| number(row, i)).sum()
}

#[cfg(test)]
mod tests {
    use super::{AgeBracket, Sex, SummaryProjector, WorkingStatus};
    use crate::error::SummaryError;
    use crate::ingestion::{decode_row, infer_schema};
    use crate::processing::classify::{classify_columns, ColumnGroups};
    use crate::types::{DataSet, Value};

    const HEADER: [&str; 10] = [
        "tucaseid", "t010101", "t180101", "t050101", "t180501", "t120101", "t170101", "telfs", "tesex", "teage",
    ];

    fn dataset(rows: &[[&str; 10]]) -> DataSet {
        let schema = infer_schema(&HEADER).unwrap();
        let rows = rows
            .iter()
            .enumerate()
            .map(|(i, r)| decode_row(i + 2, r, &schema).unwrap())
            .collect();
        DataSet::new(schema, rows)
    }

    fn projector(ds: &DataSet) -> SummaryProjector {
        SummaryProjector::new(&classify_columns(&HEADER), &ds.schema).unwrap()
    }

    #[test]
    fn single_row_scenario() {
        let schema = infer_schema(&["id", "t010101", "t050101", "t120101", "telfs", "tesex", "teage"]).unwrap();
        let row = decode_row(2, &["1", "120", "480", "30", "2", "1", "40"], &schema).unwrap();
        let header: Vec<&str> = schema.field_names().collect();
        let groups = classify_columns(&header);
        assert_eq!(groups.primary_needs, vec!["t010101"]);
        assert_eq!(groups.work, vec!["t050101"]);
        assert_eq!(groups.other, vec!["t120101"]);

        let projector = SummaryProjector::new(&groups, &schema).unwrap();
        let rec = projector.project_row(&row).unwrap();
        assert_eq!(rec.working, WorkingStatus::Working);
        assert_eq!(rec.sex, Sex::Male);
        assert_eq!(rec.age, AgeBracket::Active);
        assert_eq!(rec.primary_needs, 2.0);
        assert_eq!(rec.work, 8.0);
        assert_eq!(rec.other, 0.5);
    }

    #[test]
    fn sums_minutes_per_group_and_converts_to_hours() {
        let ds = dataset(&[["a", "480", "30", "450", "30", "90", "999", "1", "2", "30"]]);
        let rec = projector(&ds).project(&ds).next().unwrap();
        assert_eq!(rec.primary_needs, 8.5);
        assert_eq!(rec.work, 8.0);
        assert_eq!(rec.other, 1.5);
        assert_eq!(rec.minutes, [510.0, 480.0, 90.0]);

        // Unclassified minutes (t170101) are not counted anywhere.
        let classified_minutes = 480.0 + 30.0 + 450.0 + 30.0 + 90.0;
        let total = rec.primary_needs + rec.work + rec.other;
        assert!((total - classified_minutes / 60.0).abs() < 1e-9);
    }

    #[test]
    fn labor_force_code_five_is_filtered_out() {
        let ds = dataset(&[
            ["a", "0", "0", "0", "0", "0", "0", "1", "1", "30"],
            ["b", "0", "0", "0", "0", "0", "0", "5", "1", "30"],
            ["c", "0", "0", "0", "0", "0", "0", "4", "1", "30"],
            ["d", "0", "0", "0", "0", "0", "0", "4.5", "1", "30"],
        ]);
        let p = projector(&ds);
        let out: Vec<_> = p.project(&ds).collect();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].working, WorkingStatus::Working);
        assert_eq!(out[1].working, WorkingStatus::NotWorking);

        // The excluded rows are still fully projected.
        let (rec, keep) = p.summarize_row(&ds.rows[1]);
        assert!(!keep);
        assert_eq!(rec.working, WorkingStatus::NotWorking);
    }

    #[test]
    fn working_status_boundaries() {
        assert_eq!(WorkingStatus::from_code(0.0), WorkingStatus::NotWorking);
        assert_eq!(WorkingStatus::from_code(1.0), WorkingStatus::Working);
        assert_eq!(WorkingStatus::from_code(2.0), WorkingStatus::Working);
        assert_eq!(WorkingStatus::from_code(2.99), WorkingStatus::Working);
        assert_eq!(WorkingStatus::from_code(3.0), WorkingStatus::NotWorking);
        assert_eq!(WorkingStatus::from_code(4.0), WorkingStatus::NotWorking);
    }

    #[test]
    fn sex_and_age_boundaries() {
        assert_eq!(Sex::from_code(1.0), Sex::Male);
        assert_eq!(Sex::from_code(2.0), Sex::Female);
        assert_eq!(Sex::from_code(0.0), Sex::Female);

        assert_eq!(AgeBracket::from_age(14.0), AgeBracket::Elder);
        assert_eq!(AgeBracket::from_age(15.0), AgeBracket::Young);
        assert_eq!(AgeBracket::from_age(22.0), AgeBracket::Young);
        assert_eq!(AgeBracket::from_age(22.5), AgeBracket::Elder);
        assert_eq!(AgeBracket::from_age(23.0), AgeBracket::Active);
        assert_eq!(AgeBracket::from_age(55.0), AgeBracket::Active);
        assert_eq!(AgeBracket::from_age(56.0), AgeBracket::Elder);
        assert_eq!(AgeBracket::from_age(85.0), AgeBracket::Elder);
    }

    #[test]
    fn empty_groups_sum_to_zero() {
        let schema = infer_schema(&["id", "telfs", "tesex", "teage"]).unwrap();
        let projector = SummaryProjector::new(&ColumnGroups::default(), &schema).unwrap();
        let row = vec![
            Value::Utf8("x".to_string()),
            Value::Float64(1.0),
            Value::Float64(1.0),
            Value::Float64(30.0),
        ];
        let rec = projector.project_row(&row).unwrap();
        assert_eq!((rec.primary_needs, rec.work, rec.other), (0.0, 0.0, 0.0));
    }

    #[test]
    fn missing_demographic_column_is_schema_error() {
        let schema = infer_schema(&["id", "t010101", "telfs", "tesex"]).unwrap();
        let err = SummaryProjector::new(&ColumnGroups::default(), &schema).unwrap_err();
        assert!(matches!(err, SummaryError::SchemaError { .. }));
        assert!(err.to_string().contains("'teage'"));
    }

    #[test]
    fn text_typed_demographic_column_is_schema_error() {
        let schema = infer_schema(&["telfs", "tesex", "teage"]).unwrap();
        let err = SummaryProjector::new(&ColumnGroups::default(), &schema).unwrap_err();
        assert!(err.to_string().contains("column 'telfs' must be numeric"));
    }

    #[test]
    fn labels_round_trip() {
        for w in [WorkingStatus::Working, WorkingStatus::NotWorking] {
            assert_eq!(WorkingStatus::from_label(w.as_str()), Some(w));
        }
        for s in [Sex::Male, Sex::Female] {
            assert_eq!(Sex::from_label(&s.to_string()), Some(s));
        }
        for a in [AgeBracket::Young, AgeBracket::Active, AgeBracket::Elder] {
            assert_eq!(AgeBracket::from_label(a.as_str()), Some(a));
        }
        assert_eq!(WorkingStatus::from_label("retired"), None);
    }
}
