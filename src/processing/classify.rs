//! Column classification by activity-code prefix.
//!
//! Activity columns are named after their six-digit activity code (`tXXYYZZ`). A column is
//! assigned to a category by the prefix rules below, checked in order: primary needs, then work,
//! then other. The first two claim the longer `t1801`/`t1803`/`t1805` travel codes, so the broad
//! `t18` rule only picks up the remaining travel columns.

/// Personal care, household activities, eating and drinking, and their travel codes.
pub const PRIMARY_NEEDS_PREFIXES: &[&str] = &["t01", "t03", "t11", "t1801", "t1803"];

/// Work and work-related travel.
pub const WORK_PREFIXES: &[&str] = &["t05", "t1805"];

/// Everything else that is counted.
pub const OTHER_PREFIXES: &[&str] = &[
    "t02", "t04", "t06", "t07", "t08", "t09", "t10", "t12", "t13", "t14", "t15", "t16", "t18",
];

/// The category a column is counted towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnCategory {
    PrimaryNeeds,
    Work,
    Other,
}

/// Classify a single column name, or `None` if no rule matches.
pub fn classify_column(name: &str) -> Option<ColumnCategory> {
    let matches = |prefixes: &[&str]| prefixes.iter().any(|p| name.starts_with(p));

    if matches(PRIMARY_NEEDS_PREFIXES) {
        Some(ColumnCategory::PrimaryNeeds)
    } else if matches(WORK_PREFIXES) {
        Some(ColumnCategory::Work)
    } else if matches(OTHER_PREFIXES) {
        Some(ColumnCategory::Other)
    } else {
        None
    }
}

/// Column names partitioned into the three summed categories.
///
/// Each list keeps the order the columns had in the header. The lists are pairwise disjoint;
/// columns matching no rule are absent from all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnGroups {
    pub primary_needs: Vec<String>,
    pub work: Vec<String>,
    pub other: Vec<String>,
}

impl ColumnGroups {
    /// The columns assigned to `category`.
    pub fn get(&self, category: ColumnCategory) -> &[String] {
        match category {
            ColumnCategory::PrimaryNeeds => &self.primary_needs,
            ColumnCategory::Work => &self.work,
            ColumnCategory::Other => &self.other,
        }
    }

    /// Iterate every classified column.
    pub fn iter_all(&self) -> impl Iterator<Item = &str> {
        self.primary_needs
            .iter()
            .chain(&self.work)
            .chain(&self.other)
            .map(String::as_str)
    }
}

/// Partition header columns into [`ColumnGroups`].
pub fn classify_columns<S: AsRef<str>>(columns: &[S]) -> ColumnGroups {
    let mut groups = ColumnGroups::default();
    for name in columns {
        let name = name.as_ref();
        match classify_column(name) {
            Some(ColumnCategory::PrimaryNeeds) => groups.primary_needs.push(name.to_owned()),
            Some(ColumnCategory::Work) => groups.work.push(name.to_owned()),
            Some(ColumnCategory::Other) => groups.other.push(name.to_owned()),
            None => {}
        }
    }
    groups
}
