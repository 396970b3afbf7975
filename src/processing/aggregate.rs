//! Group-by-and-average over [`SummaryRecord`]s.
//!
//! Partial results are kept as `(count, minute sums)` per key so that tables built over separate
//! chunks can be merged before any division or rounding takes place. Summing minutes rather than
//! hours keeps whole-minute sums exact in any order, so a mean of exactly `x.5` hours rounds up.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use super::project::{AgeBracket, Sex, SummaryRecord, WorkingStatus, MINUTES_PER_HOUR};

/// Round to the nearest whole number, with halves rounded up (towards positive infinity).
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// The `(working, sex, age)` tuple records are grouped by.
///
/// Keys order by their text labels, compared lexicographically field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub working: WorkingStatus,
    pub sex: Sex,
    pub age: AgeBracket,
}

impl GroupKey {
    pub fn of(record: &SummaryRecord) -> Self {
        Self {
            working: record.working,
            sex: record.sex,
            age: record.age,
        }
    }

    pub fn labels(&self) -> (&'static str, &'static str, &'static str) {
        (self.working.as_str(), self.sex.as_str(), self.age.as_str())
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.labels().cmp(&other.labels())
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Averaged hours for one group, rounded to whole numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupedRecord {
    pub working: WorkingStatus,
    pub sex: Sex,
    pub age: AgeBracket,
    pub primary_needs: f64,
    pub work: f64,
    pub other: f64,
}

impl GroupedRecord {
    pub fn key(&self) -> GroupKey {
        GroupKey {
            working: self.working,
            sex: self.sex,
            age: self.age,
        }
    }
}

/// Running count and minute sums for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupAccumulator {
    pub count: u64,
    /// `[primary_needs, work, other]` minute sums.
    pub minutes: [f64; 3],
}

impl GroupAccumulator {
    pub fn push(&mut self, record: &SummaryRecord) {
        self.count += 1;
        for (sum, m) in self.minutes.iter_mut().zip(record.minutes) {
            *sum += m;
        }
    }

    pub fn merge(&mut self, other: &GroupAccumulator) {
        self.count += other.count;
        for (sum, m) in self.minutes.iter_mut().zip(other.minutes) {
            *sum += m;
        }
    }

    /// Mean minutes, converted to hours and rounded. Only called on non-empty accumulators.
    pub fn finish(&self, key: GroupKey) -> GroupedRecord {
        let n = self.count.max(1) as f64;
        let [primary_needs, work, other] = self.minutes.map(|sum| round_half_up(sum / n / MINUTES_PER_HOUR));
        GroupedRecord {
            working: key.working,
            sex: key.sex,
            age: key.age,
            primary_needs,
            work,
            other,
        }
    }
}

/// Accumulators keyed and ordered by [`GroupKey`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupTable {
    groups: BTreeMap<GroupKey, GroupAccumulator>,
}

impl GroupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: &SummaryRecord) {
        self.groups.entry(GroupKey::of(record)).or_default().push(record);
    }

    /// Fold another partial table into this one.
    pub fn merge(&mut self, other: GroupTable) {
        for (key, acc) in other.groups {
            self.groups.entry(key).or_default().merge(&acc);
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Averaged, rounded groups in ascending key order.
    pub fn finish(&self) -> Vec<GroupedRecord> {
        self.groups.iter().map(|(key, acc)| acc.finish(*key)).collect()
    }
}

impl<'a> Extend<&'a SummaryRecord> for GroupTable {
    fn extend<I: IntoIterator<Item = &'a SummaryRecord>>(&mut self, iter: I) {
        for record in iter {
            self.push(record);
        }
    }
}

impl Extend<SummaryRecord> for GroupTable {
    fn extend<I: IntoIterator<Item = SummaryRecord>>(&mut self, iter: I) {
        for record in iter {
            self.push(&record);
        }
    }
}

/// Group `records` by `(working, sex, age)` and average each group's hours.
///
/// Output has one entry per distinct key, sorted ascending. Empty input gives empty output.
pub fn aggregate(records: impl IntoIterator<Item = SummaryRecord>) -> Vec<GroupedRecord> {
    let mut table = GroupTable::new();
    table.extend(records);
    table.finish()
}
