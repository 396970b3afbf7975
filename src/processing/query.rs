//! Declarative (SQL) form of [`super::aggregate::aggregate`].
//!
//! The generated query runs against a view with the summary record columns holding minute totals
//! and returns the same groups, hour averages, rounding and order as the programmatic aggregator.
//! Averaging minutes and converting once keeps a mean of exactly `x.5` hours exact. `FLOOR(x + 0.5)`
//! is used instead of `ROUND` because engines disagree on how `ROUND` treats halves.

/// Grouping columns, in sort order.
pub const GROUP_COLUMNS: [&str; 3] = ["working", "sex", "age"];

/// Averaged columns, in output order.
pub const VALUE_COLUMNS: [&str; 3] = ["primary_needs", "work", "other"];

/// Build the grouped-summary query against `view`.
pub fn grouped_summary_query(view: &str) -> String {
    let keys = GROUP_COLUMNS.join(", ");
    let averages = VALUE_COLUMNS
        .iter()
        .map(|c| format!("FLOOR(AVG({c}) / 60.0 + 0.5) AS {c}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {keys}, {averages} FROM {view} GROUP BY {keys} ORDER BY {keys}")
}

#[cfg(test)]
mod tests {
    use super::grouped_summary_query;

    #[test]
    fn query_text_is_stable() {
        assert_eq!(
            grouped_summary_query("summary"),
            "SELECT working, sex, age, \
             FLOOR(AVG(primary_needs) / 60.0 + 0.5) AS primary_needs, \
             FLOOR(AVG(work) / 60.0 + 0.5) AS work, \
             FLOOR(AVG(other) / 60.0 + 0.5) AS other \
             FROM summary GROUP BY working, sex, age ORDER BY working, sex, age"
        );
    }

    #[test]
    fn view_name_is_substituted() {
        assert!(grouped_summary_query("atus_2019").contains("FROM atus_2019 GROUP BY"));
    }
}
