//! Semantic clean-up of the survey export.
//!
//! Runs after the structural edits: folds multi-column questions into one
//! combined column, drops rows without a respondent, removes personal data
//! columns, then rewrites rating labels and text through literal
//! replacement tables.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::models::{Column, Dataset, Value};

/// Separator between the values folded into a combined column.
pub const COMBINED_SEPARATOR: &str = "; ";

/// Columns whose name contains any of `patterns` are folded into `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnGroup {
    pub name: String,
    pub patterns: Vec<String>,
}

impl ColumnGroup {
    pub fn new(name: &str, patterns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Case-insensitive substring matcher over column names.
    pub fn matcher(&self) -> Result<Regex, regex::Error> {
        let alternation = self
            .patterns
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        RegexBuilder::new(&alternation).case_insensitive(true).build()
    }
}

/// A literal `from` → `to` substring replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

impl Replacement {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// What [`combine_groups`] did for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupReport {
    pub name: String,
    pub matched: Vec<String>,
}

/// Build one combined column per group.
///
/// A cell of the combined column joins the row's non-null values across
/// the matched columns, in column order. The combined column replaces an
/// existing column of the same name in place, otherwise it is appended.
pub fn combine_groups(
    dataset: &mut Dataset,
    groups: &[ColumnGroup],
) -> Result<Vec<GroupReport>, regex::Error> {
    let matchers = groups
        .iter()
        .map(ColumnGroup::matcher)
        .collect::<Result<Vec<_>, _>>()?;
    let mut reports = Vec::with_capacity(groups.len());

    for (group, matcher) in groups.iter().zip(&matchers) {
        let matched: Vec<&Column> = dataset
            .columns()
            .iter()
            .filter(|c| c.name != group.name && matcher.is_match(&c.name))
            .collect();

        let values = (0..dataset.row_count())
            .map(|row| {
                let parts: Vec<String> = matched
                    .iter()
                    .map(|c| &c.values[row])
                    .filter(|v| !v.is_null())
                    .map(|v| v.to_string())
                    .collect();
                Value::Text(parts.join(COMBINED_SEPARATOR))
            })
            .collect();

        let report = GroupReport {
            name: group.name.clone(),
            matched: matched.iter().map(|c| c.name.clone()).collect(),
        };
        dataset.upsert(Column::new(group.name.as_str(), values));
        reports.push(report);
    }

    Ok(reports)
}

/// Drop rows whose `key` cell is null or blank. Returns the number of rows
/// removed; a dataset without the key column is left alone.
pub fn filter_key_rows(dataset: &mut Dataset, key: &str) -> usize {
    let keep: Vec<bool> = match dataset.column(key) {
        Some(column) => column.values.iter().map(|v| !v.is_blank()).collect(),
        None => return 0,
    };
    let before = dataset.row_count();
    dataset.retain_rows(|row| keep[row]);
    before - dataset.row_count()
}

/// Remove every listed column that is present. Returns the removed names.
pub fn drop_columns(dataset: &mut Dataset, names: &[String]) -> Vec<String> {
    names
        .iter()
        .filter(|name| dataset.remove(name).is_some())
        .cloned()
        .collect()
}

/// Apply each replacement, in order, to every text cell. Returns the number
/// of cells that changed.
pub fn apply_replacements(dataset: &mut Dataset, table: &[Replacement]) -> usize {
    let mut changed = 0;
    for column in dataset.columns_mut() {
        for value in column.values.iter_mut() {
            if let Value::Text(text) = value {
                let replaced = replace_all(text, table);
                if replaced != *text {
                    *text = replaced;
                    changed += 1;
                }
            }
        }
    }
    changed
}

/// Apply `table` to a single string, pair by pair.
pub fn replace_all(text: &str, table: &[Replacement]) -> String {
    table
        .iter()
        .filter(|r| !r.from.is_empty())
        .fold(text.to_string(), |acc, r| acc.replace(&r.from, &r.to))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey() -> Dataset {
        Dataset::from_columns(vec![
            Column::new("Respondent ID", vec![Value::Int(1), Value::Null, Value::text("  "), Value::Int(4)]),
            Column::new(
                "Nan ki LOPITAL ou te ale ?",
                vec![Value::text("valueA"), Value::text("X"), Value::Null, Value::Null],
            ),
            Column::new(
                "Lopital 2",
                vec![Value::text("valueB"), Value::Null, Value::Null, Value::Null],
            ),
            Column::new(
                "Email Address",
                vec![Value::text("a@b"), Value::Null, Value::Null, Value::Null],
            ),
            Column::new(
                "Kouman sèvis la te ye ?",
                vec![Value::text("Trè byen"), Value::text("Byen"), Value::text("Pat bon ditou"), Value::Null],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_combine_joins_non_null_in_column_order() {
        let groups = vec![ColumnGroup::new("Hospital_Combined", &["lopital"])];
        let mut ds = survey();
        let reports = combine_groups(&mut ds, &groups).unwrap();

        assert_eq!(reports[0].matched.len(), 2);
        let combined = ds.column("Hospital_Combined").unwrap();
        assert_eq!(combined.values[0], Value::text("valueA; valueB"));
        assert_eq!(combined.values[1], Value::text("X"));
        assert_eq!(combined.values[3], Value::text(""));
        assert_eq!(ds.column_names().last().unwrap(), "Hospital_Combined");
    }

    #[test]
    fn test_combine_four_overlapping_hospital_columns() {
        let cell = |v: Option<&str>| v.map(Value::text).unwrap_or(Value::Null);
        let mut ds = Dataset::from_columns(vec![
            Column::new("Respondent ID", vec![Value::Int(1), Value::Int(2)]),
            Column::new("Lopital 1", vec![cell(None), cell(Some("HUEH"))]),
            Column::new("Lopital 2", vec![cell(Some("valueA")), cell(None)]),
            Column::new("Nòt", vec![cell(Some("5")), cell(Some("3"))]),
            Column::new("Lopital 3", vec![cell(None), cell(None)]),
            Column::new("Lòt lopital", vec![cell(Some("valueB")), cell(None)]),
        ])
        .unwrap();

        let groups = vec![ColumnGroup::new("Hospital_Combined", &["lopital"])];
        let reports = combine_groups(&mut ds, &groups).unwrap();

        assert_eq!(
            reports[0].matched,
            vec!["Lopital 1", "Lopital 2", "Lopital 3", "Lòt lopital"]
        );
        assert_eq!(
            ds.column("Hospital_Combined").unwrap().values,
            vec![Value::text("valueA; valueB"), Value::text("HUEH")]
        );
    }

    #[test]
    fn test_combine_without_match_yields_empty_column() {
        let groups = vec![ColumnGroup::new("Mistreatment_Combined", &["mal gade"])];
        let mut ds = survey();
        let reports = combine_groups(&mut ds, &groups).unwrap();
        assert!(reports[0].matched.is_empty());
        assert!(ds.column("Mistreatment_Combined").unwrap().is_entirely_empty());
    }

    #[test]
    fn test_combine_is_unicode_case_insensitive() {
        let mut ds = Dataset::from_columns(vec![
            Column::new("Ou SATISFÈ ?", vec![Value::text("wi")]),
            Column::new("Other", vec![Value::text("x")]),
        ])
        .unwrap();
        let groups = vec![ColumnGroup::new("Satisfaction_Combined", &["satisfè", "satisfe"])];
        let reports = combine_groups(&mut ds, &groups).unwrap();
        assert_eq!(reports[0].matched, vec!["Ou SATISFÈ ?"]);
        assert_eq!(ds.column("Satisfaction_Combined").unwrap().values[0], Value::text("wi"));
    }

    #[test]
    fn test_combine_replaces_existing_in_place() {
        let mut ds = Dataset::from_columns(vec![
            Column::new("Hospital_Combined", vec![Value::text("stale")]),
            Column::new("lopital", vec![Value::text("fresh")]),
        ])
        .unwrap();
        let groups = vec![ColumnGroup::new("Hospital_Combined", &["lopital"])];
        combine_groups(&mut ds, &groups).unwrap();
        assert_eq!(ds.column_names(), vec!["Hospital_Combined", "lopital"]);
        assert_eq!(ds.column("Hospital_Combined").unwrap().values[0], Value::text("fresh"));
    }

    #[test]
    fn test_filter_key_rows() {
        let mut ds = survey();
        assert_eq!(filter_key_rows(&mut ds, "Respondent ID"), 2);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(
            ds.column("Respondent ID").unwrap().values,
            vec![Value::Int(1), Value::Int(4)]
        );
        assert_eq!(filter_key_rows(&mut ds, "Missing"), 0);
    }

    #[test]
    fn test_drop_columns_ignores_absent() {
        let mut ds = survey();
        let removed = drop_columns(&mut ds, &["Email Address".to_string(), "First Name".to_string()]);
        assert_eq!(removed, vec!["Email Address"]);
        assert!(!ds.contains("Email Address"));
    }

    #[test]
    fn test_rating_table_is_order_sensitive_and_idempotent() {
        let table = vec![
            Replacement::new("Trè byen", "5 Etwal"),
            Replacement::new("Byen", "4 Etwal"),
            Replacement::new("Pat bon ditou", "1 Etwal"),
            Replacement::new("Long", "Long"),
        ];
        let mut ds = survey();
        let changed = apply_replacements(&mut ds, &table);
        assert_eq!(changed, 3);
        assert_eq!(
            ds.column("Kouman sèvis la te ye ?").unwrap().values,
            vec![Value::text("5 Etwal"), Value::text("4 Etwal"), Value::text("1 Etwal"), Value::Null]
        );

        let again = ds.clone();
        assert_eq!(apply_replacements(&mut ds, &table), 0);
        assert_eq!(ds, again);

        let longest_first = vec![
            Replacement::new("Trè byen", "5 Etwal"),
            Replacement::new("byen", "4 Etwal"),
        ];
        let shortest_first: Vec<Replacement> = longest_first.iter().rev().cloned().collect();
        assert_eq!(replace_all("Trè byen", &longest_first), "5 Etwal");
        assert_eq!(replace_all("Trè byen", &shortest_first), "Trè 4 Etwal");
    }

    #[test]
    fn test_replacements_leave_numbers_alone() {
        let mut ds = Dataset::from_columns(vec![Column::new("n", vec![Value::Int(5), Value::Null])]).unwrap();
        assert_eq!(apply_replacements(&mut ds, &[Replacement::new("5", "five")]), 0);
        assert_eq!(ds.column("n").unwrap().values[0], Value::Int(5));
    }
}
