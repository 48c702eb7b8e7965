//! Edit executor
//!
//! Applies an ordered list of structural edits to a dataset. Each edit sees
//! the column layout left by the previous ones.

use super::operations::StructuralEdit;
use crate::models::Dataset;

/// Result of executing an edit list
#[derive(Debug)]
pub struct EditOutcome {
    /// The edited dataset
    pub dataset: Dataset,
    /// Descriptions of the edits that ran
    pub applied: Vec<String>,
    /// Edits whose guard did not hold
    pub skipped: Vec<SkippedEdit>,
}

/// An edit that did not run
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEdit {
    /// Index of the edit in the list
    pub index: usize,
    pub edit: String,
    pub reason: String,
}

impl EditOutcome {
    pub fn summary(&self) -> String {
        format!(
            "{} edits applied, {} skipped, {} columns",
            self.applied.len(),
            self.skipped.len(),
            self.dataset.column_count()
        )
    }
}

/// Execute `edits` in order. Never fails: an edit that cannot run is skipped.
pub fn execute(mut dataset: Dataset, edits: &[StructuralEdit]) -> EditOutcome {
    let mut applied = Vec::new();
    let mut skipped = Vec::new();

    for (index, edit) in edits.iter().enumerate() {
        let guard = edit.guard();
        if !guard.holds(&dataset) {
            skipped.push(SkippedEdit {
                index,
                edit: edit.describe(),
                reason: guard.explain(&dataset),
            });
            continue;
        }

        let before = dataset.column_count();
        if edit.apply(&mut dataset) {
            let description = match edit {
                StructuralEdit::DropEmptyColumns => {
                    format!("drop empty columns ({} removed)", before - dataset.column_count())
                }
                _ => edit.describe(),
            };
            applied.push(description);
        } else {
            skipped.push(SkippedEdit {
                index,
                edit: edit.describe(),
                reason: "dataset rejected the change".to_string(),
            });
        }
    }

    EditOutcome {
        dataset,
        applied,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, Value};
    use crate::transform::dsl::plan::legacy_macro_plan;

    /// `n` columns named after their letter label, first row filled with
    /// the label, except the columns listed in `empty`.
    fn lettered(n: usize, empty: &[&str]) -> Dataset {
        let columns = (0..n)
            .map(|i| {
                let name = super::super::operations::letters_from_position(i);
                let value = if empty.contains(&name.as_str()) {
                    Value::Null
                } else {
                    Value::text(name.clone())
                };
                Column::new(name, vec![value])
            })
            .collect();
        Dataset::from_columns(columns).unwrap()
    }

    #[test]
    fn test_narrow_dataset_skips_positional_edits() {
        let plan = legacy_macro_plan();
        let outcome = execute(lettered(10, &[]), &plan.edits);

        assert_eq!(outcome.dataset.column_count(), 10);
        // Delete AC + two moves skipped, and every name-based edit too.
        assert_eq!(outcome.applied, vec!["drop empty columns (0 removed)".to_string()]);
        assert_eq!(outcome.skipped.len(), plan.edits.len() - 1);
    }

    #[test]
    fn test_macro_plan_positional_layout() {
        let columns = (0..50)
            .map(|i| Column::new(format!("c{i}"), vec![Value::Int(i)]))
            .collect();
        let ds = Dataset::from_columns(columns).unwrap();
        let outcome = execute(ds, &legacy_macro_plan().edits);

        // c28 (AC) deleted, then V:AA and AJ:AR resolved against the
        // layout each move sees.
        let expected: Vec<String> = (0..=20)
            .chain([27])
            .chain(29..=41)
            .chain(22..=26)
            .chain(42..=49)
            .chain([21])
            .map(|i| format!("c{i}"))
            .collect();
        assert_eq!(outcome.dataset.column_names(), expected);
        assert_eq!(outcome.applied.len(), 4);
    }

    #[test]
    fn test_macro_plan_named_edits() {
        let names = ["V", "AH", "AO", "AT", "AU", "Other"];
        let columns = names
            .iter()
            .map(|n| Column::new(*n, vec![Value::text(format!("{n}-value"))]))
            .collect();
        let outcome = execute(Dataset::from_columns(columns).unwrap(), &legacy_macro_plan().edits);

        assert_eq!(
            outcome.dataset.column_names(),
            vec!["AH_Renamed", "AO_Renamed", "AT_Renamed", "AU", "AV", "Other"]
        );
        assert_eq!(
            outcome.dataset.column("AV").unwrap().values,
            vec![Value::text("V-value")]
        );
    }

    #[test]
    fn test_drop_empty_after_moves() {
        let edits = vec![
            StructuralEdit::MoveRangeToEnd { first: "B".into(), last: "C".into() },
            StructuralEdit::DropEmptyColumns,
        ];
        let outcome = execute(lettered(5, &["C"]), &edits);
        assert_eq!(outcome.dataset.column_names(), vec!["A", "D", "E", "B"]);
        assert_eq!(outcome.applied[1], "drop empty columns (1 removed)");
    }

    #[test]
    fn test_drop_empty_skipped_without_rows() {
        let ds = Dataset::from_columns(vec![Column::new("A", vec![])]).unwrap();
        let outcome = execute(ds, &[StructuralEdit::DropEmptyColumns]);
        assert_eq!(outcome.dataset.column_count(), 1);
        assert_eq!(outcome.skipped[0].reason, "dataset has no rows");
    }

    #[test]
    fn test_huge_json_position_is_skipped() {
        let plan = crate::transform::dsl::EditPlan::from_json(
            r#"{"edits": [{"type": "delete_at", "position": 18446744073709551615}]}"#,
        )
        .unwrap();
        let outcome = execute(lettered(3, &[]), &plan.edits);
        assert_eq!(outcome.dataset.column_names(), vec!["A", "B", "C"]);
        assert!(outcome.applied.is_empty());
        assert!(outcome.skipped[0].reason.contains("out of range"));
    }
}
