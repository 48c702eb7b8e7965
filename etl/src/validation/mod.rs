//! Schema validation for the transformed survey dataset.
//!
//! The expected schema is an ordered list of column names. Validation
//! compares column *sets*; order differences only produce a warning, since
//! [`reorder_columns`] fixes them afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! use satiap_etl::validation::{validate_columns, reorder_columns};
//!
//! let (ok, errors) = validate_columns(&dataset.column_names(), &expected);
//! if ok {
//!     let dataset = reorder_columns(dataset, &expected, true);
//! }
//! ```

use crate::logs::log_warning_indent;
use crate::models::Dataset;

/// Compare `columns` against `expected`.
///
/// # Returns
/// * `(true, [])` when both hold the same names
/// * `(false, errors)` with one entry for missing and one for unexpected
///   columns, each present only when non-empty
pub fn validate_columns(columns: &[String], expected: &[String]) -> (bool, Vec<String>) {
    let mut errors = Vec::new();

    let missing: Vec<&String> = expected.iter().filter(|c| !columns.contains(c)).collect();
    if !missing.is_empty() {
        errors.push(format!("Missing columns: {:?}", missing));
    }

    let extra: Vec<&String> = columns.iter().filter(|c| !expected.contains(c)).collect();
    if !extra.is_empty() {
        errors.push(format!("Unexpected columns found: {:?}", extra));
    }

    if errors.is_empty() && columns != expected {
        log_warning_indent("Column order differs from expected schema (will be reordered).", 1);
    }

    (errors.is_empty(), errors)
}

/// Put the expected columns first, in schema order, followed by the other
/// columns in their current order when `keep_extra` is set.
pub fn reorder_columns(dataset: Dataset, expected: &[String], keep_extra: bool) -> Dataset {
    let mut order: Vec<String> = expected
        .iter()
        .filter(|c| dataset.contains(c))
        .cloned()
        .collect();
    if keep_extra {
        order.extend(
            dataset
                .column_names()
                .into_iter()
                .filter(|c| !expected.contains(c)),
        );
    }
    dataset.select(&order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, Value};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_same_set_any_order_is_valid() {
        let (ok, errors) = validate_columns(&names(&["B", "A"]), &names(&["A", "B"]));
        assert!(ok);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_missing_and_unexpected() {
        let (ok, errors) = validate_columns(&names(&["A", "C"]), &names(&["A", "B"]));
        assert!(!ok);
        assert_eq!(
            errors,
            vec![
                "Missing columns: [\"B\"]".to_string(),
                "Unexpected columns found: [\"C\"]".to_string(),
            ]
        );
    }

    #[test]
    fn test_only_missing() {
        let (ok, errors) = validate_columns(&names(&["A"]), &names(&["A", "B"]));
        assert!(!ok);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Missing columns"));
    }

    fn dataset() -> Dataset {
        Dataset::from_columns(
            ["x", "B", "y", "A"]
                .iter()
                .map(|n| Column::new(*n, vec![Value::text(*n)]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_reorder_keeps_extras_after_schema() {
        let ds = reorder_columns(dataset(), &names(&["A", "B", "Z"]), true);
        assert_eq!(ds.column_names(), vec!["A", "B", "x", "y"]);
        assert_eq!(ds.column("x").unwrap().values, vec![Value::text("x")]);
    }

    #[test]
    fn test_reorder_drops_extras() {
        let ds = reorder_columns(dataset(), &names(&["A", "B"]), false);
        assert_eq!(ds.column_names(), vec!["A", "B"]);
        assert_eq!(ds.row_count(), 1);
    }

    #[test]
    fn test_reorder_scrambled_schema_keeps_values() {
        let ds = Dataset::from_columns(vec![
            Column::new("C", vec![Value::text("c0"), Value::text("c1")]),
            Column::new("A", vec![Value::Int(1), Value::Int(2)]),
            Column::new("B", vec![Value::Null, Value::text("b1")]),
        ])
        .unwrap();

        let ds = reorder_columns(ds, &names(&["A", "B", "C"]), false);
        assert_eq!(ds.column_names(), vec!["A", "B", "C"]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.column("A").unwrap().values, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(ds.column("B").unwrap().values, vec![Value::Null, Value::text("b1")]);
        assert_eq!(ds.column("C").unwrap().values, vec![Value::text("c0"), Value::text("c1")]);
        assert_eq!(
            ds.row(1).cloned().collect::<Vec<_>>(),
            vec![Value::Int(2), Value::text("b1"), Value::text("c1")]
        );
    }
}
