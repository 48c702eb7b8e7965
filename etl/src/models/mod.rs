//! Domain models for the ETL pipeline.
//!
//! - [`Value`] - A single cell (text, number or missing)
//! - [`Column`] - A named, ordered vector of cells
//! - [`Dataset`] - An ordered set of uniquely named, equally long columns
//!
//! Stages take a [`Dataset`] by value and hand back a new one, so an edit in
//! one stage never leaks into another stage's view.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::fmt;

use crate::error::DatasetError;

// =============================================================================
// Cell Value
// =============================================================================

/// A single cell of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value.
    Null,
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Free text.
    Text(String),
}

impl Value {
    /// Build a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null, or text made only of whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Int(i) => JsonValue::from(*i),
            Value::Float(f) => JsonValue::from(*f),
            Value::Text(s) => JsonValue::String(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

// =============================================================================
// Column
// =============================================================================

/// Storage class of a column, derived from its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Only nulls and integers.
    Integer,
    /// Only nulls and numbers, at least one float.
    Real,
    /// At least one text value, or only nulls.
    Text,
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// A column of `rows` nulls.
    pub fn nulls(name: impl Into<String>, rows: usize) -> Self {
        Self::new(name, vec![Value::Null; rows])
    }

    /// A column holds text as soon as one of its cells is text.
    pub fn is_text(&self) -> bool {
        self.values.iter().any(|v| matches!(v, Value::Text(_)))
    }

    /// Every cell is null or whitespace-only text.
    pub fn is_entirely_empty(&self) -> bool {
        self.values.iter().all(Value::is_blank)
    }

    pub fn kind(&self) -> ColumnKind {
        let mut kind = ColumnKind::Text;
        for value in &self.values {
            match value {
                Value::Text(_) => return ColumnKind::Text,
                Value::Float(_) => kind = ColumnKind::Real,
                Value::Int(_) if kind == ColumnKind::Text => kind = ColumnKind::Integer,
                _ => {}
            }
        }
        kind
    }

    /// Longest displayed value, header included, in characters.
    pub fn display_width(&self) -> usize {
        self.values
            .iter()
            .map(|v| v.to_string().chars().count())
            .chain(std::iter::once(self.name.chars().count()))
            .max()
            .unwrap_or(0)
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// An in-memory table: ordered, uniquely named columns of equal length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Build a dataset, checking names are unique and lengths agree.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        for (i, column) in columns.iter().enumerate() {
            if column.values.len() != rows {
                return Err(DatasetError::ColumnLength {
                    name: column.name.clone(),
                    expected: rows,
                    found: column.values.len(),
                });
            }
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(DatasetError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn columns_mut(&mut self) -> impl Iterator<Item = &mut Column> {
        self.columns.iter_mut()
    }

    /// Remove and return the column at `index`, if any.
    pub fn remove_at(&mut self, index: usize) -> Option<Column> {
        (index < self.columns.len()).then(|| self.columns.remove(index))
    }

    /// Remove and return the named column, if present.
    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let index = self.position(name)?;
        self.remove_at(index)
    }

    /// Insert a column at `index`. Returns `false` (and leaves the dataset
    /// untouched) when the name is taken or the length is wrong.
    pub fn insert(&mut self, index: usize, column: Column) -> bool {
        if self.contains(&column.name) || !self.accepts_length(&column) {
            return false;
        }
        if self.columns.is_empty() {
            self.rows = column.values.len();
        }
        let index = index.min(self.columns.len());
        self.columns.insert(index, column);
        true
    }

    /// Replace the named column's values in place, or append a new column.
    pub fn upsert(&mut self, column: Column) -> bool {
        if !self.accepts_length(&column) {
            return false;
        }
        match self.position(&column.name) {
            Some(index) => self.columns[index] = column,
            None => {
                if self.columns.is_empty() {
                    self.rows = column.values.len();
                }
                self.columns.push(column);
            }
        }
        true
    }

    /// Rename a column. No-op when `from` is absent or `to` is taken.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if self.contains(to) {
            return false;
        }
        match self.columns.iter_mut().find(|c| c.name == from) {
            Some(column) => {
                column.name = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Move the columns in `start..end_exclusive` to the end, keeping their
    /// relative order.
    pub fn move_to_end(&mut self, start: usize, end_exclusive: usize) -> bool {
        if start >= end_exclusive || end_exclusive > self.columns.len() {
            return false;
        }
        let block: Vec<Column> = self.columns.drain(start..end_exclusive).collect();
        self.columns.extend(block);
        true
    }

    /// Keep only the rows for which `keep(row_index)` is true.
    pub fn retain_rows<F>(&mut self, keep: F)
    where
        F: Fn(usize) -> bool,
    {
        let mask: Vec<bool> = (0..self.rows).map(keep).collect();
        for column in &mut self.columns {
            let mut row = 0;
            column.values.retain(|_| {
                let kept = mask[row];
                row += 1;
                kept
            });
        }
        self.rows = mask.iter().filter(|k| **k).count();
    }

    /// Keep the named columns, in the given order. Unknown names are ignored.
    pub fn select(mut self, order: &[String]) -> Self {
        let mut selected = Vec::with_capacity(order.len());
        for name in order {
            if let Some(index) = self.position(name) {
                selected.push(self.columns.swap_remove(index));
            }
        }
        self.columns = selected;
        self
    }

    /// Cells of one row, in column order.
    pub fn row(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.columns.iter().map(move |c| &c.values[index])
    }

    /// Rows as JSON objects keyed by column name, in column order.
    pub fn to_records(&self) -> Vec<JsonValue> {
        (0..self.rows)
            .map(|row| {
                let obj: Map<String, JsonValue> = self
                    .columns
                    .iter()
                    .map(|c| (c.name.clone(), c.values[row].to_json()))
                    .collect();
                JsonValue::Object(obj)
            })
            .collect()
    }

    fn accepts_length(&self, column: &Column) -> bool {
        self.columns.is_empty() || column.values.len() == self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_columns(vec![
            Column::new("a", vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
            Column::new("b", vec!["x".into(), Value::Null, "z".into()]),
            Column::new("c", vec![Value::Null, Value::text("  "), Value::Null]),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_columns_rejects_ragged() {
        let err = Dataset::from_columns(vec![
            Column::new("a", vec![Value::Int(1)]),
            Column::new("b", vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, DatasetError::ColumnLength { .. }));
    }

    #[test]
    fn test_from_columns_rejects_duplicates() {
        let err = Dataset::from_columns(vec![Column::nulls("a", 1), Column::nulls("a", 1)]).unwrap_err();
        assert_eq!(err, DatasetError::DuplicateColumn("a".into()));
    }

    #[test]
    fn test_empty_and_text_detection() {
        let ds = sample();
        assert!(!ds.column("a").unwrap().is_text());
        assert!(ds.column("b").unwrap().is_text());
        assert!(ds.column("c").unwrap().is_entirely_empty());
        assert_eq!(ds.column("a").unwrap().kind(), ColumnKind::Integer);
        assert_eq!(ds.column("b").unwrap().kind(), ColumnKind::Text);
    }

    #[test]
    fn test_move_to_end_keeps_block_order() {
        let mut ds = sample();
        assert!(ds.move_to_end(0, 2));
        assert_eq!(ds.column_names(), vec!["c", "a", "b"]);
        assert!(!ds.move_to_end(2, 5));
    }

    #[test]
    fn test_retain_rows() {
        let mut ds = sample();
        ds.retain_rows(|row| row != 1);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.column("a").unwrap().values, vec![Value::Int(1), Value::Int(3)]);
    }

    #[test]
    fn test_insert_and_rename_respect_uniqueness() {
        let mut ds = sample();
        assert!(!ds.insert(0, Column::nulls("a", 3)));
        assert!(!ds.insert(0, Column::nulls("d", 2)));
        assert!(ds.insert(1, Column::nulls("d", 3)));
        assert_eq!(ds.column_names(), vec!["a", "d", "b", "c"]);
        assert!(!ds.rename("a", "b"));
        assert!(ds.rename("a", "z"));
        assert!(!ds.rename("missing", "y"));
    }

    #[test]
    fn test_select_orders_and_drops() {
        let ds = sample().select(&["c".to_string(), "a".to_string(), "nope".to_string()]);
        assert_eq!(ds.column_names(), vec!["c", "a"]);
        assert_eq!(ds.row_count(), 3);
    }

    #[test]
    fn test_to_records_preserves_column_order() {
        let records = sample().to_records();
        let keys: Vec<&String> = records[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(records[0]["b"], "x");
        assert!(records[1]["b"].is_null());
    }
}
