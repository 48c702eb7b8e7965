//! Structural edit operations
//!
//! Each edit is a descriptor: what to do, where (position or column name),
//! and the guard that must hold for it to run. Positions accept either a
//! 0-based index or a spreadsheet letter label (`"V"`, `"AC"`).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Column, Dataset};

/// A column position: 0-based index or spreadsheet letters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Position {
    Index(usize),
    Letters(String),
}

impl Position {
    /// Resolve to a 0-based index. Malformed letter labels resolve to `None`.
    pub fn index(&self) -> Option<usize> {
        match self {
            Position::Index(i) => Some(*i),
            Position::Letters(s) => position_from_letters(s),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Index(i) => write!(f, "#{}", i),
            Position::Letters(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Position {
    fn from(s: &str) -> Self {
        Position::Letters(s.to_string())
    }
}

/// Convert spreadsheet letters to a 0-based index (`A` = 0, `AA` = 26).
pub fn position_from_letters(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut acc: usize = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    Some(acc - 1)
}

/// Convert a 0-based index to spreadsheet letters (`0` = `A`, `26` = `AA`).
pub fn letters_from_position(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Precondition for an edit to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// The dataset has at least this many columns.
    MinColumns(usize),
    /// The dataset has at least one row.
    HasRows,
    /// All `present` names exist and none of the `absent` names do.
    Columns {
        present: Vec<String>,
        absent: Vec<String>,
    },
    /// The edit cannot be addressed (malformed position).
    Never(String),
}

impl Guard {
    pub fn holds(&self, dataset: &Dataset) -> bool {
        match self {
            Guard::MinColumns(n) => dataset.column_count() >= *n,
            Guard::HasRows => dataset.row_count() > 0,
            Guard::Columns { present, absent } => {
                present.iter().all(|c| dataset.contains(c)) && !absent.iter().any(|c| dataset.contains(c))
            }
            Guard::Never(_) => false,
        }
    }

    /// Why the guard fails on `dataset`.
    pub fn explain(&self, dataset: &Dataset) -> String {
        match self {
            Guard::MinColumns(n) => format!(
                "needs at least {} columns, dataset has {}",
                n,
                dataset.column_count()
            ),
            Guard::HasRows => "dataset has no rows".to_string(),
            Guard::Columns { present, absent } => {
                let missing: Vec<&String> = present.iter().filter(|c| !dataset.contains(c)).collect();
                let taken: Vec<&String> = absent.iter().filter(|c| dataset.contains(c)).collect();
                match (missing.is_empty(), taken.is_empty()) {
                    (false, _) => format!("column(s) not found: {:?}", missing),
                    (true, false) => format!("column(s) already exist: {:?}", taken),
                    (true, true) => "guard holds".to_string(),
                }
            }
            Guard::Never(reason) => reason.clone(),
        }
    }
}

/// All available structural edits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StructuralEdit {
    /// Delete the column at a position
    DeleteAt { position: Position },

    /// Move an inclusive range of columns to the end of the column order
    MoveRangeToEnd { first: Position, last: Position },

    /// Remove every column whose cells are all null or blank
    DropEmptyColumns,

    /// Insert an empty column right after `anchor`
    InsertAfter { anchor: String, name: String },

    /// Copy `from`'s values into `to`, then delete `from`
    MoveValues { from: String, to: String },

    /// Rename a column
    Rename { from: String, to: String },
}

impl StructuralEdit {
    /// The precondition this edit needs, derived from its parameters.
    pub fn guard(&self) -> Guard {
        match self {
            StructuralEdit::DeleteAt { position } => match position.index() {
                Some(i) => i
                    .checked_add(1)
                    .map_or_else(|| Guard::Never(format!("position '{}' out of range", position)), Guard::MinColumns),
                None => Guard::Never(format!("invalid position '{}'", position)),
            },
            StructuralEdit::MoveRangeToEnd { first, last } => match (first.index(), last.index()) {
                (Some(f), Some(l)) if f <= l => l
                    .checked_add(1)
                    .map_or_else(|| Guard::Never(format!("range {}:{} out of range", first, last)), Guard::MinColumns),
                _ => Guard::Never(format!("invalid range {}:{}", first, last)),
            },
            StructuralEdit::DropEmptyColumns => Guard::HasRows,
            StructuralEdit::InsertAfter { anchor, name } => Guard::Columns {
                present: vec![anchor.clone()],
                absent: vec![name.clone()],
            },
            StructuralEdit::MoveValues { from, to } => Guard::Columns {
                present: vec![from.clone(), to.clone()],
                absent: vec![],
            },
            StructuralEdit::Rename { from, to } => Guard::Columns {
                present: vec![from.clone()],
                absent: vec![to.clone()],
            },
        }
    }

    /// Apply the edit. Call only when [`Self::guard`] holds; returns `false`
    /// if the dataset refused the change.
    pub fn apply(&self, dataset: &mut Dataset) -> bool {
        match self {
            StructuralEdit::DeleteAt { position } => position
                .index()
                .and_then(|i| dataset.remove_at(i))
                .is_some(),
            StructuralEdit::MoveRangeToEnd { first, last } => match (first.index(), last.index()) {
                (Some(f), Some(l)) => l.checked_add(1).is_some_and(|end| dataset.move_to_end(f, end)),
                _ => false,
            },
            StructuralEdit::DropEmptyColumns => {
                let empty: Vec<String> = dataset
                    .columns()
                    .iter()
                    .filter(|c| c.is_entirely_empty())
                    .map(|c| c.name.clone())
                    .collect();
                for name in &empty {
                    dataset.remove(name);
                }
                true
            }
            StructuralEdit::InsertAfter { anchor, name } => match dataset.position(anchor) {
                Some(i) => dataset.insert(i + 1, Column::nulls(name.as_str(), dataset.row_count())),
                None => false,
            },
            StructuralEdit::MoveValues { from, to } => {
                if !dataset.contains(to) {
                    return false;
                }
                match dataset.remove(from) {
                    Some(source) => dataset.upsert(Column::new(to.as_str(), source.values)),
                    None => false,
                }
            }
            StructuralEdit::Rename { from, to } => dataset.rename(from, to),
        }
    }

    /// Human-readable summary for logs.
    pub fn describe(&self) -> String {
        match self {
            StructuralEdit::DeleteAt { position } => format!("delete column {}", position),
            StructuralEdit::MoveRangeToEnd { first, last } => {
                format!("move block {}:{} to end", first, last)
            }
            StructuralEdit::DropEmptyColumns => "drop empty columns".to_string(),
            StructuralEdit::InsertAfter { anchor, name } => {
                format!("insert column '{}' after '{}'", name, anchor)
            }
            StructuralEdit::MoveValues { from, to } => {
                format!("move values of '{}' into '{}'", from, to)
            }
            StructuralEdit::Rename { from, to } => format!("rename '{}' to '{}'", from, to),
        }
    }
}

/// Description of the edit kinds, for `--help`-style output
pub fn operations_description() -> String {
    r#"Available structural edits:

| Edit | Description | Parameters | Runs when |
|------|-------------|------------|-----------|
| delete_at | Delete one column | position: index or letters | column count > position |
| move_range_to_end | Move a column block to the end | first, last (inclusive) | column count > last |
| drop_empty_columns | Remove all-null/blank columns | - | at least one row |
| insert_after | Insert an empty column | anchor, name | anchor exists, name does not |
| move_values | Copy values then delete source | from, to | both exist |
| rename | Rename a column | from, to | from exists, to does not |

Example:
[
  {"type": "delete_at", "position": "AC"},
  {"type": "move_range_to_end", "first": "V", "last": "AA"},
  {"type": "rename", "from": "AH", "to": "AH_Renamed"}
]"#
    .to_string()
}
