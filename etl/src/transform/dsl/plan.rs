//! Edit plan definition
//!
//! A plan is the ordered list of structural edits run by the positional
//! phase. The built-in plan reproduces the `PreparationFeedback` spreadsheet
//! macro the survey team used before this pipeline existed.

use serde::{Deserialize, Serialize};

use super::operations::{Position, StructuralEdit};

/// An ordered list of structural edits with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditPlan {
    /// Version of the plan format
    #[serde(default = "default_version")]
    pub version: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Edits, applied in order
    #[serde(default)]
    pub edits: Vec<StructuralEdit>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for EditPlan {
    fn default() -> Self {
        legacy_macro_plan()
    }
}

impl EditPlan {
    /// Create an empty plan
    pub fn new() -> Self {
        Self {
            version: default_version(),
            description: String::new(),
            edits: Vec::new(),
        }
    }

    /// Parse a plan from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to pretty JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn with_edit(mut self, edit: StructuralEdit) -> Self {
        self.edits.push(edit);
        self
    }
}

/// The `PreparationFeedback` macro as an edit plan.
pub fn legacy_macro_plan() -> EditPlan {
    let rename = |from: &str| StructuralEdit::Rename {
        from: from.to_string(),
        to: format!("{}_Renamed", from),
    };

    EditPlan {
        version: default_version(),
        description: "PreparationFeedback macro: column surgery on the raw survey export".to_string(),
        edits: vec![],
    }
    .with_edit(StructuralEdit::DeleteAt { position: Position::from("AC") })
    .with_edit(StructuralEdit::MoveRangeToEnd { first: "V".into(), last: "AA".into() })
    .with_edit(StructuralEdit::MoveRangeToEnd { first: "AJ".into(), last: "AR".into() })
    .with_edit(StructuralEdit::DropEmptyColumns)
    .with_edit(StructuralEdit::InsertAfter { anchor: "AU".into(), name: "AV".into() })
    .with_edit(StructuralEdit::MoveValues { from: "V".into(), to: "AV".into() })
    .with_edit(rename("AH"))
    .with_edit(rename("AO"))
    .with_edit(rename("AT"))
}
