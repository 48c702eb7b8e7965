//! Transformation module.
//!
//! Two phases over the extracted dataset:
//! - DSL: structural edits replaying the legacy spreadsheet macro
//! - Semantic: combined columns, row filter, column removal, replacements

pub mod dsl;
pub mod semantic;

pub use dsl::*;
pub use semantic::{
    apply_replacements, combine_groups, drop_columns, filter_key_rows, ColumnGroup, GroupReport,
    Replacement,
};

use crate::config::TransformSettings;
use crate::logs::{log_error, log_info, log_info_indent, log_success, log_warning_indent};
use crate::models::Dataset;

/// Result of a complete transformation
#[derive(Debug)]
pub struct TransformOutcome {
    pub dataset: Dataset,
    /// Structural edits that ran
    pub applied: Vec<String>,
    /// Structural edits whose guard did not hold
    pub skipped: Vec<SkippedEdit>,
    /// Matched columns per combined column
    pub groups: Vec<GroupReport>,
    /// Rows dropped for a blank key
    pub rows_removed: usize,
    /// Columns removed by name
    pub columns_removed: Vec<String>,
    /// Cells rewritten by the rating and text tables
    pub cells_rewritten: usize,
}

/// Run the positional phase, then the semantic phase.
pub fn transform(dataset: Dataset, settings: &TransformSettings) -> TransformOutcome {
    log_info("🔄 Starting transformations...");

    log_info_indent("📝 Applying structural edits...", 1);
    let EditOutcome {
        mut dataset,
        applied,
        skipped,
    } = execute(dataset, &settings.plan.edits);
    for edit in &applied {
        log_info_indent(format!("- {}", edit), 2);
    }
    for skip in &skipped {
        log_info_indent(format!("- skipped {}: {}", skip.edit, skip.reason), 2);
    }

    log_info_indent("📝 Applying semantic clean-up...", 1);
    let groups = match combine_groups(&mut dataset, &settings.groups) {
        Ok(groups) => groups,
        Err(e) => {
            log_error(format!("Invalid column group pattern: {}", e));
            Vec::new()
        }
    };
    for group in &groups {
        if group.matched.is_empty() {
            log_warning_indent(format!("No columns matched for {}", group.name), 2);
        } else {
            log_info_indent(
                format!("- Combining {} columns into {}", group.matched.len(), group.name),
                2,
            );
        }
    }

    let rows_removed = filter_key_rows(&mut dataset, &settings.key_column);
    if rows_removed > 0 {
        log_info_indent(
            format!("- Filtered out {} rows with empty {}", rows_removed, settings.key_column),
            2,
        );
    }

    let columns_removed = drop_columns(&mut dataset, &settings.columns_to_remove);
    if !columns_removed.is_empty() {
        log_info_indent(format!("- Removing {} unwanted columns", columns_removed.len()), 2);
    }

    log_info_indent("- Mapping ratings to stars", 2);
    let mut cells_rewritten = apply_replacements(&mut dataset, &settings.rating_mappings);
    log_info_indent("- Standardizing text values", 2);
    cells_rewritten += apply_replacements(&mut dataset, &settings.text_standardization);

    log_success(format!(
        "Transformations complete! Final shape: ({}, {})",
        dataset.row_count(),
        dataset.column_count()
    ));

    TransformOutcome {
        dataset,
        applied,
        skipped,
        groups,
        rows_removed,
        columns_removed,
        cells_rewritten,
    }
}
