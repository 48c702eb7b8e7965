//! Structural edit DSL for the positional transform phase
//!
//! This module provides:
//! - `plan`: Edit plan definition (ordered edits, loadable from JSON)
//! - `operations`: Available structural edits and their guards
//! - `executor`: Execute edit lists on a dataset
//!
//! ## Usage Flow
//!
//! ```text
//! Dataset → EditPlan (built-in or JSON) → executor::execute → Dataset + applied/skipped
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use satiap_etl::transform::dsl::{execute, EditPlan};
//!
//! let plan = EditPlan::from_json(plan_json)?;
//! let outcome = execute(dataset, &plan.edits);
//! for skipped in &outcome.skipped {
//!     println!("skipped {}: {}", skipped.edit, skipped.reason);
//! }
//! ```

pub mod executor;
pub mod operations;
pub mod plan;

// Re-exports for convenience
pub use executor::{execute, EditOutcome, SkippedEdit};
pub use operations::{
    letters_from_position, operations_description, position_from_letters, Guard, Position,
    StructuralEdit,
};
pub use plan::{legacy_macro_plan, EditPlan};
