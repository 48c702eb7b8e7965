//! # SATIAP ETL - survey feedback export pipeline
//!
//! Turns the SATIAP Home survey CSV export into a validated Excel workbook,
//! staged in SQLite on the way, and publishes it to a SharePoint library.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌───────────┐   ┌──────────┐   ┌──────────┐   ┌────────────┐
//! │ CSV File │──▶│  Parser   │──▶│ Transform │──▶│ Staging  │──▶│  Loader  │──▶│  Uploader  │
//! │(UTF8/ISO)│   │(enc chain)│   │(DSL+rules)│   │ (SQLite) │   │  (xlsx)  │   │(SharePoint)│
//! └──────────┘   └───────────┘   └───────────┘   └──────────┘   └──────────┘   └────────────┘
//!                                                      │
//!                                                      ▼
//!                                               ┌────────────┐
//!                                               │ Validation │
//!                                               │  (schema)  │
//!                                               └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use satiap_etl::{run, Settings};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut settings = Settings::load(None).unwrap();
//!     settings.apply_env();
//!     let summary = run(&settings).await.unwrap();
//!     println!("Wrote {} rows", summary.rows);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per stage
//! - [`models`] - Column-oriented dataset
//! - [`logs`] - Narration helpers over `tracing`
//! - [`config`] - Settings, defaults and environment overrides
//! - [`parser`] - CSV extraction with encoding fallback
//! - [`transform`] - Structural edits and semantic clean-up
//! - [`validation`] - Expected schema checks
//! - [`staging`] - SQLite staging table
//! - [`loader`] - Excel output and verification
//! - [`uploader`] - SharePoint / Graph upload
//! - [`pipeline`] - End-to-end run

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Settings
pub mod config;

// Stages
pub mod loader;
pub mod parser;
pub mod staging;
pub mod transform;
pub mod uploader;
pub mod validation;

// Orchestration
pub mod pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, DatasetError, ExtractError, LoadError, PipelineError, PipelineResult, StagingError,
    UploadError,
};

// =============================================================================
// Re-exports - Models and settings
// =============================================================================

pub use config::Settings;
pub use models::{Column, ColumnKind, Dataset, Value};

// =============================================================================
// Re-exports - Stages
// =============================================================================

pub use loader::{verify_excel, write_to_excel, ExcelSummary, ExcelVerification};
pub use parser::{detect_delimiter, load_bytes, load_csv, Extracted};
pub use staging::save_to_staging;
pub use transform::{
    execute, legacy_macro_plan, operations_description, transform, EditPlan, StructuralEdit,
    TransformOutcome,
};
pub use uploader::{choose_strategy, SharePointClient, UploadReceipt, UploadStrategy};
pub use validation::{reorder_columns, validate_columns};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{run, RunSummary, UploadStatus};
