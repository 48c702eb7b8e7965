//! End-to-end pipeline: extract → transform → stage → validate → Excel →
//! SharePoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use satiap_etl::{config::Settings, pipeline::run};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut settings = Settings::load(None)?;
//!     settings.apply_env();
//!     let summary = run(&settings).await?;
//!     println!("{} rows written to {}", summary.rows, summary.excel.path.display());
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::config::Settings;
use crate::error::{PipelineError, PipelineResult};
use crate::loader::{verify_excel, write_to_excel, ExcelSummary};
use crate::logs::{log_error, log_info, log_info_indent, log_success, log_success_indent, log_warning_indent};
use crate::parser::load_csv;
use crate::staging::save_to_staging;
use crate::transform::transform;
use crate::uploader::SharePointClient;
use crate::validation::{reorder_columns, validate_columns};

/// What happened to the SharePoint upload
#[derive(Debug, Clone, PartialEq)]
pub enum UploadStatus {
    /// Upload turned off in settings
    Disabled,
    Uploaded { location: String, verified: bool },
    /// The upload failed; the Excel file is still on disk
    Failed(String),
}

/// Result of a complete pipeline run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Encoding the CSV was read with
    pub encoding: String,
    pub rows: usize,
    pub columns: usize,
    pub staging_db: PathBuf,
    pub staged_rows: usize,
    pub excel: ExcelSummary,
    /// `None` when the workbook could not be re-read
    pub excel_verified: Option<bool>,
    pub upload: UploadStatus,
}

/// Run every stage in order.
///
/// Extraction, staging, schema and Excel failures stop the run. Excel
/// verification and upload problems are reported as warnings only.
pub async fn run(settings: &Settings) -> PipelineResult<RunSummary> {
    let started_at = Utc::now();
    log_info("=".repeat(80));
    log_info("🚀 ETL SATIAP HOME - Pipeline Starting");
    log_info("=".repeat(80));

    // Step 0: settings
    log_info("📋 Step 0: Validating configuration...");
    let warnings = settings.validate();
    if warnings.is_empty() {
        log_success_indent("Configuration validated", 1);
    } else {
        for warning in &warnings {
            log_warning_indent(warning, 1);
        }
        log_info_indent("ℹ️  Continuing anyway (some features may not work)", 1);
    }

    // Step 1: extract
    log_info("📥 Step 1: Extracting data from CSV...");
    let extracted = load_csv(&settings.paths.input, &settings.extraction)?;
    log_success_indent(
        format!(
            "Extracted {} rows, {} columns",
            extracted.dataset.row_count(),
            extracted.dataset.column_count()
        ),
        1,
    );

    // Step 2: transform
    log_info("🔄 Step 2: Transforming data...");
    let outcome = transform(extracted.dataset, &settings.transform);
    let dataset = outcome.dataset;
    log_success_indent(
        format!(
            "Transformed to {} rows, {} columns",
            dataset.row_count(),
            dataset.column_count()
        ),
        1,
    );

    // Step 3: staging and validation
    log_info("🛡️ Step 3: Staging and Validation...");
    let staged_rows = save_to_staging(&dataset, &settings.paths.staging_db, &settings.staging.table)?;

    let expected = &settings.schema.expected_columns;
    let (valid, errors) = validate_columns(&dataset.column_names(), expected);
    if !valid {
        log_error("Validation FAILED!");
        for err in &errors {
            log_info_indent(format!("- {}", err), 2);
        }
        log_error("Pipeline stopped due to validation errors.");
        return Err(PipelineError::SchemaMismatch(errors));
    }
    log_success_indent("Column schema validation passed", 1);

    let dataset = reorder_columns(dataset, expected, settings.schema.keep_extra);
    log_info_indent("🔀 Columns reordered to expected schema", 1);

    // Step 4: Excel
    log_info("💾 Step 4: Loading data to Excel file...");
    let excel = write_to_excel(&dataset, &settings.paths.output, &settings.excel)?;
    let excel_verified = match verify_excel(
        &excel.path,
        &settings.excel.sheet_name,
        dataset.row_count(),
        dataset.column_count(),
    ) {
        Ok(check) if check.is_ok() => {
            log_success_indent("Excel file verified", 1);
            Some(true)
        }
        Ok(check) => {
            log_warning_indent(
                format!(
                    "Excel verification mismatch: {} rows x {} columns, expected {} x {}",
                    check.rows,
                    check.columns,
                    dataset.row_count(),
                    dataset.column_count()
                ),
                1,
            );
            Some(false)
        }
        Err(e) => {
            log_warning_indent(format!("Could not verify Excel file: {}", e), 1);
            None
        }
    };

    // Step 5: SharePoint
    let upload = upload_stage(settings, &excel).await;

    log_info("=".repeat(80));
    log_success("ETL PIPELINE COMPLETED SUCCESSFULLY!");
    log_info("=".repeat(80));
    log_info("📊 Summary:");
    log_info_indent(format!("- Rows processed: {}", dataset.row_count()), 1);
    log_info_indent(format!("- Staging DB: {}", settings.paths.staging_db.display()), 1);
    log_info_indent(format!("- Excel file: {}", excel.path.display()), 1);
    log_info_indent(
        format!(
            "- SharePoint: {}",
            match &upload {
                UploadStatus::Disabled => "disabled",
                UploadStatus::Uploaded { .. } => "uploaded",
                UploadStatus::Failed(_) => "failed",
            }
        ),
        1,
    );

    Ok(RunSummary {
        started_at,
        finished_at: Utc::now(),
        encoding: extracted.encoding,
        rows: dataset.row_count(),
        columns: dataset.column_count(),
        staging_db: settings.paths.staging_db.clone(),
        staged_rows,
        excel,
        excel_verified,
        upload,
    })
}

async fn upload_stage(settings: &Settings, excel: &ExcelSummary) -> UploadStatus {
    if !settings.sharepoint.enabled {
        log_info("☁️  Step 5: SharePoint upload disabled");
        return UploadStatus::Disabled;
    }

    log_info("☁️  Step 5: SharePoint");
    let attempt = async {
        let client = SharePointClient::new(&settings.sharepoint)?;
        let receipt = client.upload_file(&excel.path, settings.sharepoint.overwrite).await?;
        let verified = client.verify_upload(&receipt.file_name).await;
        Ok::<_, crate::error::UploadError>(UploadStatus::Uploaded {
            location: receipt.location,
            verified,
        })
    };

    match attempt.await {
        Ok(status) => status,
        Err(e) => {
            log_warning_indent(format!("SharePoint upload failed: {}", e), 1);
            let local = std::fs::canonicalize(&excel.path).unwrap_or_else(|_| excel.path.clone());
            log_info_indent(
                format!("ℹ️  Excel file was created successfully at: {}", local.display()),
                1,
            );
            log_info_indent("ℹ️  You can manually upload it to SharePoint", 1);
            UploadStatus::Failed(e.to_string())
        }
    }
}
