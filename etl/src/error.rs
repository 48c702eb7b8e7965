//! Error types for the SATIAP ETL pipeline.
//!
//! One error enum per stage, plus the top-level [`PipelineError`]:
//!
//! - [`DatasetError`] - Dataset shape violations
//! - [`ConfigError`] - Settings file errors
//! - [`ExtractError`] - CSV loading and decoding errors
//! - [`StagingError`] - SQLite staging errors
//! - [`LoadError`] - Excel writing and verification errors
//! - [`UploadError`] - SharePoint / Graph upload errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across stage boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Dataset Errors
// =============================================================================

/// Errors raised when building a dataset with an invalid shape.
#[derive(Debug, Error, PartialEq)]
pub enum DatasetError {
    /// A column does not have the same number of rows as the others.
    #[error("Column '{name}' has {found} rows, expected {expected}")]
    ColumnLength {
        name: String,
        expected: usize,
        found: usize,
    },

    /// Two columns share a name.
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while reading a settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the settings file.
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for [`crate::config::Settings`].
    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// Extraction Errors
// =============================================================================

/// Errors while loading the source CSV.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The source file does not exist.
    #[error("CSV file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Failed to read the file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The file has no content at all.
    #[error("CSV file is empty")]
    EmptyFile,

    /// Every encoding in the fallback chain failed.
    #[error("Failed to load CSV with any encoding: {}", .attempts.join("; "))]
    Decode { attempts: Vec<String> },
}

// =============================================================================
// Staging Errors
// =============================================================================

/// Errors while writing the staging database.
#[derive(Debug, Error)]
pub enum StagingError {
    /// Could not create the database directory.
    #[error("Staging IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite rejected a statement.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

// =============================================================================
// Excel Errors
// =============================================================================

/// Errors while writing or re-reading the Excel output.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Could not create the output directory.
    #[error("Excel IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The workbook writer failed.
    #[error("Failed to write Excel file: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    /// The workbook could not be re-opened.
    #[error("Failed to read Excel file: {0}")]
    Read(#[from] calamine::XlsxError),

    /// The dataset does not fit in a worksheet.
    #[error("Dataset too large for a worksheet: {0}")]
    TooLarge(String),
}

// =============================================================================
// Upload Errors
// =============================================================================

/// Errors from the SharePoint uploader.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The file to upload does not exist.
    #[error("Excel file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// No bearer token configured.
    #[error("Missing SharePoint access token (set SHAREPOINT_ACCESS_TOKEN)")]
    MissingCredential,

    /// The site URL cannot be parsed.
    #[error("Invalid SharePoint site URL: {0}")]
    InvalidSiteUrl(String),

    /// Failed to read the local file.
    #[error("Upload IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request never produced a response.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The server answered 2xx with an unexpected body.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// Upload failures are not part of this enum: the pipeline downgrades them
/// to warnings because the Excel file is still available locally.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Extraction error.
    #[error("Extract error: {0}")]
    Extract(#[from] ExtractError),

    /// Staging error.
    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),

    /// Excel error.
    #[error("Excel error: {0}")]
    Load(#[from] LoadError),

    /// The transformed columns do not match the expected schema.
    #[error("Schema validation failed: {}", .0.join("; "))]
    SchemaMismatch(Vec<String>),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for extraction.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Result type for staging.
pub type StagingResult<T> = Result<T, StagingError>;

/// Result type for Excel output.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for uploads.
pub type UploadResult<T> = Result<T, UploadError>;

/// Result type for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let extract_err = ExtractError::EmptyFile;
        let pipeline_err: PipelineError = extract_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        let not_found = ExtractError::NotFound(PathBuf::from("data/missing.csv"));
        let pipeline_err: PipelineError = not_found.into();
        assert!(pipeline_err.to_string().contains("data/missing.csv"));
    }

    #[test]
    fn test_decode_error_lists_attempts() {
        let err = ExtractError::Decode {
            attempts: vec!["utf-8: invalid byte".into(), "latin-1: bad row".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("utf-8: invalid byte"));
        assert!(msg.contains("latin-1: bad row"));
    }

    #[test]
    fn test_schema_mismatch_format() {
        let err = PipelineError::SchemaMismatch(vec![
            "Missing columns: [\"A\"]".into(),
            "Unexpected columns found: [\"B\"]".into(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("Missing columns"));
        assert!(msg.contains("Unexpected columns"));
    }

    #[test]
    fn test_http_error_format() {
        let err = UploadError::Http {
            status: 401,
            body: "unauthorized".into(),
        };
        assert_eq!(err.to_string(), "HTTP 401: unauthorized");
    }
}
