//! Pipeline settings.
//!
//! Built-in defaults describe the SATIAP Home survey export. A JSON file can
//! override any section, environment variables then fill in the SharePoint
//! credentials, and CLI flags override last.
//!
//! ```json
//! {
//!   "paths": { "input": "exports/feedback.csv" },
//!   "schema": { "keep_extra": false },
//!   "sharepoint": { "library": "Shared Documents" }
//! }
//! ```

pub mod defaults;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::transform::dsl::EditPlan;
use crate::transform::semantic::{ColumnGroup, Replacement};

/// Environment variables read by [`Settings::apply_env`].
pub const ENV_ACCESS_TOKEN: &str = "SHAREPOINT_ACCESS_TOKEN";
pub const ENV_SITE: &str = "SHAREPOINT_SITE";
pub const ENV_SITE_NAME: &str = "SHAREPOINT_SITE_NAME";
pub const ENV_LIBRARY: &str = "SHAREPOINT_LIBRARY";

/// All pipeline settings, one section per stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathSettings,
    pub extraction: ExtractionSettings,
    pub transform: TransformSettings,
    pub staging: StagingSettings,
    pub schema: SchemaSettings,
    pub excel: ExcelSettings,
    pub sharepoint: SharePointSettings,
}

/// Input and output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Survey export to read
    pub input: PathBuf,
    /// Excel file to write
    pub output: PathBuf,
    /// SQLite staging database
    pub staging_db: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            input: PathBuf::from(defaults::CSV_PATH),
            output: PathBuf::from(defaults::EXCEL_OUTPUT),
            staging_db: PathBuf::from(defaults::STAGING_DB_PATH),
        }
    }
}

/// How the CSV is decoded and parsed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Encodings tried in order
    pub encodings: Vec<String>,
    /// Field delimiter; `None` auto-detects from the header line
    pub delimiter: Option<char>,
    /// Mis-decoded sequences replaced in text cells
    pub encoding_fixes: Vec<Replacement>,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            encodings: defaults::encodings(),
            delimiter: Some(','),
            encoding_fixes: defaults::encoding_fixes(),
        }
    }
}

/// Transformation steps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSettings {
    /// Structural edits for the positional phase
    pub plan: EditPlan,
    /// Column groups folded into combined columns
    pub groups: Vec<ColumnGroup>,
    /// Rows with a blank value here are dropped
    pub key_column: String,
    pub columns_to_remove: Vec<String>,
    pub rating_mappings: Vec<Replacement>,
    pub text_standardization: Vec<Replacement>,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            plan: EditPlan::default(),
            groups: defaults::column_groups(),
            key_column: defaults::KEY_COLUMN.to_string(),
            columns_to_remove: defaults::columns_to_remove(),
            rating_mappings: defaults::rating_mappings(),
            text_standardization: defaults::text_standardization(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingSettings {
    pub table: String,
}

impl Default for StagingSettings {
    fn default() -> Self {
        Self {
            table: defaults::STAGING_TABLE.to_string(),
        }
    }
}

/// Expected output columns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaSettings {
    pub expected_columns: Vec<String>,
    /// Keep columns outside the schema, after the expected ones
    pub keep_extra: bool,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            expected_columns: defaults::expected_columns(),
            keep_extra: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcelSettings {
    pub sheet_name: String,
    /// Upper bound for auto-sized column widths
    pub max_column_width: f64,
    /// Header background, as `0xRRGGBB`
    pub header_fill: u32,
}

impl Default for ExcelSettings {
    fn default() -> Self {
        Self {
            sheet_name: defaults::EXCEL_SHEET_NAME.to_string(),
            max_column_width: defaults::MAX_COLUMN_WIDTH,
            header_fill: defaults::HEADER_FILL,
        }
    }
}

/// SharePoint / Microsoft Graph target
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharePointSettings {
    /// Run the upload stage at all
    pub enabled: bool,
    /// Replace an existing file of the same name
    pub overwrite: bool,
    /// Full site URL, e.g. `https://contoso.sharepoint.com/sites/feedback`
    pub site_url: String,
    /// Site segment after `/sites/`
    pub site_name: String,
    pub library: String,
    pub graph_base: String,
    /// Bearer token; usually supplied through the environment
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

impl Default for SharePointSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            overwrite: true,
            site_url: defaults::PLACEHOLDER_SITE.to_string(),
            site_name: defaults::SITE_NAME.to_string(),
            library: defaults::DOCUMENT_LIBRARY.to_string(),
            graph_base: defaults::GRAPH_BASE.to_string(),
            access_token: None,
        }
    }
}

impl SharePointSettings {
    /// A usable token: present, non-blank, not the sample placeholder.
    pub fn token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != defaults::PLACEHOLDER_TOKEN)
    }
}

impl Settings {
    /// Defaults, overlaid with the JSON file at `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_json(&content).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Self::default(),
        };
        settings.schema.expected_columns =
            defaults::dedup_names(std::mem::take(&mut settings.schema.expected_columns));
        Ok(settings)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Overlay SharePoint settings from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay SharePoint settings from `lookup`. Blank values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let sp = &mut self.sharepoint;
        if let Some(token) = get(ENV_ACCESS_TOKEN) {
            sp.access_token = Some(token);
        }
        if let Some(site) = get(ENV_SITE) {
            sp.site_url = site;
        }
        if let Some(name) = get(ENV_SITE_NAME) {
            sp.site_name = name;
        }
        if let Some(library) = get(ENV_LIBRARY) {
            sp.library = library;
        }
    }

    /// Problems worth reporting before a run. None of them stop the run.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let input = &self.paths.input;
        if !input.exists() {
            warnings.push(format!("CSV file not found: {}", input.display()));
        }
        if let Some(dir) = non_empty_parent(input) {
            if !dir.exists() {
                warnings.push(format!("Data directory not found: {}", dir.display()));
            }
        }
        if let Some(dir) = non_empty_parent(&self.paths.output) {
            if !dir.exists() {
                warnings.push(format!("Output directory not found: {}", dir.display()));
            }
        }

        if self.sharepoint.enabled {
            if self.sharepoint.site_url == defaults::PLACEHOLDER_SITE {
                warnings.push("SHAREPOINT_SITE must be configured with your actual SharePoint URL".to_string());
            }
            if self.sharepoint.token().is_none() {
                warnings.push(format!("{} must be set to a valid Graph API token", ENV_ACCESS_TOKEN));
            }
        }

        warnings
    }
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}
