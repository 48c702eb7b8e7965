//! SATIAP ETL CLI - survey export to Excel and SharePoint
//!
//! # Main Command
//!
//! ```bash
//! satiap-etl run                          # Full pipeline with default settings
//! satiap-etl --config etl.json run --no-upload
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! satiap-etl extract data/datafeadback.csv -o raw.json   # Extract only
//! satiap-etl transform data/datafeadback.csv             # Extract + transform
//! satiap-etl check data/datafeadback.csv                 # Schema check
//! satiap-etl upload data/output/output.xlsx              # Upload an existing file
//! satiap-etl edits                                       # Show the edit plan
//! ```

use clap::{Parser, Subcommand};
use satiap_etl::logs::init_tracing;
use satiap_etl::uploader::SharePointClient;
use satiap_etl::{
    load_csv, operations_description, run, transform, validate_columns, Settings, UploadStatus,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "satiap-etl")]
#[command(about = "Load the SATIAP Home survey export into Excel and SharePoint", long_about = None)]
struct Cli {
    /// Settings file (JSON); built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: CSV → transform → SQLite → Excel → SharePoint
    Run {
        /// Input CSV file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Excel output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// SQLite staging database
        #[arg(long)]
        staging_db: Option<PathBuf>,

        /// Drop columns outside the expected schema
        #[arg(long)]
        drop_extra: bool,

        /// Skip the SharePoint upload
        #[arg(long)]
        no_upload: bool,

        /// Fail instead of replacing an existing remote file
        #[arg(long)]
        no_overwrite: bool,
    },

    /// Extract a CSV and report its encoding, delimiter and shape
    Extract {
        /// Input CSV file
        input: PathBuf,

        /// Write the records as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract and transform a CSV, output JSON records
    Transform {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check the transformed columns against the expected schema
    Check {
        /// Input CSV file
        input: PathBuf,
    },

    /// Upload an existing Excel file to SharePoint
    Upload {
        /// File to upload
        file: PathBuf,

        /// Fail instead of replacing an existing remote file
        #[arg(long)]
        no_overwrite: bool,
    },

    /// Show the structural edit plan
    Edits {
        /// Describe the available edit kinds instead
        #[arg(long)]
        describe: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let result = match load_settings(cli.config.as_deref()) {
        Ok(settings) => match cli.command {
            Commands::Run {
                input,
                output,
                staging_db,
                drop_extra,
                no_upload,
                no_overwrite,
            } => {
                let mut settings = settings;
                if let Some(input) = input {
                    settings.paths.input = input;
                }
                if let Some(output) = output {
                    settings.paths.output = output;
                }
                if let Some(staging_db) = staging_db {
                    settings.paths.staging_db = staging_db;
                }
                if drop_extra {
                    settings.schema.keep_extra = false;
                }
                if no_upload {
                    settings.sharepoint.enabled = false;
                }
                if no_overwrite {
                    settings.sharepoint.overwrite = false;
                }
                cmd_run(&settings).await
            }

            Commands::Extract { input, output } => cmd_extract(&settings, &input, output.as_deref()),

            Commands::Transform { input, output } => cmd_transform(&settings, &input, output.as_deref()),

            Commands::Check { input } => cmd_check(&settings, &input),

            Commands::Upload { file, no_overwrite } => cmd_upload(&settings, &file, !no_overwrite).await,

            Commands::Edits { describe } => cmd_edits(&settings, describe),
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = Settings::load(path)?;
    settings.apply_env();
    Ok(settings)
}

async fn cmd_run(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let summary = run(settings).await?;

    eprintln!("\n📊 Run summary:");
    eprintln!("   Encoding: {}", summary.encoding);
    eprintln!("   Rows: {}", summary.rows);
    eprintln!("   Columns: {}", summary.columns);
    eprintln!("   Staged: {} rows in {}", summary.staged_rows, summary.staging_db.display());
    eprintln!(
        "   Excel: {} ({:.2} KB)",
        summary.excel.path.display(),
        summary.excel.size_bytes as f64 / 1024.0
    );
    match &summary.upload {
        UploadStatus::Disabled => eprintln!("   SharePoint: disabled"),
        UploadStatus::Uploaded { location, verified } => eprintln!(
            "   SharePoint: {}{}",
            location,
            if *verified { "" } else { " (not verified)" }
        ),
        UploadStatus::Failed(reason) => eprintln!("   SharePoint: failed ({})", reason),
    }
    eprintln!(
        "   Duration: {:.1}s",
        (summary.finished_at - summary.started_at).num_milliseconds() as f64 / 1000.0
    );

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_extract(settings: &Settings, input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Extracting: {}", input.display());

    let extracted = load_csv(input, &settings.extraction)?;
    eprintln!("   Encoding: {}", extracted.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        format_delimiter(extracted.delimiter),
        if settings.extraction.delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!(
        "   Shape: {} rows x {} columns",
        extracted.dataset.row_count(),
        extracted.dataset.column_count()
    );

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&extracted.dataset.to_records())?;
        write_output(&json, Some(path))?;
    }

    Ok(())
}

fn cmd_transform(settings: &Settings, input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let extracted = load_csv(input, &settings.extraction)?;
    let outcome = transform(extracted.dataset, &settings.transform);

    eprintln!("\n⚙️  Edits applied: {}", outcome.applied.len());
    for skip in &outcome.skipped {
        eprintln!("   ⚠️  skipped {}: {}", skip.edit, skip.reason);
    }
    eprintln!("   Rows removed: {}", outcome.rows_removed);
    eprintln!("   Columns removed: {}", outcome.columns_removed.len());
    eprintln!("   Cells rewritten: {}", outcome.cells_rewritten);

    let json = serde_json::to_string_pretty(&outcome.dataset.to_records())?;
    write_output(&json, output)?;

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_check(settings: &Settings, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Checking: {}", input.display());

    let extracted = load_csv(input, &settings.extraction)?;
    let outcome = transform(extracted.dataset, &settings.transform);
    let (valid, errors) = validate_columns(&outcome.dataset.column_names(), &settings.schema.expected_columns);

    if !valid {
        eprintln!("\n❌ Schema mismatch:");
        for err in &errors {
            eprintln!("   - {}", err);
        }
        std::process::exit(1);
    }

    eprintln!(
        "\n✅ All {} expected columns present",
        settings.schema.expected_columns.len()
    );
    Ok(())
}

async fn cmd_upload(settings: &Settings, file: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    let client = SharePointClient::new(&settings.sharepoint)?;
    let receipt = client.upload_file(file, overwrite).await?;

    if client.verify_upload(&receipt.file_name).await {
        eprintln!("✅ Verified: {}", receipt.location);
    } else {
        eprintln!("⚠️  Uploaded but not found on verification: {}", receipt.location);
    }
    Ok(())
}

fn cmd_edits(settings: &Settings, describe: bool) -> Result<(), Box<dyn std::error::Error>> {
    if describe {
        println!("{}", operations_description());
    } else {
        println!("{}", settings.transform.plan.to_json()?);
    }
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
