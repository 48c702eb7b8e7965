//! Excel output.
//!
//! Writes the final dataset to a single-sheet workbook with a styled,
//! frozen header row and auto-sized columns, then re-opens the file to
//! check its shape.

use calamine::{open_workbook, Reader, Xlsx};
use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook, Worksheet};
use std::path::{Path, PathBuf};

use crate::config::ExcelSettings;
use crate::error::{LoadError, LoadResult};
use crate::logs::{log_info, log_info_indent, log_success, log_warning_indent};
use crate::models::{Column, Dataset, Value};

/// Worksheet limits of the xlsx format.
const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;
/// Longest text a cell can hold, in characters.
pub const MAX_CELL_CHARS: usize = 32_767;

/// What [`write_to_excel`] produced
#[derive(Debug, Clone, PartialEq)]
pub struct ExcelSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
    pub size_bytes: u64,
}

/// Shape of a written workbook compared to what was expected
#[derive(Debug, Clone, PartialEq)]
pub struct ExcelVerification {
    /// Data rows found (header excluded)
    pub rows: usize,
    pub columns: usize,
    pub rows_match: bool,
    pub columns_match: bool,
}

impl ExcelVerification {
    pub fn is_ok(&self) -> bool {
        self.rows_match && self.columns_match
    }
}

/// Write `dataset` to `path` as a single-sheet workbook.
pub fn write_to_excel(dataset: &Dataset, path: &Path, settings: &ExcelSettings) -> LoadResult<ExcelSummary> {
    log_info(format!("📊 Writing Excel file: {}", path.display()));

    if dataset.row_count() + 1 > MAX_ROWS || dataset.column_count() > MAX_COLUMNS {
        return Err(LoadError::TooLarge(format!(
            "{} rows x {} columns",
            dataset.row_count(),
            dataset.column_count()
        )));
    }
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&settings.sheet_name)?;
    write_sheet(worksheet, dataset, settings)?;
    workbook.save(path)?;

    let size_bytes = std::fs::metadata(path)?.len();
    log_success(format!(
        "Excel file written: {} rows, {} columns",
        dataset.row_count(),
        dataset.column_count()
    ));
    log_info_indent(format!("Sheet: {}", settings.sheet_name), 1);

    Ok(ExcelSummary {
        path: path.to_path_buf(),
        rows: dataset.row_count(),
        columns: dataset.column_count(),
        size_bytes,
    })
}

fn write_sheet(worksheet: &mut Worksheet, dataset: &Dataset, settings: &ExcelSettings) -> LoadResult<()> {
    let header = header_format(settings.header_fill);
    let mut truncated = 0;

    for (col, column) in dataset.columns().iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, &column.name, &header)?;

        for (row, value) in column.values.iter().enumerate() {
            let row = row as u32 + 1;
            match value {
                Value::Null => {}
                Value::Text(s) if s.is_empty() => {}
                Value::Int(i) => {
                    worksheet.write_number(row, col, *i as f64)?;
                }
                Value::Float(f) => {
                    worksheet.write_number(row, col, *f)?;
                }
                Value::Text(s) => {
                    let (text, cut) = fit_cell(s);
                    truncated += usize::from(cut);
                    worksheet.write_string(row, col, text)?;
                }
            }
        }

        worksheet.set_column_width(col, column_width(column, settings.max_column_width))?;
    }

    worksheet.set_freeze_panes(1, 0)?;
    if truncated > 0 {
        log_warning_indent(
            format!("{} text cells cut to {} characters", truncated, MAX_CELL_CHARS),
            1,
        );
    }
    Ok(())
}

/// `text` limited to [`MAX_CELL_CHARS`], and whether it was cut.
fn fit_cell(text: &str) -> (&str, bool) {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => (&text[..end], true),
        None => (text, false),
    }
}

/// Bold white text on a solid fill.
pub fn header_format(fill: u32) -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(fill))
        .set_pattern(FormatPattern::Solid)
}

/// Longest displayed value, header included, plus 2, capped at `max`.
pub fn column_width(column: &Column, max: f64) -> f64 {
    ((column.display_width() + 2) as f64).min(max)
}

/// Re-open the workbook and compare its used range to the expected shape.
pub fn verify_excel(
    path: &Path,
    sheet: &str,
    expected_rows: usize,
    expected_columns: usize,
) -> LoadResult<ExcelVerification> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook.worksheet_range(sheet)?;
    let (height, width) = range.get_size();
    let rows = height.saturating_sub(1);

    Ok(ExcelVerification {
        rows,
        columns: width,
        rows_match: rows == expected_rows,
        columns_match: width == expected_columns,
    })
}
