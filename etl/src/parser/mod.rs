//! CSV extraction with an encoding fallback chain.
//!
//! Reads the survey export into a [`Dataset`]: decode the bytes with the
//! first encoding that yields a well-formed CSV, normalize headers, turn
//! missing-value markers into nulls, type each column, then repair
//! mis-decoded sequences in text cells.

use encoding_rs::Encoding;
use std::collections::HashSet;
use std::path::Path;

use crate::config::ExtractionSettings;
use crate::error::{ExtractError, ExtractResult};
use crate::logs::{log_info, log_info_indent, log_success};
use crate::models::{Column, Dataset, Value};
use crate::transform::semantic::apply_replacements;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Cell contents read as missing values.
pub const NA_MARKERS: &[&str] = &["", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "#N/A"];

/// Result of extraction with metadata
#[derive(Debug, Clone)]
pub struct Extracted {
    pub dataset: Dataset,
    /// Encoding that decoded the file
    pub encoding: String,
    /// Delimiter used
    pub delimiter: char,
}

/// Text decoded by [`decode_with_fallback`]
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub text: String,
    pub encoding: String,
}

/// Load the CSV at `path`.
pub fn load_csv(path: &Path, settings: &ExtractionSettings) -> ExtractResult<Extracted> {
    log_info(format!("📂 Loading CSV file: {}", path.display()));

    if !path.exists() {
        return Err(ExtractError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    let extracted = load_bytes(&bytes, settings)?;

    let ds = &extracted.dataset;
    let names = ds.column_names();
    log_success(format!("Successfully loaded CSV with {} encoding", extracted.encoding));
    log_info_indent(
        format!("Loaded {} rows and {} columns", ds.row_count(), ds.column_count()),
        1,
    );
    log_info_indent(
        format!(
            "Columns: {}{}",
            names.iter().take(5).cloned().collect::<Vec<_>>().join(", "),
            if names.len() > 5 { "..." } else { "" }
        ),
        1,
    );

    Ok(extracted)
}

/// Extract a dataset from raw bytes.
pub fn load_bytes(bytes: &[u8], settings: &ExtractionSettings) -> ExtractResult<Extracted> {
    let bytes = strip_bom(bytes);
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ExtractError::EmptyFile);
    }

    let (mut dataset, encoding, delimiter) = with_fallback(bytes, &settings.encodings, |text| {
        let delimiter = settings.delimiter.unwrap_or_else(|| detect_delimiter(text));
        parse_dataset(text, delimiter).map(|ds| (ds, delimiter))
    })
    .map(|((ds, delimiter), encoding)| (ds, encoding, delimiter))?;

    apply_replacements(&mut dataset, &settings.encoding_fixes);

    Ok(Extracted {
        dataset,
        encoding,
        delimiter,
    })
}

/// Decode `bytes` with the first encoding of `chain` that accepts them.
pub fn decode_with_fallback(bytes: &[u8], chain: &[String]) -> ExtractResult<Decoded> {
    with_fallback(strip_bom(bytes), chain, |text| Ok(text.to_string()))
        .map(|(text, encoding)| Decoded { text, encoding })
}

/// Try each encoding in order: decode, then `parse`. The first success wins.
fn with_fallback<T, F>(bytes: &[u8], chain: &[String], parse: F) -> ExtractResult<(T, String)>
where
    F: Fn(&str) -> Result<T, String>,
{
    let mut attempts = Vec::with_capacity(chain.len());
    for label in chain {
        match decode(bytes, label).and_then(|text| parse(&text)) {
            Ok(value) => return Ok((value, label.clone())),
            Err(reason) => {
                log_info_indent(format!("{} failed: {}", label, reason), 1);
                attempts.push(format!("{}: {}", label, reason));
            }
        }
    }
    Err(ExtractError::Decode { attempts })
}

/// Strictly decode `bytes`. Malformed input is an error, never replaced.
pub fn decode(bytes: &[u8], label: &str) -> Result<String, String> {
    match label.to_ascii_lowercase().as_str() {
        // WHATWG maps these labels to windows-1252; keep true ISO-8859-1.
        "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => {
            Ok(encoding_rs::mem::decode_latin1(bytes).into_owned())
        }
        other => {
            let encoding = Encoding::for_label(other.as_bytes())
                .ok_or_else(|| format!("unknown encoding '{}'", label))?;
            encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned())
                .ok_or_else(|| format!("invalid {} byte sequence", encoding.name()))
        }
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse decoded CSV text into a typed dataset.
pub fn parse_dataset(text: &str, delimiter: char) -> Result<Dataset, String> {
    let delimiter = u8::try_from(delimiter).map_err(|_| format!("delimiter '{}' is not ASCII", delimiter))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record.map_err(|e| e.to_string())?,
        None => return Err("no header row".to_string()),
    };
    let names = normalize_headers(header.iter());
    let width = names.len();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
    for record in records {
        let record = record.map_err(|e| e.to_string())?;
        if record.len() > width {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(format!(
                "Expected {} fields in line {}, saw {}",
                width,
                line,
                record.len()
            ));
        }
        for (i, column) in cells.iter_mut().enumerate() {
            let raw = record.get(i).filter(|s| !NA_MARKERS.contains(s));
            column.push(raw.map(str::to_string));
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| Column::new(name, type_column(raw)))
        .collect();
    Dataset::from_columns(columns).map_err(|e| e.to_string())
}

/// Name empty headers `Unnamed: i` and suffix repeats with `.1`, `.2`, ...
pub fn normalize_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for (i, header) in raw.enumerate() {
        let base = if header.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            header.to_string()
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(name.clone());
        names.push(name);
    }
    names
}

/// Integers if every present cell is one, else floats if every present
/// cell is one, else text.
fn type_column(raw: Vec<Option<String>>) -> Vec<Value> {
    let present = || raw.iter().flatten().map(|s| s.trim());

    if present().all(|s| s.parse::<i64>().is_ok()) {
        return raw
            .iter()
            .map(|cell| cell.as_deref().and_then(|s| s.trim().parse().ok()).map(Value::Int).into())
            .collect();
    }
    if present().all(|s| s.parse::<f64>().is_ok()) {
        return raw
            .iter()
            .map(|cell| cell.as_deref().and_then(|s| s.trim().parse().ok()).map(Value::Float).into())
            .collect();
    }
    raw.into_iter().map(|cell| cell.map(Value::Text).into()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ExtractionSettings {
        ExtractionSettings::default()
    }

    fn texts(ds: &Dataset, name: &str) -> Vec<Value> {
        ds.column(name).unwrap().values.clone()
    }

    #[test]
    fn test_utf8_file() {
        let out = load_bytes("Respondent ID,Kòmantè\n1,Trè byen\n".as_bytes(), &settings()).unwrap();
        assert_eq!(out.encoding, "utf-8");
        assert_eq!(out.delimiter, ',');
        assert_eq!(texts(&out.dataset, "Kòmantè"), vec![Value::text("Trè byen")]);
        assert_eq!(texts(&out.dataset, "Respondent ID"), vec![Value::Int(1)]);
    }

    #[test]
    fn test_latin1_fallback() {
        // "Kòmantè" and "Pasab" in ISO-8859-1
        let mut bytes = b"id,K".to_vec();
        bytes.extend_from_slice(&[0xF2]);
        bytes.extend_from_slice(b"mant");
        bytes.extend_from_slice(&[0xE8]);
        bytes.extend_from_slice(b"\n1,Pasab\n");

        let out = load_bytes(&bytes, &settings()).unwrap();
        assert_eq!(out.encoding, "latin-1");
        assert_eq!(out.dataset.column_names(), vec!["id", "Kòmantè"]);
    }

    #[test]
    fn test_windows_1252_fallback() {
        let chain = vec!["utf-8".to_string(), "windows-1252".to_string()];
        let decoded = decode_with_fallback(&[b'5', 0x80], &chain).unwrap();
        assert_eq!(decoded.encoding, "windows-1252");
        assert_eq!(decoded.text, "5€");
    }

    #[test]
    fn test_same_cells_in_every_supported_encoding() {
        let text = "Respondent ID,Kòmantè\n1,Trè byen; Enfimyè\n";
        let utf8 = text.as_bytes().to_vec();
        let latin1: Vec<u8> = text.chars().map(|c| c as u32 as u8).collect();
        let (cp1252, _, unmappable) = encoding_rs::WINDOWS_1252.encode(text);
        assert!(!unmappable);

        let from_utf8 = load_bytes(&utf8, &settings()).unwrap();
        let from_latin1 = load_bytes(&latin1, &settings()).unwrap();
        assert_eq!(from_utf8.encoding, "utf-8");
        assert_eq!(from_latin1.encoding, "latin-1");

        // The strict latin-1 decode accepts any byte, so the default chain
        // never reaches windows-1252; select it explicitly.
        let mut cp1252_only = settings();
        cp1252_only.encodings = vec!["utf-8".to_string(), "windows-1252".to_string()];
        let from_cp1252 = load_bytes(&cp1252, &cp1252_only).unwrap();
        assert_eq!(from_cp1252.encoding, "windows-1252");

        assert_eq!(from_utf8.dataset, from_latin1.dataset);
        assert_eq!(from_utf8.dataset, from_cp1252.dataset);
        assert_eq!(
            texts(&from_cp1252.dataset, "Kòmantè"),
            vec![Value::text("Trè byen; Enfimyè")]
        );

        // cp1252-only characters come through latin-1 as C1 controls.
        let quote = load_bytes(&[b'a', b'\n', 0x92, 0x80, b'\n'], &settings()).unwrap();
        assert_eq!(quote.encoding, "latin-1");
        assert_eq!(texts(&quote.dataset, "a"), vec![Value::text("\u{92}\u{80}")]);
    }

    #[test]
    fn test_every_encoding_fails() {
        let err = decode_with_fallback(&[0xFF, 0xFE, 0xFD], &["utf-8".to_string()]).unwrap_err();
        match err {
            ExtractError::Decode { attempts } => {
                assert_eq!(attempts.len(), 1);
                assert!(attempts[0].starts_with("utf-8"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = load_bytes(b"a,b\n1,2,3\n", &settings()).unwrap_err();
        match err {
            ExtractError::Decode { attempts } => assert_eq!(attempts.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_header_normalization() {
        let out = load_bytes(b"a,,a,a,\n1,2,3,4,5\n", &settings()).unwrap();
        assert_eq!(
            out.dataset.column_names(),
            vec!["a", "Unnamed: 1", "a.1", "a.2", "Unnamed: 4"]
        );
    }

    #[test]
    fn test_headers_not_trimmed() {
        let out = load_bytes(b"Pou ki s ,x\n1,2\n", &settings()).unwrap();
        assert_eq!(out.dataset.column_names()[0], "Pou ki s ");
    }

    #[test]
    fn test_column_typing_and_na_markers() {
        let out = load_bytes(b"n,f,t,e\n1,1.5,x,\nNA,2,N/A,\n3,nan,y,\n", &settings()).unwrap();
        let ds = out.dataset;
        assert_eq!(texts(&ds, "n"), vec![Value::Int(1), Value::Null, Value::Int(3)]);
        assert_eq!(texts(&ds, "f"), vec![Value::Float(1.5), Value::Float(2.0), Value::Null]);
        assert_eq!(texts(&ds, "t"), vec![Value::text("x"), Value::Null, Value::text("y")]);
        assert!(ds.column("e").unwrap().is_entirely_empty());
    }

    #[test]
    fn test_short_rows_padded() {
        let out = load_bytes(b"a,b,c\n1\n", &settings()).unwrap();
        assert_eq!(texts(&out.dataset, "c"), vec![Value::Null]);
    }

    #[test]
    fn test_encoding_fixes_applied_to_text() {
        let out = load_bytes("a\nSociÃ©tÃ\u{a0} nou\n".as_bytes(), &settings()).unwrap();
        assert_eq!(texts(&out.dataset, "a"), vec![Value::text("Sociétà nou")]);
    }

    #[test]
    fn test_bom_stripped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"Respondent ID\n7\n");
        let out = load_bytes(&bytes, &settings()).unwrap();
        assert_eq!(out.dataset.column_names(), vec!["Respondent ID"]);
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(load_bytes(b"", &settings()), Err(ExtractError::EmptyFile)));
        assert!(matches!(load_bytes(b"  \n\n", &settings()), Err(ExtractError::EmptyFile)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_csv(&dir.path().join("nope.csv"), &settings()).unwrap_err();
        assert!(matches!(err, ExtractError::NotFound(_)));
    }

    #[test]
    fn test_load_csv_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedback.csv");
        std::fs::write(&path, "Respondent ID;Note\n1;Byen\n2;Pasab\n").unwrap();

        let mut s = settings();
        s.delimiter = None;
        let out = load_csv(&path, &s).unwrap();
        assert_eq!(out.delimiter, ';');
        assert_eq!(out.dataset.row_count(), 2);
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
        assert_eq!(detect_delimiter("a,b;c"), ',');
        assert_eq!(detect_delimiter("single"), ',');
    }
}
