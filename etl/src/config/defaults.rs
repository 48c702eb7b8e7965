//! Built-in values for the SATIAP Home feedback survey export.

use crate::transform::semantic::{ColumnGroup, Replacement};

pub const CSV_PATH: &str = "data/datafeadback.csv";
pub const EXCEL_OUTPUT: &str = "data/output/output.xlsx";
pub const STAGING_DB_PATH: &str = "data/staging.db";
pub const STAGING_TABLE: &str = "staging_data";

pub const EXCEL_SHEET_NAME: &str = "Source_Raw";
/// Header fill colour (RGB).
pub const HEADER_FILL: u32 = 0x366092;
pub const MAX_COLUMN_WIDTH: f64 = 50.0;

/// Placeholder shipped in the sample configuration.
pub const PLACEHOLDER_SITE: &str = "https://votreentreprise.sharepoint.com/sites/votre-site";
pub const PLACEHOLDER_TOKEN: &str = "votre-token-graph-api";
pub const SITE_NAME: &str = "votre-site";
pub const DOCUMENT_LIBRARY: &str = "Documents partages";
pub const GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";

pub const KEY_COLUMN: &str = "Respondent ID";

pub const ENCODINGS: &[&str] = &["utf-8", "latin-1", "windows-1252"];

/// Rating labels to stars, then duration and frequency labels kept as-is.
const RATING_MAPPINGS: &[(&str, &str)] = &[
    ("Trè byen", "5 Etwal"),
    ("Byen", "4 Etwal"),
    ("Pasab", "3 Etwal"),
    ("Pa bon", "2 Etwal"),
    ("Pat bon ditou", "1 Etwal"),
    ("Trè long", "Trè long"),
    ("Long", "Long"),
    ("Kout", "Kout"),
    ("Trè kout", "Trè kout"),
    ("Pa ditou", "Pa ditou"),
    ("Trè raman", "Trè raman"),
    ("raman", "raman"),
    ("Pa souvan", "Pa souvan"),
    ("Souvan", "Souvan"),
];

const TEXT_STANDARDIZATION: &[(&str, &str)] = &[("Enfimyè", "Enfimyè"), ("Miss", "Miss")];

/// UTF-8 sequences that were decoded as Latin-1 somewhere upstream.
const ENCODING_FIXES: &[(&str, &str)] = &[
    ("Ã´", "ô"),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ã\u{a0}", "à"),
    ("Ã®", "î"),
    ("Ã§", "ç"),
    ("Ã»", "û"),
    ("Ã¢", "â"),
    ("Ã«", "ë"),
    ("Ã¯", "ï"),
    ("Ã¼", "ü"),
    ("Ã¶", "ö"),
];

const COLUMNS_TO_REMOVE: &[&str] = &[
    "Email Address",
    "First Name",
    "Last Name",
    "Custom Data 1",
    "language",
];

const EXPECTED_COLUMNS: &[&str] = &[
    "Respondent ID",
    "Collector ID",
    "Start Date",
    "End Date",
    "IP Address",
    "Nan ki depatman lopital / sant sante a ye ?",
    "Nan ki lopital oubyen sant sante ou konn ale nan depatmant atibonit ?",
    "Nan ki lopital oubyen sant sante ou konn ale nan depatman sant?",
    "Nan ki lopital oubyen sant sante ou konn ale nan depatman grandans?",
    "Nan ki lopital oubyen sant sante ou konn ale nan depatman nip?",
    "Nan ki lopital oubyen sant sante ou konn ale nan depatman nò?",
    "Nan ki lopital oubyen sant sante ou konn ale nan depatman nòdès?",
    "Nan ki lopital oubyen sant sante ou konn ale nan depatman nòdwès?",
    "Nan ki lopital oubyen sant sante ou konn ale nan depatman wès?",
    "Nan ki lopital oubyen sant sante ou konn ale nan depatman sid?",
    "Nan ki lopital oubyen sant sante ou konn ale nan depatman sidès?",
    "Antre kòd ST?",
    "Dat dènye vizit ou nan sant sante a oubyen lopital la ?",
    "Kòman ou tap note sèvis ou resevwa nan sant sante a oubyen lopital la jeneralman ?",
    "De kisa ou satisfè nan sant sante a oubyen lopital la?",
    "Unnamed: 32",
    "Unnamed: 33",
    "Unnamed: 34",
    "Unnamed: 35",
    "Kòmantè ou .",
    "Kòman ou tap note pwòprete nan sant sante a oubyen lopital la?",
    "Kòman ou tap note akèy nan sant sante a oubyen lopital la?",
    "Kòman ou tap note sèvis pèsonèl yo bay nan sant sante a oubyen lopital la jeneralman ?",
    "Kòman ou tap note tan ou fè ap tann nan sant sante a oubyen lopital la jeneralman ?",
    "Eske moun yo mal gade ou nan sant sante a oubyen lopital la jeneralman ?",
    "Ki moun ki mal gade w nan sant sante oubyen lopital la ?",
    "Kòmantè ou sou sant sante a oubyen lopital la.",
    "Ki pèsonèl ou pa satisfè de sèvis li ?",
    "Unnamed: 53",
    "Unnamed: 54",
    "Unnamed: 55",
    "Unnamed: 56",
    "Kòmantè e sigjesyon ou sou sèvis ou jwenn?",
    "Kòman ou tap note sèvis Doktè yo bay nan sant sante a oubyen lopital la jeneralman ?",
    "Kòman ou tap note sèvis Enfimyè yo bay nan sant sante a oubyen lopital la jeneralman ?",
    "Kòman ou tap note sèvis Famasyen yo bay nan sant sante a oubyen lopital la jeneralman ?",
    "Kòman ou tap note sèvis Sikològ / travayè sosyalyo bay nan sant sante a oubyen lopital la jeneralman ?",
    "Kòman ou tap note sèvis Laboratwa yo bay nan sant sante a oubyen lopital la jeneralman ?",
    "Pou ki sèvis ou bay enfòmasyon sa yo ",
    "Unnamed: 22",
    "Unnamed: 23",
    "Unnamed: 24",
    "Unnamed: 25",
    "Unnamed: 26",
    "Ki moun ki mal gade w nan sant sante oubyen lopital la ?",
    "Unnamed: 43",
    "Unnamed: 44",
    "Unnamed: 45",
    "Unnamed: 46",
    "Unnamed: 47",
    "Unnamed: 48",
    "Unnamed: 49",
    "Unnamed: 50",
    "Hospital_Combined",
    "Satisfaction_Combined",
    "Dissatisfaction_Combined",
    "Mistreatment_Combined",
];

fn pairs(table: &[(&str, &str)]) -> Vec<Replacement> {
    table.iter().map(|(from, to)| Replacement::new(from, to)).collect()
}

pub fn rating_mappings() -> Vec<Replacement> {
    pairs(RATING_MAPPINGS)
}

pub fn text_standardization() -> Vec<Replacement> {
    pairs(TEXT_STANDARDIZATION)
}

pub fn encoding_fixes() -> Vec<Replacement> {
    pairs(ENCODING_FIXES)
}

pub fn columns_to_remove() -> Vec<String> {
    COLUMNS_TO_REMOVE.iter().map(|c| c.to_string()).collect()
}

pub fn encodings() -> Vec<String> {
    ENCODINGS.iter().map(|e| e.to_string()).collect()
}

/// The expected output schema, first occurrence of each name only.
pub fn expected_columns() -> Vec<String> {
    dedup_names(EXPECTED_COLUMNS.iter().map(|c| c.to_string()))
}

/// Keep the first occurrence of each name, preserving order.
pub fn dedup_names(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

pub fn column_groups() -> Vec<ColumnGroup> {
    vec![
        ColumnGroup::new("Hospital_Combined", &["lopital"]),
        ColumnGroup::new("Satisfaction_Combined", &["satisfè", "satisfe"]),
        ColumnGroup::new("Dissatisfaction_Combined", &["pa satisfè", "pa satisfe"]),
        ColumnGroup::new("Mistreatment_Combined", &["mal gade"]),
    ]
}
