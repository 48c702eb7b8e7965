//! SQLite staging of the transformed dataset.
//!
//! Each run replaces the staging table wholesale: drop, create, insert, all
//! inside one transaction so a failed run leaves the previous table intact.

use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue};
use rusqlite::{params_from_iter, Connection};
use std::path::Path;

use crate::error::StagingResult;
use crate::logs::{log_info_indent, log_success};
use crate::models::{ColumnKind, Dataset, Value};

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Int(i) => ToSqlOutput::from(*i),
            Value::Float(f) => ToSqlOutput::from(*f),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

/// Write `dataset` to `table` in the database at `db_path`, replacing any
/// previous contents. Returns the number of rows written.
pub fn save_to_staging(dataset: &Dataset, db_path: &Path, table: &str) -> StagingResult<usize> {
    if let Some(dir) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let mut conn = Connection::open(db_path)?;
    let written = replace_table(&mut conn, dataset, table)?;

    log_success(format!("Data saved to staging database: {}", db_path.display()));
    log_info_indent(format!("Table name: {} ({} rows)", table, written), 1);
    Ok(written)
}

/// Drop, recreate and fill `table` in a single transaction.
pub fn replace_table(conn: &mut Connection, dataset: &Dataset, table: &str) -> rusqlite::Result<usize> {
    let table = quote_ident(table);
    let tx = conn.transaction()?;

    tx.execute(&format!("DROP TABLE IF EXISTS {}", table), [])?;

    let definitions: Vec<String> = dataset
        .columns()
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), affinity(c.kind())))
        .collect();
    tx.execute(&format!("CREATE TABLE {} ({})", table, definitions.join(", ")), [])?;

    let names: Vec<String> = dataset.columns().iter().map(|c| quote_ident(&c.name)).collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();
    let insert = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        names.join(", "),
        placeholders.join(", ")
    );

    {
        let mut stmt = tx.prepare(&insert)?;
        for row in 0..dataset.row_count() {
            stmt.execute(params_from_iter(dataset.row(row)))?;
        }
    }

    tx.commit()?;
    Ok(dataset.row_count())
}

/// Number of rows currently staged in `table`.
pub fn staged_row_count(db_path: &Path, table: &str) -> StagingResult<usize> {
    let conn = Connection::open(db_path)?;
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
        [],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

fn affinity(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Integer => "INTEGER",
        ColumnKind::Real => "REAL",
        ColumnKind::Text => "TEXT",
    }
}

/// Double-quote an SQL identifier.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
