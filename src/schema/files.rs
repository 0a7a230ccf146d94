//! Schema file discovery.
//!
//! Expands `<dir>/*.sql` and parses every CREATE TABLE found in the matching
//! files. Files without a table definition are skipped.

use super::{parse_tables, Table};
use crate::error::{Error, Result};
use glob::MatchOptions;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// List the `.sql` files directly inside `dir`, sorted by path.
pub fn schema_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::config(format!(
            "schema directory does not exist: {}",
            dir.display()
        )));
    }

    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern_str = Path::new(&escaped).join("*.sql").to_string_lossy().into_owned();
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let entries = glob::glob_with(&pattern_str, options)
        .map_err(|e| Error::config(format!("invalid schema path '{}': {}", pattern_str, e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::Read {
            path: e.path().to_path_buf(),
            source: e.into_error(),
        })?;
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Load all tables from the schema files in `dir`, dropping any table named in
/// `exclude` (case-insensitive).
pub fn load_schema_dir(dir: &Path, exclude: &[String]) -> Result<Vec<Table>> {
    let mut tables: Vec<Table> = Vec::new();

    for path in schema_files(dir)? {
        let text = fs::read_to_string(&path).map_err(|source| Error::Read {
            path: path.clone(),
            source,
        })?;
        let parsed = parse_tables(&text)?;
        if parsed.is_empty() {
            debug!(file = %path.display(), "no CREATE TABLE found, skipping");
            continue;
        }

        for table in parsed {
            if exclude.iter().any(|e| e.eq_ignore_ascii_case(&table.name)) {
                debug!(table = %table.name, "excluded");
                continue;
            }
            if tables.iter().any(|t| t.name.eq_ignore_ascii_case(&table.name)) {
                return Err(Error::schema(
                    &table.name,
                    format!("table is defined more than once (again in {})", path.display()),
                ));
            }
            debug!(table = %table.name, columns = table.columns.len(), file = %path.display(), "parsed table");
            tables.push(table);
        }
    }

    if tables.is_empty() {
        return Err(Error::config(format!(
            "no CREATE TABLE definitions found in {}",
            dir.display()
        )));
    }

    Ok(tables)
}
