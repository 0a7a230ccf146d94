//! Output files for a generated dataset.
//!
//! Per table, `<table>_inserts.sql` and `<table>_inserts.json`; in combined
//! mode a single `dataset.sql` and `dataset.json`.

pub mod json;
pub mod sql;

use crate::error::Result;
use crate::generate::Dataset;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

pub const WRITER_BUFFER_SIZE: usize = 256 * 1024;

/// SQL dialect for identifier quoting and literal escaping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    MySql,
    #[default]
    Postgres,
    Sqlite,
    Mssql,
}

impl Dialect {
    pub fn quote_ident(self, name: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", name.replace('`', "``")),
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
            Dialect::Mssql => format!("[{}]", name.replace(']', "]]")),
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            "mssql" | "sqlserver" => Ok(Dialect::Mssql),
            _ => Err(format!(
                "Unknown dialect: {}. Valid options: mysql, postgres, sqlite, mssql",
                s
            )),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::MySql => write!(f, "mysql"),
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::Mssql => write!(f, "mssql"),
        }
    }
}

/// Writes a dataset into an output directory
#[derive(Debug, Clone)]
pub struct OutputWriter {
    output_dir: PathBuf,
    dialect: Dialect,
    combined: bool,
    sql: bool,
    json: bool,
}

impl OutputWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            dialect: Dialect::default(),
            combined: false,
            sql: true,
            json: true,
        }
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// One file per format for the whole dataset
    pub fn combined(mut self, combined: bool) -> Self {
        self.combined = combined;
        self
    }

    pub fn formats(mut self, sql: bool, json: bool) -> Self {
        self.sql = sql;
        self.json = json;
        self
    }

    /// Write the enabled formats and return the paths created
    pub fn write(&self, dataset: &Dataset) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir)?;
        let mut written = Vec::new();

        if self.combined {
            if self.sql {
                let path = self.output_dir.join("dataset.sql");
                let mut w = create(&path)?;
                sql::write_dataset(&mut w, dataset, self.dialect)?;
                w.flush()?;
                written.push(path);
            }
            if self.json {
                let path = self.output_dir.join("dataset.json");
                let mut w = create(&path)?;
                json::write_dataset(&mut w, dataset)?;
                w.flush()?;
                written.push(path);
            }
        } else {
            for table in dataset.iter() {
                if self.sql {
                    let path = self.table_path(&table.table_name, "sql");
                    let mut w = create(&path)?;
                    sql::write_table(&mut w, table, self.dialect)?;
                    w.flush()?;
                    written.push(path);
                }
                if self.json {
                    let path = self.table_path(&table.table_name, "json");
                    let mut w = create(&path)?;
                    json::write_table(&mut w, table)?;
                    w.flush()?;
                    written.push(path);
                }
            }
        }

        for path in &written {
            debug!(file = %path.display(), "wrote output");
        }
        Ok(written)
    }

    fn table_path(&self, table: &str, ext: &str) -> PathBuf {
        self.output_dir.join(format!("{}_inserts.{}", table, ext))
    }
}

fn create(path: &Path) -> std::io::Result<BufWriter<File>> {
    let file = File::create(path)?;
    Ok(BufWriter::with_capacity(WRITER_BUFFER_SIZE, file))
}
