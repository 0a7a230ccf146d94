//! INSERT statement rendering.

use super::Dialect;
use crate::generate::{Dataset, Row, TableData};
use std::io::{self, Write};

/// Render one row as a single INSERT statement, columns in declared order
pub fn render_insert(table: &TableData, row: &Row, dialect: Dialect) -> String {
    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|c| dialect.quote_ident(c))
        .collect();
    let values: Vec<String> = row.iter().map(|v| v.to_sql(dialect)).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        dialect.quote_ident(&table.table_name),
        columns.join(", "),
        values.join(", ")
    )
}

/// Write every row of `table`, one statement per line
pub fn write_table<W: Write>(w: &mut W, table: &TableData, dialect: Dialect) -> io::Result<()> {
    for row in &table.rows {
        writeln!(w, "{}", render_insert(table, row, dialect))?;
    }
    Ok(())
}

/// Write all tables in generation order, each preceded by a comment header
pub fn write_dataset<W: Write>(w: &mut W, dataset: &Dataset, dialect: Dialect) -> io::Result<()> {
    for (i, table) in dataset.iter().enumerate() {
        if i > 0 {
            writeln!(w)?;
        }
        writeln!(w, "-- {} ({} rows)", table.table_name, table.rows.len())?;
        write_table(w, table, dialect)?;
    }
    Ok(())
}
