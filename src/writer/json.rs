//! JSON rendering: arrays of row objects with keys in column order.

use crate::generate::{Dataset, Row, TableData};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::io::Write;

struct RowObject<'a> {
    columns: &'a [String],
    row: &'a Row,
}

impl Serialize for RowObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.row) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Serializes a table as a JSON array of objects
pub struct TableRows<'a>(pub &'a TableData);

impl Serialize for TableRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let table = self.0;
        let mut seq = serializer.serialize_seq(Some(table.rows.len()))?;
        for row in &table.rows {
            seq.serialize_element(&RowObject {
                columns: &table.columns,
                row,
            })?;
        }
        seq.end()
    }
}

/// Serializes a dataset as an object of table name -> rows, in generation order
pub struct DatasetRows<'a>(pub &'a Dataset);

impl Serialize for DatasetRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.tables.len()))?;
        for table in self.0.iter() {
            map.serialize_entry(&table.table_name, &TableRows(table))?;
        }
        map.end()
    }
}

pub fn write_table<W: Write>(w: &mut W, table: &TableData) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(w, &TableRows(table))
}

pub fn write_dataset<W: Write>(w: &mut W, dataset: &Dataset) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(w, &DatasetRows(dataset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::Value;

    #[test]
    fn test_keys_follow_column_order() {
        let table = TableData {
            table_name: "t".to_string(),
            columns: vec!["zeta".to_string(), "alpha".to_string()],
            rows: vec![vec![Value::Int(1), Value::Bool(true)]],
        };
        let text = serde_json::to_string(&TableRows(&table)).unwrap();
        assert_eq!(text, r#"[{"zeta":1,"alpha":true}]"#);
    }

    #[test]
    fn test_empty_table_is_empty_array() {
        let table = TableData {
            table_name: "t".to_string(),
            columns: vec!["id".to_string()],
            rows: Vec::new(),
        };
        let mut out = Vec::new();
        write_table(&mut out, &table).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[]");
    }
}
