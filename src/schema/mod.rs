//! Schema model for fixture generation.
//!
//! This module provides:
//! - Data models for tables, columns and their key roles
//! - DDL parsing of CREATE TABLE statements
//! - Schema file discovery
//! - The parent/child relationship graph used to order generation

mod ddl;
pub mod files;
mod graph;

pub use ddl::*;
pub use graph::*;

use std::fmt;

/// Index of a table within a [`RelationshipGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);

impl TableId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({})", self.0)
    }
}

/// Declared column type, reduced to the families the value generator knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// SMALLINT, INT2, TINYINT
    SmallInt,
    /// INT, INTEGER, INT4, MEDIUMINT, SERIAL
    Int,
    /// BIGINT, INT8, BIGSERIAL
    BigInt,
    /// DECIMAL, NUMERIC, MONEY
    Decimal,
    /// FLOAT, REAL, DOUBLE, FLOAT8
    Float,
    /// BOOL, BOOLEAN, BIT
    Bool,
    /// UUID, UNIQUEIDENTIFIER
    Uuid,
    /// Fixed-width CHAR, NCHAR, BPCHAR
    Char,
    /// VARCHAR, NVARCHAR, CHARACTER VARYING
    VarChar,
    /// TEXT and its size variants
    Text,
    /// JSON, JSONB
    Json,
    Date,
    /// DATETIME, TIMESTAMP, TIMESTAMPTZ
    DateTime,
    Time,
    /// Anything else; generation fails for these
    Other(String),
}

impl ColumnType {
    /// Classify a SQL base type name (without length), across MySQL,
    /// PostgreSQL, SQLite and MSSQL spellings.
    pub fn from_sql_type(type_str: &str) -> Self {
        let lower = type_str.to_lowercase();
        let normalized = lower.split_whitespace().collect::<Vec<_>>().join(" ");

        match normalized.as_str() {
            "smallint" | "int2" | "tinyint" | "smallserial" => ColumnType::SmallInt,
            "int" | "integer" | "int4" | "mediumint" | "serial" => ColumnType::Int,
            "bigint" | "int8" | "bigserial" => ColumnType::BigInt,
            "decimal" | "numeric" | "money" | "smallmoney" => ColumnType::Decimal,
            "float" | "float4" | "float8" | "real" | "double" | "double precision" => {
                ColumnType::Float
            }
            "bool" | "boolean" | "bit" => ColumnType::Bool,
            "uuid" | "uniqueidentifier" => ColumnType::Uuid,
            "char" | "character" | "nchar" | "bpchar" => ColumnType::Char,
            "varchar" | "nvarchar" | "varchar2" | "character varying" => ColumnType::VarChar,
            "text" | "tinytext" | "mediumtext" | "longtext" | "ntext" | "clob" => ColumnType::Text,
            "json" | "jsonb" => ColumnType::Json,
            "date" => ColumnType::Date,
            "datetime" | "datetime2" | "smalldatetime" | "timestamp" | "timestamptz" => {
                ColumnType::DateTime
            }
            "time" | "timetz" => ColumnType::Time,
            _ => ColumnType::Other(type_str.trim().to_string()),
        }
    }

    /// Whether `length` bounds the integer digit count for this type
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ColumnType::SmallInt | ColumnType::Int | ColumnType::BigInt
        )
    }
}

/// Key role of a column within its table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyRole {
    #[default]
    Plain,
    /// Part of the table's unique key, generated and checked for collisions
    PrimaryKey,
    /// Copied from a parent row
    ForeignKey,
}

/// A `REFERENCES table(column)` target declared in DDL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: String,
    /// `None` when the DDL omits the column list, meaning the target's key
    pub column: Option<String>,
}

/// Column definition within a table
#[derive(Debug, Clone)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Classified type
    pub col_type: ColumnType,
    /// Type as written in the DDL, including length
    pub declared_type: String,
    /// Character length, integer digit count or decimal precision
    pub length: Option<u32>,
    /// Decimal scale
    pub scale: Option<u32>,
    /// Whether this column allows NULL values
    pub nullable: bool,
    pub role: KeyRole,
    /// Declared foreign key target, if any
    pub references: Option<ColumnRef>,
}

impl Column {
    pub fn new(name: impl Into<String>, col_type: ColumnType) -> Self {
        let declared_type = match &col_type {
            ColumnType::Other(raw) => raw.clone(),
            other => format!("{:?}", other).to_uppercase(),
        };
        Self {
            name: name.into(),
            col_type,
            declared_type,
            length: None,
            scale: None,
            nullable: true,
            role: KeyRole::Plain,
            references: None,
        }
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.role = KeyRole::PrimaryKey;
        self.nullable = false;
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.role = KeyRole::ForeignKey;
        self.references = Some(ColumnRef {
            table: table.into(),
            column: Some(column.into()),
        });
        self
    }

    /// Key columns must always carry a concrete value
    pub fn is_key(&self) -> bool {
        self.role != KeyRole::Plain
    }
}

/// Table definition: a name and its columns in declared order
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    /// Declared primary key column positions (ordered for composite keys)
    pub primary_key: Vec<usize>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    pub fn column(mut self, col: Column) -> Self {
        if col.role == KeyRole::PrimaryKey {
            self.primary_key.push(self.columns.len());
        }
        self.columns.push(col);
        self
    }

    /// Get a column by name (case-insensitive)
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Get a column's position by name (case-insensitive)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn is_pk_column(&self, idx: usize) -> bool {
        self.primary_key.contains(&idx)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_parsing() {
        assert_eq!(ColumnType::from_sql_type("INT"), ColumnType::Int);
        assert_eq!(ColumnType::from_sql_type("bigserial"), ColumnType::BigInt);
        assert_eq!(
            ColumnType::from_sql_type("character   varying"),
            ColumnType::VarChar
        );
        assert_eq!(
            ColumnType::from_sql_type("double precision"),
            ColumnType::Float
        );
        assert_eq!(ColumnType::from_sql_type("bpchar"), ColumnType::Char);
        assert_eq!(ColumnType::from_sql_type("TIMESTAMPTZ"), ColumnType::DateTime);
        assert_eq!(
            ColumnType::from_sql_type("geometry"),
            ColumnType::Other("geometry".to_string())
        );
    }

    #[test]
    fn test_table_builder() {
        let table = Table::new("orders")
            .column(Column::new("id", ColumnType::Int).primary_key())
            .column(Column::new("customer_id", ColumnType::Int).references("customers", "id"))
            .column(Column::new("note", ColumnType::VarChar).length(40));

        assert_eq!(table.primary_key, vec![0]);
        assert!(table.is_pk_column(0));
        assert_eq!(table.column_index("CUSTOMER_ID"), Some(1));
        assert!(!table.columns[0].nullable);
        assert_eq!(table.columns[1].role, KeyRole::ForeignKey);
        assert!(table.columns[2].nullable);
    }
}
