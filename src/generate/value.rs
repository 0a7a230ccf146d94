//! Generated cell values and their SQL / JSON renderings.

use crate::writer::Dialect;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};
use std::fmt;

/// A single generated cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    /// Exact decimal text, e.g. `"1234.50"`
    Decimal(String),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

/// A row of generated data, aligned with the table's column order
pub type Row = Vec<Value>;

const DATE_FORMAT: &str = "%Y-%m-%d";
const SQL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const JSON_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const TIME_FORMAT: &str = "%H:%M:%S";

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Decimal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Render as a SQL literal for `dialect`
    pub fn to_sql(&self, dialect: Dialect) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(n) => format!("{:.2}", n),
            Value::Decimal(s) => s.clone(),
            Value::Bool(b) => match dialect {
                Dialect::Postgres => if *b { "TRUE" } else { "FALSE" }.to_string(),
                _ => if *b { "1" } else { "0" }.to_string(),
            },
            Value::Text(s) => quote_string(s, dialect),
            Value::Date(d) => format!("'{}'", d.format(DATE_FORMAT)),
            Value::DateTime(dt) => format!("'{}'", dt.format(SQL_DATETIME_FORMAT)),
            Value::Time(t) => format!("'{}'", t.format(TIME_FORMAT)),
        }
    }

    /// Convert to a JSON value. Temporal values and decimals become strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            other => serde_json::Value::String(other.to_string()),
        }
    }

    /// Identity used for key uniqueness; distinguishes `Int(5)` from `Text("5")`
    pub(crate) fn key_repr(&self) -> String {
        format!("{:?}", self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Decimal(s) | Value::Text(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::DateTime(dt) => write!(f, "{}", dt.format(JSON_DATETIME_FORMAT)),
            Value::Time(t) => write!(f, "{}", t.format(TIME_FORMAT)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Bool(b) => serializer.serialize_bool(*b),
            other => serializer.collect_str(other),
        }
    }
}

fn quote_string(s: &str, dialect: Dialect) -> String {
    match dialect {
        Dialect::MySql => format!("'{}'", escape_mysql_string(s)),
        Dialect::Postgres | Dialect::Sqlite => format!("'{}'", s.replace('\'', "''")),
        Dialect::Mssql => format!("N'{}'", s.replace('\'', "''")),
    }
}

fn escape_mysql_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_escaping_per_dialect() {
        let v = Value::Text("it's\n".to_string());
        assert_eq!(v.to_sql(Dialect::MySql), "'it\\'s\\n'");
        assert_eq!(v.to_sql(Dialect::Postgres), "'it''s\n'");
        assert_eq!(v.to_sql(Dialect::Mssql), "N'it''s\n'");
    }

    #[test]
    fn test_bool_and_temporal_literals() {
        assert_eq!(Value::Bool(true).to_sql(Dialect::Postgres), "TRUE");
        assert_eq!(Value::Bool(true).to_sql(Dialect::Sqlite), "1");

        let date = NaiveDate::from_ymd_opt(2021, 3, 4).unwrap();
        let dt = date.and_hms_opt(5, 6, 7).unwrap();
        assert_eq!(Value::Date(date).to_sql(Dialect::MySql), "'2021-03-04'");
        assert_eq!(
            Value::DateTime(dt).to_sql(Dialect::Postgres),
            "'2021-03-04 05:06:07'"
        );
        assert_eq!(
            Value::DateTime(dt).to_json(),
            serde_json::json!("2021-03-04T05:06:07")
        );
    }

    #[test]
    fn test_decimal_is_exact() {
        let v = Value::Decimal("10.50".to_string());
        assert_eq!(v.to_sql(Dialect::Postgres), "10.50");
        assert_eq!(v.to_json(), serde_json::json!("10.50"));
    }

    #[test]
    fn test_key_repr_distinguishes_types() {
        assert_ne!(
            Value::Int(5).key_repr(),
            Value::Text("5".to_string()).key_repr()
        );
    }
}
