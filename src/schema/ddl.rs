//! DDL parsing for schema extraction.
//!
//! Parses CREATE TABLE statements to extract:
//! - Column definitions with types, lengths and nullability
//! - Inline and table-level PRIMARY KEY constraints
//! - Inline REFERENCES and table-level FOREIGN KEY constraints

use super::{Column, ColumnRef, ColumnType, KeyRole, Table};
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Regex locating the start of every CREATE TABLE statement in a file
static CREATE_TABLE_START_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bCREATE\s+(?:(?:GLOBAL\s+|LOCAL\s+)?TEMP(?:ORARY)?\s+)?TABLE\b").unwrap()
});

/// Regex to extract table name from CREATE TABLE
/// Supports: `table` (MySQL), "table" (PostgreSQL), [table] (MSSQL), table (unquoted), schema.table
static CREATE_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)CREATE\s+(?:(?:GLOBAL\s+|LOCAL\s+)?TEMP(?:ORARY)?\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?"#)
        .unwrap()
});

/// Column name followed by the rest of the definition
static COLUMN_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)^\s*[\[`"]?([^\[\]`"\s,]+)[\]`"]?(?:\s+(.*))?$"#).unwrap());

/// Base type (one or two words) with an optional `(len)` or `(precision,scale)`
static COLUMN_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(character\s+varying|double\s+precision|[a-z_][a-z0-9_]*)\s*(?:\(([^)]*)\))?")
        .unwrap()
});

/// Regex for PRIMARY KEY constraint
/// Supports MSSQL CLUSTERED/NONCLUSTERED keywords: PRIMARY KEY CLUSTERED ([col])
static PRIMARY_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)PRIMARY\s+KEY\s*(?:CLUSTERED\s+|NONCLUSTERED\s+)?\(([^)]+)\)").unwrap()
});

/// Regex for inline PRIMARY KEY on column
static INLINE_PRIMARY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").unwrap());

/// Regex for FOREIGN KEY constraint; the referenced column list is optional
static FOREIGN_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)FOREIGN\s+KEY\s*\(([^)]+)\)\s*REFERENCES\s+(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?(?:\s*\(([^)]+)\))?"#,
    )
    .unwrap()
});

/// Regex for inline `REFERENCES table[(column)]` on a column
static INLINE_REFERENCES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\bREFERENCES\s+(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?(?:\s*\(([^)]+)\))?"#,
    )
    .unwrap()
});

static NOT_NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bNOT\s+NULL\b").unwrap());

static DEFAULT_NULL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bDEFAULT\s+NULL\b").unwrap());

static NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bNULL\b").unwrap());

/// Body entries that are table constraints rather than columns
const CONSTRAINT_PREFIXES: &[&str] = &[
    "PRIMARY KEY",
    "CONSTRAINT",
    "FOREIGN KEY",
    "KEY ",
    "INDEX ",
    "UNIQUE ",
    "UNIQUE(",
    "FULLTEXT ",
    "SPATIAL ",
    "CHECK ",
    "CHECK(",
    "EXCLUDE ",
];

/// Words that can follow a column name but are never a type
const NOT_A_TYPE: &[&str] = &[
    "PRIMARY",
    "NOT",
    "NULL",
    "REFERENCES",
    "DEFAULT",
    "UNIQUE",
    "CHECK",
    "CONSTRAINT",
];

/// Parse every CREATE TABLE statement found in `text`.
pub fn parse_tables(text: &str) -> Result<Vec<Table>> {
    let text = strip_comments(text);
    let starts: Vec<usize> = CREATE_TABLE_START_RE
        .find_iter(&text)
        .map(|m| m.start())
        .collect();

    let mut tables = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        tables.push(parse_table(&text[start..end])?);
    }
    Ok(tables)
}

/// Parse a single CREATE TABLE definition into a [`Table`].
pub fn parse_table(stmt: &str) -> Result<Table> {
    let stmt = strip_comments(stmt);
    let name = extract_create_table_name(&stmt)
        .ok_or_else(|| Error::schema("<unknown>", "no CREATE TABLE statement found"))?;
    let body = extract_table_body(&stmt)
        .ok_or_else(|| Error::schema(&name, "missing or unbalanced column list"))?;

    let mut table = Table::new(name);
    let mut constraints = Vec::new();

    for part in split_table_body(body) {
        if part.is_empty() {
            continue;
        }
        if is_table_constraint(&part) {
            constraints.push(part);
            continue;
        }

        let col = parse_column_def(&table.name, &part)?;
        if table.has_column(&col.name) {
            return Err(Error::schema(
                &table.name,
                format!("duplicate column '{}'", col.name),
            ));
        }
        table = table.column(col);
    }

    // Table-level constraints may precede the columns they name
    for constraint in &constraints {
        apply_table_constraint(&mut table, constraint)?;
    }

    if table.columns.is_empty() {
        return Err(Error::schema(&table.name, "table defines no columns"));
    }

    Ok(table)
}

/// Extract table name from CREATE TABLE statement
pub fn extract_create_table_name(stmt: &str) -> Option<String> {
    CREATE_TABLE_NAME_RE
        .captures(stmt)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Remove `--` and `/* */` comments outside quoted literals.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(ch) = chars.next() {
        if in_string {
            in_string = ch != '\'';
            out.push(ch);
            continue;
        }
        match ch {
            '\'' => {
                in_string = true;
                out.push(ch);
            }
            '-' if chars.peek() == Some(&'-') => {
                while chars.next_if(|&c| c != '\n').is_some() {}
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => out.push(ch),
        }
    }

    out
}

/// Whether a body entry is a table constraint. `KEY` and `INDEX` are also
/// legal column names, so those entries count as columns when a type follows.
fn is_table_constraint(part: &str) -> bool {
    let upper = part.to_uppercase();
    if !CONSTRAINT_PREFIXES.iter().any(|p| upper.starts_with(p)) {
        return false;
    }
    if !(upper.starts_with("KEY ") || upper.starts_with("INDEX ")) {
        return true;
    }

    let rest = part.split_once(char::is_whitespace).map_or("", |(_, r)| r.trim_start());
    match COLUMN_TYPE_RE.captures(rest) {
        Some(caps) => {
            let sized = caps.get(2).map_or(true, |m| {
                m.as_str()
                    .chars()
                    .all(|c| c.is_ascii_digit() || c == ',' || c.is_whitespace())
                    || m.as_str().trim().eq_ignore_ascii_case("max")
            });
            matches!(ColumnType::from_sql_type(&caps[1]), ColumnType::Other(_)) || !sized
        }
        None => true,
    }
}

/// Extract the text between the first `(` and its matching `)`,
/// ignoring parentheses inside quoted literals.
fn extract_table_body(stmt: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;

    for (i, ch) in stmt.char_indices() {
        match ch {
            '\'' => in_string = !in_string,
            _ if in_string => {}
            '(' => {
                if depth == 0 {
                    start = Some(i + 1);
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| &stmt[s..i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Split a table body on top-level commas, respecting nested parentheses
/// and quoted literals.
pub fn split_table_body(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut last = 0;

    for (i, ch) in body.char_indices() {
        match ch {
            '\'' => in_string = !in_string,
            _ if in_string => {}
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(body[last..i].trim().to_string());
                last = i + 1;
            }
            _ => {}
        }
    }

    let tail = body[last..].trim();
    if !tail.is_empty() {
        parts.push(tail.to_string());
    }
    parts
}

/// Parse one column definition, including its inline key markers.
fn parse_column_def(table: &str, def: &str) -> Result<Column> {
    let caps = COLUMN_NAME_RE
        .captures(def)
        .ok_or_else(|| Error::schema(table, format!("malformed column definition '{}'", def)))?;
    let name = caps[1].to_string();
    let rest = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");

    let type_caps = COLUMN_TYPE_RE
        .captures(rest)
        .filter(|c| !NOT_A_TYPE.contains(&c[1].to_uppercase().as_str()))
        .ok_or_else(|| Error::schema(table, format!("column '{}' has no parseable type", name)))?;

    let base_type = &type_caps[1];
    let (length, scale) = parse_lengths(table, &name, type_caps.get(2).map(|m| m.as_str()))?;
    let col_type = ColumnType::from_sql_type(base_type);
    let modifiers = &rest[type_caps.get(0).map_or(0, |m| m.end())..];

    if col_type == ColumnType::Decimal {
        if let (Some(precision), Some(scale)) = (length, scale) {
            if scale > precision {
                return Err(Error::schema(
                    table,
                    format!(
                        "column '{}' has scale {} larger than precision {}",
                        name, scale, precision
                    ),
                ));
            }
        }
    }

    let is_pk = INLINE_PRIMARY_KEY_RE.is_match(modifiers);
    let not_null = NOT_NULL_RE.is_match(modifiers);
    let without_defaults = DEFAULT_NULL_RE.replace_all(modifiers, "");
    let explicit_null = NULL_RE.is_match(&NOT_NULL_RE.replace_all(&without_defaults, ""));
    let references = INLINE_REFERENCES_RE.captures(modifiers).map(|c| ColumnRef {
        table: c[1].to_string(),
        column: c
            .get(2)
            .and_then(|m| parse_column_list(m.as_str()).into_iter().next()),
    });

    let conflict = if is_pk && references.is_some() {
        Some("both PRIMARY KEY and REFERENCES")
    } else if is_pk && explicit_null {
        Some("both PRIMARY KEY and NULL")
    } else if not_null && explicit_null {
        Some("both NULL and NOT NULL")
    } else {
        None
    };
    if let Some(conflict) = conflict {
        return Err(Error::schema(
            table,
            format!("column '{}' is declared {}", name, conflict),
        ));
    }

    let role = if is_pk {
        KeyRole::PrimaryKey
    } else if references.is_some() {
        KeyRole::ForeignKey
    } else {
        KeyRole::Plain
    };

    Ok(Column {
        name,
        col_type,
        declared_type: type_caps[0].trim().to_string(),
        length,
        scale,
        nullable: !(not_null || is_pk),
        role,
        references,
    })
}

/// Parse `(len)` or `(precision,scale)`; `max` means unbounded.
fn parse_lengths(table: &str, column: &str, raw: Option<&str>) -> Result<(Option<u32>, Option<u32>)> {
    let Some(raw) = raw else {
        return Ok((None, None));
    };
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let invalid = || {
        Error::schema(
            table,
            format!("column '{}' has invalid length '({})'", column, raw),
        )
    };

    if parts.len() == 1 && parts[0].eq_ignore_ascii_case("max") {
        return Ok((None, None));
    }
    if parts.len() > 2 {
        return Err(invalid());
    }

    let length = parts[0]
        .parse::<u32>()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(invalid)?;
    let scale = match parts.get(1) {
        Some(s) => Some(s.parse::<u32>().map_err(|_| invalid())?),
        None => None,
    };
    Ok((Some(length), scale))
}

/// Apply a table-level PRIMARY KEY or FOREIGN KEY constraint to its columns.
fn apply_table_constraint(table: &mut Table, constraint: &str) -> Result<()> {
    let table_name = table.name.clone();
    let unknown = |kind: &str, col: &str| {
        Error::schema(
            &table_name,
            format!("{} constraint names unknown column '{}'", kind, col),
        )
    };

    if let Some(caps) = PRIMARY_KEY_RE.captures(constraint) {
        for col_name in parse_column_list(&caps[1]) {
            let idx = table
                .column_index(&col_name)
                .ok_or_else(|| unknown("PRIMARY KEY", &col_name))?;
            if !table.primary_key.contains(&idx) {
                table.primary_key.push(idx);
            }
            let col = &mut table.columns[idx];
            if col.role == KeyRole::Plain {
                col.role = KeyRole::PrimaryKey;
            }
            col.nullable = false;
        }
    }

    for caps in FOREIGN_KEY_RE.captures_iter(constraint) {
        let local = parse_column_list(&caps[1]);
        let ref_table = caps[2].to_string();
        let ref_cols = caps
            .get(3)
            .map(|m| parse_column_list(m.as_str()))
            .unwrap_or_default();

        if !ref_cols.is_empty() && ref_cols.len() != local.len() {
            return Err(Error::schema(
                &table_name,
                format!(
                    "FOREIGN KEY ({}) references {} column(s) of '{}'",
                    local.join(", "),
                    ref_cols.len(),
                    ref_table
                ),
            ));
        }

        for (i, col_name) in local.iter().enumerate() {
            let idx = table
                .column_index(col_name)
                .ok_or_else(|| unknown("FOREIGN KEY", col_name))?;
            let col = &mut table.columns[idx];
            col.role = KeyRole::ForeignKey;
            col.references = Some(ColumnRef {
                table: ref_table.clone(),
                column: ref_cols.get(i).cloned(),
            });
        }
    }

    Ok(())
}

/// Parse a comma-separated column list, stripping quotes (backticks, double quotes, brackets)
pub fn parse_column_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|c| {
            c.trim()
                .trim_matches(|ch| matches!(ch, '`' | '"' | '[' | ']'))
                .to_string()
        })
        .filter(|c| !c.is_empty())
        .collect()
}
