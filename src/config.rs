//! Generation settings.
//!
//! Settings come from three layers, lowest precedence first: built-in
//! defaults, an optional YAML file, then command-line flags. Directive strings
//! use the `a,b` / `Table=3` / `child=parent` forms in both places.

use crate::error::{Error, Result};
use crate::schema::ForeignMapEntry;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Root row count when nothing else is given
pub const DEFAULT_NUM_ROWS: usize = 10;

/// Resolved settings for one generation run
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Columns whose owner becomes the root table
    pub key_fields: Vec<String>,
    /// Rows generated for the root table
    pub num_rows: usize,
    /// Rows per parent row, by child table name
    pub multipliers: Vec<(String, usize)>,
    pub foreign_map: Vec<ForeignMapEntry>,
    /// `None` picks a random seed
    pub seed: Option<u64>,
    /// Probability of NULL for nullable plain columns
    pub null_rate: f64,
    /// Tables left out of the run
    pub exclude: Vec<String>,
    /// Upper end of the generated date range; today when unset
    pub reference_date: Option<NaiveDate>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            key_fields: Vec::new(),
            num_rows: DEFAULT_NUM_ROWS,
            multipliers: Vec::new(),
            foreign_map: Vec::new(),
            seed: None,
            null_rate: 0.0,
            exclude: Vec::new(),
            reference_date: None,
        }
    }
}

impl GenerateConfig {
    /// Overlay the values present in a YAML config file
    pub fn apply_yaml(&mut self, yaml: &GenerateYamlConfig) -> Result<()> {
        if !yaml.key_fields.is_empty() {
            self.key_fields = yaml.key_fields.clone();
        }
        if let Some(n) = &yaml.num_rows {
            self.num_rows = count_from_yaml("num_rows", n)?;
        }
        for (table, m) in &yaml.multipliers {
            let m = count_from_yaml(&format!("multiplier for '{}'", table), m)?;
            self.set_multiplier(table, m);
        }
        for (child, parent) in &yaml.foreign_map {
            self.foreign_map
                .push(format!("{}={}", child, parent).parse()?);
        }
        if yaml.seed.is_some() {
            self.seed = yaml.seed;
        }
        if let Some(rate) = yaml.null_rate {
            self.null_rate = rate;
        }
        self.exclude.extend(yaml.exclude.iter().cloned());
        if let Some(date) = &yaml.reference_date {
            self.reference_date = Some(parse_date(date)?);
        }
        Ok(())
    }

    /// Set or replace the multiplier for `table`
    pub fn set_multiplier(&mut self, table: &str, multiplier: usize) {
        match self
            .multipliers
            .iter_mut()
            .find(|(t, _)| t.eq_ignore_ascii_case(table))
        {
            Some(entry) => entry.1 = multiplier,
            None => self.multipliers.push((table.to_string(), multiplier)),
        }
    }

    /// Reject settings that cannot produce a run
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.null_rate) {
            return Err(Error::config(format!(
                "null_rate must be between 0.0 and 1.0, got {}",
                self.null_rate
            )));
        }
        if self.key_fields.is_empty() {
            return Err(Error::config("at least one key field is required"));
        }
        Ok(())
    }
}

/// YAML config file layout
///
/// ```yaml
/// schema_dir: ./schema
/// key_fields: [customer_id]
/// num_rows: 50
/// multipliers:
///   orders: 3
/// foreign_map:
///   orders.customer_id: customers.customer_id
/// seed: 42
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateYamlConfig {
    pub schema_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub dialect: Option<String>,
    pub key_fields: Vec<String>,
    /// Counts stay untyped so a bad value reports as a configuration error
    pub num_rows: Option<serde_yaml_ng::Value>,
    pub multipliers: BTreeMap<String, serde_yaml_ng::Value>,
    /// Child column -> parent column
    pub foreign_map: BTreeMap<String, String>,
    pub seed: Option<u64>,
    pub null_rate: Option<f64>,
    pub exclude: Vec<String>,
    /// `YYYY-MM-DD`
    pub reference_date: Option<String>,
}

impl GenerateYamlConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GenerateYamlConfig = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }
}

/// Split a comma-separated list, dropping empty items
pub fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Parse `Table=3,Other=2`
pub fn parse_multipliers(s: &str) -> Result<Vec<(String, usize)>> {
    parse_list(s)
        .iter()
        .map(|pair| {
            let (table, count) = pair.split_once('=').ok_or_else(|| {
                Error::config(format!("expected TABLE=COUNT in multipliers, got '{}'", pair))
            })?;
            let table = table.trim();
            if table.is_empty() {
                return Err(Error::config(format!("missing table name in '{}'", pair)));
            }
            let count = parse_count(&format!("multiplier for '{}'", table), count)?;
            Ok((table.to_string(), count))
        })
        .collect()
}

/// Parse `child_col=parent_col,...`
pub fn parse_foreign_map(s: &str) -> Result<Vec<ForeignMapEntry>> {
    parse_list(s).iter().map(|pair| pair.parse()).collect()
}

/// Parse a non-negative integer count
pub fn parse_count(label: &str, raw: &str) -> Result<usize> {
    let n: i64 = raw.trim().parse().map_err(|_| {
        Error::config(format!("{} must be a whole number, got '{}'", label, raw.trim()))
    })?;
    count_from_i64(label, n)
}

fn count_from_i64(label: &str, n: i64) -> Result<usize> {
    usize::try_from(n)
        .map_err(|_| Error::config(format!("{} must not be negative, got {}", label, n)))
}

fn count_from_yaml(label: &str, value: &serde_yaml_ng::Value) -> Result<usize> {
    use serde_yaml_ng::Value;

    match value {
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => count_from_i64(label, i),
            (None, Some(u)) => usize::try_from(u)
                .map_err(|_| Error::config(format!("{} is too large, got {}", label, u))),
            _ => Err(Error::config(format!(
                "{} must be a whole number, got {}",
                label, n
            ))),
        },
        Value::String(s) => parse_count(label, s),
        other => Err(Error::config(format!(
            "{} must be a whole number, got {:?}",
            label, other
        ))),
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| Error::config(format!("invalid date '{}': {}", raw, e)))
}
