//! Error type shared by schema parsing, graph construction and generation.
//!
//! Every variant is a configuration or input problem; nothing here is
//! transient, so callers abort the run instead of retrying.

use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A table definition could not be parsed
    #[error("schema parse error in table '{table}': {message}")]
    SchemaParse { table: String, message: String },

    /// Key fields matched no table or more than one table
    #[error("cannot determine parent table for key fields [{key_fields}]: {message}")]
    AmbiguousParent { key_fields: String, message: String },

    /// A foreign-map column could not be resolved to exactly one table
    #[error("unknown column '{column}' in foreign map: {message}")]
    UnknownColumn { column: String, message: String },

    /// Derived relations do not form a tree rooted at the parent
    #[error("cyclic or non-tree dependency involving table(s) {tables}")]
    CyclicDependency { tables: String },

    /// A declared column type has no value generator
    #[error("unsupported type '{declared}' for column '{table}.{column}'")]
    UnsupportedType {
        table: String,
        column: String,
        declared: String,
    },

    /// Unique key values ran out within the retry budget
    #[error(
        "could not generate a unique key ({columns}) for table '{table}' after {attempts} attempts; \
         the declared length or range is too small for the requested row count"
    )]
    KeyExhaustion {
        table: String,
        columns: String,
        attempts: usize,
    },

    /// Row counts, multipliers or directives are invalid
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl Error {
    pub(crate) fn schema(table: impl Into<String>, message: impl Into<String>) -> Self {
        Error::SchemaParse {
            table: table.into(),
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration(message.into())
    }
}
