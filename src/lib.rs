//! Relationally consistent test data from SQL `CREATE TABLE` schemas.
//!
//! Tables are parsed from a schema directory, linked into a parent/child
//! graph rooted at the table owning the key fields, filled with generated
//! rows in parent-before-child order and written out as INSERT statements
//! and JSON.

pub mod config;
pub mod error;
pub mod generate;
pub mod schema;
pub mod writer;

pub use error::{Error, Result};
