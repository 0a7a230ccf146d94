//! Fixture generation.
//!
//! This module provides:
//! - Per-column value generation
//! - Composite key uniqueness tracking
//! - Row synthesis for the root table and its descendants
//! - Dataset assembly in parent-before-child order

mod dataset;
mod faker;
mod keys;
mod synth;
mod value;

pub use dataset::{Dataset, DatasetAssembler, PlannedTable, TableData};
pub use faker::ValueGenerator;
pub use keys::KeyRegistry;
pub use synth::{ProgressFn, RowSynthesizer, MAX_KEY_ATTEMPTS};
pub use value::{Row, Value};

use crate::config::GenerateConfig;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Build a deterministic assembler for `config` from `seed`
pub fn seeded_assembler(config: &GenerateConfig, seed: u64) -> DatasetAssembler<ChaCha8Rng> {
    let mut values =
        ValueGenerator::new(ChaCha8Rng::seed_from_u64(seed)).with_null_rate(config.null_rate);
    if let Some(date) = config.reference_date {
        values = values.with_reference_date(date);
    }
    DatasetAssembler::new(RowSynthesizer::new(values), config.num_rows)
        .with_multipliers(&config.multipliers)
}
