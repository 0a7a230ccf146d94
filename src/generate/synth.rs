//! Row synthesis for parent and child tables.

use super::faker::ValueGenerator;
use super::keys::KeyRegistry;
use super::value::Row;
use crate::error::{Error, Result};
use crate::schema::{KeyMapping, Table};
use rand::Rng;
use tracing::debug;

/// Attempts per row before a unique key is declared exhausted
pub const MAX_KEY_ATTEMPTS: usize = 200;

/// Row progress callback: `(table, rows_done, rows_total)`
pub type ProgressFn = Box<dyn Fn(&str, u64, u64)>;

/// Produces the rows of one table at a time
pub struct RowSynthesizer<R: Rng> {
    values: ValueGenerator<R>,
    max_attempts: usize,
    progress: Option<ProgressFn>,
}

impl<R: Rng> RowSynthesizer<R> {
    pub fn new(values: ValueGenerator<R>) -> Self {
        Self {
            values,
            max_attempts: MAX_KEY_ATTEMPTS,
            progress: None,
        }
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Generate `num_rows` independent rows for the root table.
    ///
    /// Each column set in `unique_keys` stays unique across the result.
    pub fn synthesize_parent(
        &mut self,
        table: &Table,
        unique_keys: &[Vec<usize>],
        num_rows: usize,
    ) -> Result<Vec<Row>> {
        let copied = vec![false; table.columns.len()];
        let mut registries = registries_for(unique_keys);
        let mut rows = Vec::with_capacity(num_rows);

        for _ in 0..num_rows {
            let mut row = table
                .columns
                .iter()
                .map(|col| self.values.generate(&table.name, col))
                .collect::<Result<Row>>()?;
            self.enforce_unique(table, &mut row, &copied, &mut registries)?;
            rows.push(row);
            self.report(&table.name, rows.len(), num_rows);
        }

        Ok(rows)
    }

    /// Generate `multiplier` rows per parent row, copying mapped columns from
    /// the parent and generating everything else.
    pub fn synthesize_child(
        &mut self,
        table: &Table,
        unique_keys: &[Vec<usize>],
        parent_rows: &[Row],
        mappings: &[KeyMapping],
        multiplier: usize,
    ) -> Result<Vec<Row>> {
        let mut copied = vec![false; table.columns.len()];
        for m in mappings {
            copied[m.child_column] = true;
        }

        let total = parent_rows.len().saturating_mul(multiplier);
        let mut registries = registries_for(unique_keys);
        let mut rows = Vec::with_capacity(total);

        for parent in parent_rows {
            for _ in 0..multiplier {
                let mut row: Row = Vec::with_capacity(table.columns.len());
                for (idx, col) in table.columns.iter().enumerate() {
                    let value = match mappings.iter().find(|m| m.child_column == idx) {
                        Some(m) => parent[m.parent_column].clone(),
                        None => self.values.generate(&table.name, col)?,
                    };
                    row.push(value);
                }
                self.enforce_unique(table, &mut row, &copied, &mut registries)?;
                rows.push(row);
                self.report(&table.name, rows.len(), total);
            }
        }

        Ok(rows)
    }

    /// Regenerate the non-copied columns of colliding keys until every key of
    /// the row is new, then register it.
    fn enforce_unique(
        &mut self,
        table: &Table,
        row: &mut Row,
        copied: &[bool],
        registries: &mut [KeyRegistry],
    ) -> Result<()> {
        for attempt in 1..=self.max_attempts {
            let Some(reg) = registries.iter().find(|r| r.contains(row)) else {
                for reg in registries.iter_mut() {
                    reg.insert(row);
                }
                return Ok(());
            };

            let regenerable: Vec<usize> = reg
                .columns()
                .iter()
                .copied()
                .filter(|&i| !copied[i])
                .collect();
            if regenerable.is_empty() || attempt == self.max_attempts {
                return Err(exhausted(table, reg.columns(), attempt));
            }

            debug!(table = %table.name, attempt, "key collision, regenerating");
            for idx in regenerable {
                row[idx] = self.values.generate(&table.name, &table.columns[idx])?;
            }
        }

        // Only reachable with a zero attempt budget
        match registries.first() {
            Some(reg) => Err(exhausted(table, reg.columns(), 0)),
            None => Ok(()),
        }
    }

    fn report(&self, table: &str, done: usize, total: usize) {
        if let Some(progress) = &self.progress {
            progress(table, done as u64, total as u64);
        }
    }
}

fn registries_for(unique_keys: &[Vec<usize>]) -> Vec<KeyRegistry> {
    unique_keys
        .iter()
        .filter(|key| !key.is_empty())
        .map(|key| KeyRegistry::new(key.clone()))
        .collect()
}

fn exhausted(table: &Table, columns: &[usize], attempts: usize) -> Error {
    let names: Vec<&str> = columns
        .iter()
        .map(|&i| table.columns[i].name.as_str())
        .collect();
    Error::KeyExhaustion {
        table: table.name.clone(),
        columns: names.join(", "),
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnType};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn synth() -> RowSynthesizer<ChaCha8Rng> {
        RowSynthesizer::new(ValueGenerator::new(ChaCha8Rng::seed_from_u64(1)))
    }

    #[test]
    fn test_parent_keys_are_unique() {
        let table = Table::new("codes")
            .column(Column::new("code", ColumnType::Int).length(2).primary_key())
            .column(Column::new("label", ColumnType::VarChar).length(10));

        let rows = synth().synthesize_parent(&table, &[vec![0]], 90).unwrap();
        assert_eq!(rows.len(), 90);
        let mut codes: Vec<i64> = rows.iter().map(|r| r[0].as_i64().unwrap()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 90);
    }

    #[test]
    fn test_key_exhaustion() {
        let table =
            Table::new("flags").column(Column::new("flag", ColumnType::Bool).primary_key());

        match synth().synthesize_parent(&table, &[vec![0]], 3) {
            Err(Error::KeyExhaustion {
                table,
                columns,
                attempts,
            }) => {
                assert_eq!(table, "flags");
                assert_eq!(columns, "flag");
                assert_eq!(attempts, MAX_KEY_ATTEMPTS);
            }
            other => panic!("expected KeyExhaustion, got {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn test_child_copies_mapped_columns() {
        let parent = Table::new("customers")
            .column(Column::new("id", ColumnType::Int).primary_key());
        let child = Table::new("orders")
            .column(Column::new("order_id", ColumnType::Int).primary_key())
            .column(Column::new("customer_id", ColumnType::Int));

        let mut s = synth();
        let parents = s.synthesize_parent(&parent, &[vec![0]], 4).unwrap();
        let mapping = KeyMapping {
            child_column: 1,
            parent_column: 0,
        };
        let rows = s
            .synthesize_child(&child, &[vec![0]], &parents, &[mapping], 3)
            .unwrap();

        assert_eq!(rows.len(), 12);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row[1], parents[i / 3][0]);
        }
    }

    #[test]
    fn test_copied_key_collision_fails_fast() {
        let parent = Table::new("customers")
            .column(Column::new("id", ColumnType::Int).primary_key());
        let child = Table::new("profiles")
            .column(Column::new("customer_id", ColumnType::Int).primary_key());

        let mut s = synth();
        let parents = s.synthesize_parent(&parent, &[vec![0]], 2).unwrap();
        let mapping = KeyMapping {
            child_column: 0,
            parent_column: 0,
        };
        let err = s
            .synthesize_child(&child, &[vec![0]], &parents, &[mapping], 2)
            .unwrap_err();
        assert!(matches!(err, Error::KeyExhaustion { attempts: 1, .. }));
    }
}
