//! Dataset assembly: drives the synthesizer over the relationship graph.

use super::synth::{ProgressFn, RowSynthesizer};
use super::value::{Row, Value};
use crate::error::{Error, Result};
use crate::schema::{RelationshipGraph, TableId};
use ahash::AHashMap;
use rand::Rng;
use tracing::info;

/// Generated data for a single table
#[derive(Debug, Clone)]
pub struct TableData {
    pub table_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl TableData {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
    }

    /// Value of `column` in row `row`
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// All values of `column`, in row order
    pub fn column_values(&self, column: &str) -> Vec<&Value> {
        match self.column_index(column) {
            Some(idx) => self.rows.iter().map(|r| &r[idx]).collect(),
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// All generated tables, in generation order (parents before children)
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub tables: Vec<TableData>,
}

impl Dataset {
    /// Look up a table by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&TableData> {
        self.tables
            .iter()
            .find(|t| t.table_name.eq_ignore_ascii_case(name))
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableData> {
        self.tables.iter()
    }
}

/// One step of the generation plan
#[derive(Debug, Clone)]
pub struct PlannedTable {
    pub id: TableId,
    pub table_name: String,
    pub parent: Option<String>,
    /// Rows per parent row; `None` for the root table
    pub multiplier: Option<usize>,
    pub rows: usize,
}

/// Generates a complete [`Dataset`] for a [`RelationshipGraph`].
pub struct DatasetAssembler<R: Rng> {
    synth: RowSynthesizer<R>,
    num_rows: usize,
    /// Lower-cased table name -> multiplier
    multipliers: AHashMap<String, usize>,
}

impl<R: Rng> DatasetAssembler<R> {
    pub fn new(synth: RowSynthesizer<R>, num_rows: usize) -> Self {
        Self {
            synth,
            num_rows,
            multipliers: AHashMap::new(),
        }
    }

    /// Set the rows-per-parent-row count for `table`
    pub fn multiplier(mut self, table: &str, multiplier: usize) -> Self {
        self.multipliers.insert(table.to_lowercase(), multiplier);
        self
    }

    pub fn with_multipliers<'a>(
        mut self,
        multipliers: impl IntoIterator<Item = &'a (String, usize)>,
    ) -> Self {
        for (table, m) in multipliers {
            self.multipliers.insert(table.to_lowercase(), *m);
        }
        self
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.synth = self.synth.with_progress(progress);
        self
    }

    /// Validate the multipliers against `graph` and compute the expected row
    /// count of every table, in generation order.
    pub fn plan(&self, graph: &RelationshipGraph) -> Result<Vec<PlannedTable>> {
        for (name, _) in sorted(&self.multipliers) {
            let id = graph.table_id(name).ok_or_else(|| {
                Error::config(format!("multiplier given for unknown table '{}'", name))
            })?;
            if graph.parent(id).is_none() {
                return Err(Error::config(format!(
                    "multiplier given for '{}', which has no parent table; \
                     its row count comes from num_rows",
                    graph.table_name(id)
                )));
            }
        }

        let mut rows_by_id: AHashMap<TableId, usize> = AHashMap::new();
        let mut plan = Vec::with_capacity(graph.len());
        for &id in graph.order() {
            let name = graph.table_name(id);
            let step = match graph.parent(id) {
                None => PlannedTable {
                    id,
                    table_name: name.to_string(),
                    parent: None,
                    multiplier: None,
                    rows: self.num_rows,
                },
                Some(parent) => {
                    let multiplier = self.multiplier_for(name);
                    let parent_rows = rows_by_id.get(&parent).copied().unwrap_or(0);
                    let rows = parent_rows.checked_mul(multiplier).ok_or_else(|| {
                        Error::config(format!("row count for '{}' overflows", name))
                    })?;
                    PlannedTable {
                        id,
                        table_name: name.to_string(),
                        parent: Some(graph.table_name(parent).to_string()),
                        multiplier: Some(multiplier),
                        rows,
                    }
                }
            };
            rows_by_id.insert(id, step.rows);
            plan.push(step);
        }
        Ok(plan)
    }

    /// Generate every table in topological order.
    ///
    /// Nothing is returned on failure; a partial dataset is never exposed.
    pub fn assemble(&mut self, graph: &RelationshipGraph) -> Result<Dataset> {
        let plan = self.plan(graph)?;
        info!(
            root = %graph.root_table().name,
            tables = plan.len(),
            rows = plan.iter().map(|p| p.rows).sum::<usize>(),
            "generating dataset"
        );

        let mut generated: AHashMap<TableId, usize> = AHashMap::new();
        let mut tables: Vec<TableData> = Vec::with_capacity(plan.len());

        for step in &plan {
            let table = graph.table(step.id);
            let unique_keys = graph.unique_keys(step.id);

            let rows = match graph.parent(step.id) {
                None => self
                    .synth
                    .synthesize_parent(table, unique_keys, self.num_rows)?,
                Some(parent) => {
                    let parent_rows = generated
                        .get(&parent)
                        .map(|&i| tables[i].rows.as_slice())
                        .unwrap_or(&[]);
                    self.synth.synthesize_child(
                        table,
                        unique_keys,
                        parent_rows,
                        graph.mappings(step.id),
                        step.multiplier.unwrap_or(1),
                    )?
                }
            };

            info!(
                table = %table.name,
                rows = rows.len(),
                parent = step.parent.as_deref().unwrap_or("-"),
                "generated table"
            );
            generated.insert(step.id, tables.len());
            tables.push(TableData {
                table_name: table.name.clone(),
                columns: table.column_names(),
                rows,
            });
        }

        Ok(Dataset { tables })
    }

    fn multiplier_for(&self, table: &str) -> usize {
        self.multipliers
            .get(&table.to_lowercase())
            .copied()
            .unwrap_or(1)
    }
}

fn sorted(map: &AHashMap<String, usize>) -> Vec<(&String, &usize)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort();
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::ValueGenerator;
    use crate::schema::{Column, ColumnType, ForeignMapEntry, Table};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn graph() -> RelationshipGraph {
        let customers = Table::new("customers")
            .column(Column::new("id", ColumnType::Int).primary_key())
            .column(Column::new("email", ColumnType::VarChar).length(60));
        let orders = Table::new("orders")
            .column(Column::new("order_id", ColumnType::Int).primary_key())
            .column(Column::new("customer_id", ColumnType::Int));
        let map: Vec<ForeignMapEntry> = vec!["customer_id=id".parse().unwrap()];
        RelationshipGraph::build(vec![customers, orders], &["id".to_string()], &map).unwrap()
    }

    fn assembler(num_rows: usize) -> DatasetAssembler<ChaCha8Rng> {
        let values = ValueGenerator::new(ChaCha8Rng::seed_from_u64(42));
        DatasetAssembler::new(RowSynthesizer::new(values), num_rows)
    }

    #[test]
    fn test_plan_counts() {
        let plan = assembler(5).multiplier("Orders", 3).plan(&graph()).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].rows, 5);
        assert_eq!(plan[1].rows, 15);
        assert_eq!(plan[1].parent.as_deref(), Some("customers"));
    }

    #[test]
    fn test_multiplier_on_root_is_rejected() {
        let err = assembler(5)
            .multiplier("customers", 2)
            .plan(&graph())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_assemble_is_reproducible() {
        let g = graph();
        let a = assembler(4).multiplier("orders", 2).assemble(&g).unwrap();
        let b = assembler(4).multiplier("orders", 2).assemble(&g).unwrap();
        assert_eq!(a.tables[1].rows, b.tables[1].rows);
        assert_eq!(a.total_rows(), 12);
    }
}
