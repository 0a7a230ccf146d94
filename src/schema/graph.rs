//! Relationship graph for fixture generation.
//!
//! Provides:
//! - Root (parent) table resolution from the key-field list
//! - Key mappings from the foreign-map directive and declared REFERENCES
//! - Topological generation order with cycle and non-tree detection

use super::{KeyRole, Table, TableId};
use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// A column named in a directive, optionally qualified as `table.column`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub table: Option<String>,
    pub column: String,
}

impl FromStr for ColumnSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let unquote = |p: &str| {
            p.trim()
                .trim_matches(|ch| matches!(ch, '`' | '"' | '[' | ']'))
                .to_string()
        };
        let spec = match s.trim().split_once('.') {
            Some((table, column)) => ColumnSpec {
                table: Some(unquote(table)),
                column: unquote(column),
            },
            None => ColumnSpec {
                table: None,
                column: unquote(s),
            },
        };
        if spec.column.is_empty() || spec.table.as_deref() == Some("") {
            return Err(Error::config(format!("invalid column reference '{}'", s)));
        }
        Ok(spec)
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

/// One `child_column=parent_column` foreign-map directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignMapEntry {
    pub child: ColumnSpec,
    pub parent: ColumnSpec,
}

impl FromStr for ForeignMapEntry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (child, parent) = s.split_once('=').ok_or_else(|| {
            Error::config(format!(
                "foreign map entry '{}' must look like child_col=parent_col",
                s.trim()
            ))
        })?;
        Ok(ForeignMapEntry {
            child: child.parse()?,
            parent: parent.parse()?,
        })
    }
}

/// A child column that mirrors a parent column's value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMapping {
    /// Position of the column in the child table
    pub child_column: usize,
    /// Position of the referenced column in the parent table
    pub parent_column: usize,
}

/// Parent/child structure of the tables taking part in one generation run.
///
/// The root table's rows are generated independently; every other table has
/// exactly one parent and is generated per parent row, with its mapped columns
/// copied from that row.
#[derive(Debug)]
pub struct RelationshipGraph {
    tables: Vec<Table>,
    root: TableId,
    /// Root columns named by the key-field list
    key_fields: Vec<usize>,
    parents: Vec<Option<TableId>>,
    children: Vec<Vec<TableId>>,
    mappings: Vec<Vec<KeyMapping>>,
    /// Column sets that must stay unique within each table
    unique_keys: Vec<Vec<Vec<usize>>>,
    order: Vec<TableId>,
}

impl RelationshipGraph {
    /// Build the graph from parsed tables and the two relationship directives.
    pub fn build(
        mut tables: Vec<Table>,
        key_fields: &[String],
        foreign_map: &[ForeignMapEntry],
    ) -> Result<Self> {
        if tables.is_empty() {
            return Err(Error::config("no tables to generate"));
        }
        for (i, table) in tables.iter().enumerate() {
            if tables[..i]
                .iter()
                .any(|t| t.name.eq_ignore_ascii_case(&table.name))
            {
                return Err(Error::schema(&table.name, "table is defined more than once"));
            }
        }

        let root = resolve_root(&tables, key_fields)?;
        let key_field_idx: Vec<usize> = key_fields
            .iter()
            .filter_map(|k| tables[root.index()].column_index(k))
            .collect();
        for &idx in &key_field_idx {
            let col = &mut tables[root.index()].columns[idx];
            col.role = KeyRole::PrimaryKey;
            col.nullable = false;
        }

        let n = tables.len();
        let mut mapped: Vec<Vec<(TableId, KeyMapping)>> = vec![Vec::new(); n];

        for entry in foreign_map {
            let (parent_id, parent_column) = resolve_parent_column(&tables, root, &entry.parent)?;
            let (child_id, child_column) = resolve_child_column(&tables, parent_id, &entry.child)?;
            if child_id == root {
                return Err(Error::CyclicDependency {
                    tables: format!(
                        "'{}' (the parent table cannot copy keys from '{}')",
                        tables[root.index()].name,
                        tables[parent_id.index()].name
                    ),
                });
            }
            if mapped[child_id.index()]
                .iter()
                .any(|(_, m)| m.child_column == child_column)
            {
                return Err(Error::config(format!(
                    "column '{}.{}' is mapped more than once",
                    tables[child_id.index()].name,
                    tables[child_id.index()].columns[child_column].name
                )));
            }
            debug!(
                child = %tables[child_id.index()].name,
                child_column = %tables[child_id.index()].columns[child_column].name,
                parent = %tables[parent_id.index()].name,
                parent_column = %tables[parent_id.index()].columns[parent_column].name,
                "foreign map entry resolved"
            );
            mapped[child_id.index()].push((
                parent_id,
                KeyMapping {
                    child_column,
                    parent_column,
                },
            ));
        }

        // An explicit entry wins over a declared REFERENCES on the same column
        for id in (0..n).map(|i| TableId(i as u32)) {
            if id == root {
                continue;
            }
            for (parent_id, mapping) in declared_mappings(&tables, root, &key_field_idx, id)? {
                let explicit = &mapped[id.index()];
                if explicit
                    .iter()
                    .any(|(_, m)| m.child_column == mapping.child_column)
                {
                    continue;
                }
                mapped[id.index()].push((parent_id, mapping));
            }
        }

        let mut parents: Vec<Option<TableId>> = vec![None; n];
        let mut children: Vec<Vec<TableId>> = vec![Vec::new(); n];
        let mut mappings: Vec<Vec<KeyMapping>> = vec![Vec::new(); n];

        for (i, entries) in mapped.into_iter().enumerate() {
            let child_id = TableId(i as u32);
            let mut distinct: Vec<TableId> = entries.iter().map(|(p, _)| *p).collect();
            distinct.sort();
            distinct.dedup();

            match distinct.as_slice() {
                [] if child_id == root => {}
                [] => {
                    return Err(Error::config(format!(
                        "table '{}' has no foreign-key mapping to a parent table; \
                         add a foreign map entry for it or exclude it",
                        tables[i].name
                    )))
                }
                [parent_id] if *parent_id == child_id => {
                    return Err(Error::CyclicDependency {
                        tables: format!("'{}' (references itself)", tables[i].name),
                    })
                }
                [parent_id] => {
                    parents[i] = Some(*parent_id);
                    children[parent_id.index()].push(child_id);
                }
                many => {
                    let names: Vec<&str> =
                        many.iter().map(|p| tables[p.index()].name.as_str()).collect();
                    return Err(Error::CyclicDependency {
                        tables: format!(
                            "'{}' (copies keys from more than one table: {})",
                            tables[i].name,
                            names.join(", ")
                        ),
                    });
                }
            }

            for (parent_id, mapping) in entries {
                tables[parent_id.index()].columns[mapping.parent_column].nullable = false;
                tables[i].columns[mapping.child_column].role = KeyRole::ForeignKey;
                mappings[i].push(mapping);
            }
        }

        let order = topo_sort(&tables, root, &parents, &children)?;

        let unique_keys = tables
            .iter()
            .enumerate()
            .map(|(i, table)| {
                let mut keys = Vec::new();
                if i == root.index() && !key_field_idx.is_empty() {
                    keys.push(key_field_idx.clone());
                }
                let mut declared = table.primary_key.clone();
                declared.sort_unstable();
                let mut fields = key_field_idx.clone();
                fields.sort_unstable();
                if !declared.is_empty() && (i != root.index() || declared != fields) {
                    keys.push(table.primary_key.clone());
                }
                keys
            })
            .collect();

        Ok(Self {
            tables,
            root,
            key_fields: key_field_idx,
            parents,
            children,
            mappings,
            unique_keys,
            order,
        })
    }

    /// Get the number of tables in the graph
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// The table whose rows are generated independently
    pub fn root(&self) -> TableId {
        self.root
    }

    pub fn root_table(&self) -> &Table {
        &self.tables[self.root.index()]
    }

    /// Root columns named by the key-field list
    pub fn key_fields(&self) -> &[usize] {
        &self.key_fields
    }

    pub fn table(&self, id: TableId) -> &Table {
        &self.tables[id.index()]
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table_name(&self, id: TableId) -> &str {
        &self.tables[id.index()].name
    }

    /// Look up a table by name (case-insensitive)
    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.tables
            .iter()
            .position(|t| t.name.eq_ignore_ascii_case(name))
            .map(|i| TableId(i as u32))
    }

    /// The table whose rows drive generation of `id`
    pub fn parent(&self, id: TableId) -> Option<TableId> {
        self.parents[id.index()]
    }

    pub fn children(&self, id: TableId) -> &[TableId] {
        &self.children[id.index()]
    }

    /// Columns of `id` copied from its parent's rows
    pub fn mappings(&self, id: TableId) -> &[KeyMapping] {
        &self.mappings[id.index()]
    }

    /// Column sets whose values must not repeat within table `id`
    pub fn unique_keys(&self, id: TableId) -> &[Vec<usize>] {
        &self.unique_keys[id.index()]
    }

    /// Tables in generation order: root first, every child after its parent
    pub fn order(&self) -> &[TableId] {
        &self.order
    }

    /// Number of parent hops between `id` and the root
    pub fn depth(&self, id: TableId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parents[current.index()] {
            depth += 1;
            current = parent;
        }
        depth
    }
}

/// The root is the one table owning every key field.
fn resolve_root(tables: &[Table], key_fields: &[String]) -> Result<TableId> {
    let candidates: Vec<usize> = tables
        .iter()
        .enumerate()
        .filter(|(_, t)| key_fields.iter().all(|k| t.has_column(k)))
        .map(|(i, _)| i)
        .collect();

    match candidates.as_slice() {
        [only] => Ok(TableId(*only as u32)),
        [] => Err(Error::AmbiguousParent {
            key_fields: key_fields.join(", "),
            message: "no table has all of these columns".to_string(),
        }),
        many => {
            let names: Vec<&str> = many.iter().map(|&i| tables[i].name.as_str()).collect();
            Err(Error::AmbiguousParent {
                key_fields: key_fields.join(", "),
                message: format!("several tables qualify: {}", names.join(", ")),
            })
        }
    }
}

fn find_table(tables: &[Table], name: &str) -> Option<TableId> {
    tables
        .iter()
        .position(|t| t.name.eq_ignore_ascii_case(name))
        .map(|i| TableId(i as u32))
}

/// Resolve the parent side of a foreign-map entry. An unqualified column owned
/// by several tables resolves to the root when the root is one of them.
fn resolve_parent_column(
    tables: &[Table],
    root: TableId,
    spec: &ColumnSpec,
) -> Result<(TableId, usize)> {
    let unknown = |message: String| Error::UnknownColumn {
        column: spec.to_string(),
        message,
    };

    if let Some(table_name) = &spec.table {
        let id = find_table(tables, table_name)
            .ok_or_else(|| unknown(format!("no table named '{}'", table_name)))?;
        let col = tables[id.index()]
            .column_index(&spec.column)
            .ok_or_else(|| unknown(format!("table '{}' has no such column", table_name)))?;
        return Ok((id, col));
    }

    let owners: Vec<(TableId, usize)> = owners_of(tables, &spec.column, None);
    match owners.as_slice() {
        [only] => Ok(*only),
        [] => Err(unknown("no table has this parent column".to_string())),
        many => match many.iter().find(|(id, _)| *id == root) {
            Some(rooted) => Ok(*rooted),
            None => Err(unknown(format!(
                "parent column exists on several tables ({}); qualify it as table.column",
                owner_names(tables, many)
            ))),
        },
    }
}

/// Resolve the child side of a foreign-map entry, ignoring the parent table.
fn resolve_child_column(
    tables: &[Table],
    parent: TableId,
    spec: &ColumnSpec,
) -> Result<(TableId, usize)> {
    let unknown = |message: String| Error::UnknownColumn {
        column: spec.to_string(),
        message,
    };

    if let Some(table_name) = &spec.table {
        let id = find_table(tables, table_name)
            .ok_or_else(|| unknown(format!("no table named '{}'", table_name)))?;
        let col = tables[id.index()]
            .column_index(&spec.column)
            .ok_or_else(|| unknown(format!("table '{}' has no such column", table_name)))?;
        if id == parent {
            return Err(Error::CyclicDependency {
                tables: format!("'{}' (maps a column onto itself)", table_name),
            });
        }
        return Ok((id, col));
    }

    let owners = owners_of(tables, &spec.column, Some(parent));
    match owners.as_slice() {
        [only] => Ok(*only),
        [] => Err(unknown(format!(
            "no table other than '{}' has this child column",
            tables[parent.index()].name
        ))),
        many => Err(unknown(format!(
            "child column exists on several tables ({}); qualify it as table.column",
            owner_names(tables, many)
        ))),
    }
}

fn owners_of(tables: &[Table], column: &str, skip: Option<TableId>) -> Vec<(TableId, usize)> {
    tables
        .iter()
        .enumerate()
        .filter(|(i, _)| skip.map_or(true, |s| s.index() != *i))
        .filter_map(|(i, t)| t.column_index(column).map(|c| (TableId(i as u32), c)))
        .collect()
}

fn owner_names(tables: &[Table], owners: &[(TableId, usize)]) -> String {
    owners
        .iter()
        .map(|(id, _)| tables[id.index()].name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Mappings from the DDL `REFERENCES` clauses of one table.
///
/// Targets outside the schema and self-references are skipped; the columns
/// are then generated like any other column.
fn declared_mappings(
    tables: &[Table],
    root: TableId,
    key_fields: &[usize],
    id: TableId,
) -> Result<Vec<(TableId, KeyMapping)>> {
    let table = &tables[id.index()];
    let mut out = Vec::new();

    for (child_column, col) in table.columns.iter().enumerate() {
        let Some(target) = &col.references else {
            continue;
        };
        let Some(parent_id) = find_table(tables, &target.table) else {
            warn!(
                table = %table.name,
                column = %col.name,
                references = %target.table,
                "referenced table is not part of the schema; values will not be linked"
            );
            continue;
        };
        if parent_id == id {
            debug!(table = %table.name, column = %col.name, "skipping self-reference");
            continue;
        }

        let parent = &tables[parent_id.index()];
        let parent_column = match &target.column {
            Some(name) => parent.column_index(name).ok_or_else(|| Error::UnknownColumn {
                column: format!("{}.{}", parent.name, name),
                message: format!("referenced by '{}.{}'", table.name, col.name),
            })?,
            None => match (parent.primary_key.as_slice(), parent_id == root, key_fields) {
                ([only], _, _) => *only,
                (_, true, [only]) => *only,
                _ => {
                    warn!(
                        table = %table.name,
                        column = %col.name,
                        references = %parent.name,
                        "cannot tell which column is referenced; values will not be linked"
                    );
                    continue;
                }
            },
        };

        out.push((
            parent_id,
            KeyMapping {
                child_column,
                parent_column,
            },
        ));
    }

    Ok(out)
}

/// Order tables with Kahn's algorithm starting from the root. Tables never
/// reached are part of a cycle.
fn topo_sort(
    tables: &[Table],
    root: TableId,
    parents: &[Option<TableId>],
    children: &[Vec<TableId>],
) -> Result<Vec<TableId>> {
    let n = tables.len();
    let mut in_degree: Vec<usize> = parents.iter().map(|p| usize::from(p.is_some())).collect();
    let mut queue: VecDeque<TableId> = VecDeque::new();
    queue.push_back(root);

    let mut order = Vec::with_capacity(n);
    while let Some(table_id) = queue.pop_front() {
        order.push(table_id);
        for &child_id in &children[table_id.index()] {
            in_degree[child_id.index()] -= 1;
            if in_degree[child_id.index()] == 0 {
                queue.push_back(child_id);
            }
        }
    }

    if order.len() < n {
        let cyclic: Vec<&str> = (0..n)
            .filter(|&i| !order.contains(&TableId(i as u32)))
            .map(|i| tables[i].name.as_str())
            .collect();
        return Err(Error::CyclicDependency {
            tables: cyclic.join(", "),
        });
    }

    Ok(order)
}
