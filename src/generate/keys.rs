//! Composite key tracking for uniqueness enforcement.

use super::value::{Row, Value};
use ahash::AHashSet;

/// Set of key tuples already issued for one unique column set of a table
#[derive(Debug, Default)]
pub struct KeyRegistry {
    columns: Vec<usize>,
    seen: AHashSet<Vec<String>>,
}

impl KeyRegistry {
    /// Registry for the key made of the given column positions
    pub fn new(columns: Vec<usize>) -> Self {
        Self {
            columns,
            seen: AHashSet::new(),
        }
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    fn key_of(&self, row: &[Value]) -> Vec<String> {
        self.columns.iter().map(|&i| row[i].key_repr()).collect()
    }

    /// Whether the row's key tuple has been registered already
    pub fn contains(&self, row: &Row) -> bool {
        self.seen.contains(&self.key_of(row))
    }

    /// Record the row's key tuple; returns false if it was already present
    pub fn insert(&mut self, row: &Row) -> bool {
        let key = self.key_of(row);
        self.seen.insert(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_key_tracking() {
        let mut reg = KeyRegistry::new(vec![0, 2]);
        let a = vec![Value::Int(1), Value::Text("x".into()), Value::Int(2)];
        let b = vec![Value::Int(1), Value::Text("y".into()), Value::Int(2)];
        let c = vec![Value::Int(1), Value::Text("x".into()), Value::Int(3)];

        assert!(reg.insert(&a));
        assert!(reg.contains(&b));
        assert!(!reg.insert(&b));
        assert!(!reg.contains(&c));
        assert!(reg.insert(&c));
        assert_eq!(reg.len(), 2);
    }
}
