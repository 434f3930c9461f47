//! Id rename tables.
//!
//! A table maps retired ids to their replacements. Tables are closed
//! transitively before use (`a → b`, `b → c` becomes `a → c`, `b → c`) so a
//! single substitution pass reaches the final id and running it again changes
//! nothing.

use std::collections::BTreeMap;

use crate::catalog::Category;
use crate::errors::{DrydockError, DrydockResult};

/// Close a rename table transitively. Self-mappings are dropped; cycles are
/// rejected.
pub fn close_table(table: &BTreeMap<String, String>) -> DrydockResult<BTreeMap<String, String>> {
    let mut closed = BTreeMap::new();

    for start in table.keys() {
        let mut current = start.as_str();
        let mut hops = 0usize;
        while let Some(next) = table.get(current) {
            if next == current {
                break;
            }
            hops += 1;
            if hops > table.len() {
                return Err(DrydockError::invalid_argument(format!(
                    "rename cycle through '{start}'"
                )));
            }
            current = next.as_str();
        }
        if current != start {
            closed.insert(start.clone(), current.to_string());
        }
    }

    Ok(closed)
}

/// Closed rename tables for every category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameTables {
    tables: BTreeMap<Category, BTreeMap<String, String>>,
}

impl RenameTables {
    pub fn new(raw: &BTreeMap<Category, BTreeMap<String, String>>) -> DrydockResult<Self> {
        let mut tables = BTreeMap::new();
        for (category, table) in raw {
            let closed = close_table(table)?;
            if !closed.is_empty() {
                tables.insert(*category, closed);
            }
        }
        Ok(Self { tables })
    }

    /// Current id for `id`, or `None` when it is not retired.
    pub fn lookup(&self, category: Category, id: &str) -> Option<&str> {
        self.tables
            .get(&category)
            .and_then(|t| t.get(id))
            .map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.tables.keys().copied()
    }
}
