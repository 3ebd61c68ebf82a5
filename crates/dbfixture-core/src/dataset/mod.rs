//! Multi-table record collections.
//!
//! A [`Dataset`] groups [`Row`]s by table identity. Tables iterate in
//! the order they were first seen and rows keep insertion order within a
//! table. The same container holds live data ([`LiveDataset`]) and
//! expectations ([`ExpectedDataset`]).

mod builder;
pub mod predicate;
mod row;

use std::collections::BTreeMap;
use std::fmt;

use dbfixture_store::TableId;
use serde_json::Value;

pub use builder::{expected_dataset, seed_dataset, DatasetBuilder};
pub use predicate::ColumnPredicate;
pub use row::Row;

pub type LiveDataset = Dataset<Value>;
pub type ExpectedDataset = Dataset<ColumnPredicate>;

#[derive(Debug, Clone, PartialEq)]
struct TableRows<C> {
    table: TableId,
    rows: Vec<Row<C>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<C> {
    tables: Vec<TableRows<C>>,
}

impl<C> Default for Dataset<C> {
    fn default() -> Self {
        Self { tables: Vec::new() }
    }
}

impl<C> Dataset<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table without rows.
    pub fn add_table(&mut self, table: TableId) {
        if self.position(&table).is_none() {
            self.tables.push(TableRows {
                table,
                rows: Vec::new(),
            });
        }
    }

    /// Append a row to its table's group.
    pub fn push(&mut self, row: Row<C>) {
        match self.position(row.table()) {
            Some(i) => self.tables[i].rows.push(row),
            None => self.tables.push(TableRows {
                table: row.table().clone(),
                rows: vec![row],
            }),
        }
    }

    fn position(&self, table: &TableId) -> Option<usize> {
        self.tables.iter().position(|t| t.table == *table)
    }

    /// Tables in first-seen order.
    pub fn tables(&self) -> impl Iterator<Item = &TableId> {
        self.tables.iter().map(|t| &t.table)
    }

    /// Rows of the first table with this name, in any casing.
    pub fn rows_for(&self, name: &str) -> &[Row<C>] {
        let name = name.to_uppercase();
        self.tables
            .iter()
            .find(|t| t.table.name() == name)
            .map(|t| t.rows.as_slice())
            .unwrap_or(&[])
    }

    /// Rows of every table `table` refers to. An owner-less identity on
    /// either side matches by name alone.
    pub fn rows_of<'a>(&'a self, table: &'a TableId) -> impl Iterator<Item = &'a Row<C>> + 'a {
        self.tables
            .iter()
            .filter(move |t| t.table.refers_to(table))
            .flat_map(|t| t.rows.iter())
    }

    /// Every row, table by table.
    pub fn rows(&self) -> impl Iterator<Item = &Row<C>> {
        self.tables.iter().flat_map(|t| t.rows.iter())
    }

    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }

    /// Rows that carry at least one column.
    pub fn non_empty_rows(&self) -> impl Iterator<Item = &Row<C>> {
        self.rows().filter(|r| !r.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Replace every table identity (for example with its resolved canonical
    /// form). Rows follow their table; groups that end up with the same
    /// identity are merged.
    pub fn retarget(&mut self, mut f: impl FnMut(&TableId) -> TableId) {
        for group in std::mem::take(&mut self.tables) {
            let table = f(&group.table);
            self.add_table(table.clone());
            for mut row in group.rows {
                row.set_table(table.clone());
                self.push(row);
            }
        }
    }
}

/// Text of one cell in a dataset rendering.
pub trait RenderCell {
    fn render_cell(&self) -> String;
}

impl RenderCell for Value {
    fn render_cell(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl RenderCell for ColumnPredicate {
    fn render_cell(&self) -> String {
        self.description().to_string()
    }
}

/// Per table: a blank line, `TABLE: <NAME>`, the column header, then one line
/// per row. Columns are the union over the table's rows ordered by their
/// upper-cased name; absent cells are empty.
impl<C: RenderCell> fmt::Display for Dataset<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in &self.tables {
            // upper-cased key → first-seen spelling
            let mut columns: BTreeMap<&str, &str> = BTreeMap::new();
            for row in &group.rows {
                for (key, name) in row.column_keys() {
                    columns.entry(key).or_insert(name);
                }
            }

            write!(f, "\nTABLE: {}\n", group.table.name())?;
            let header: Vec<&str> = columns.values().copied().collect();
            writeln!(f, "{}", header.join(","))?;
            for row in &group.rows {
                let cells: Vec<String> = columns
                    .keys()
                    .map(|key| row.get(key).map(RenderCell::render_cell).unwrap_or_default())
                    .collect();
                writeln!(f, "{}", cells.join(","))?;
            }
        }
        Ok(())
    }
}
