use dbfixture_store::{ColumnValues, TableId};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
struct Column<C> {
    /// Spelling as first supplied, kept for diagnostics.
    name: String,
    /// Upper-cased lookup key.
    key: String,
    value: C,
}

/// One record of a table: a case-insensitive column → cell mapping.
///
/// Cells are live values (`Row<Value>`) or expectations
/// (`Row<ColumnPredicate>`). Columns keep the order they were added in.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<C> {
    table: TableId,
    columns: Vec<Column<C>>,
}

impl<C> Row<C> {
    pub fn new(table: TableId) -> Self {
        Self {
            table,
            columns: Vec::new(),
        }
    }

    pub fn table(&self) -> &TableId {
        &self.table
    }

    pub(crate) fn set_table(&mut self, table: TableId) {
        self.table = table;
    }

    /// Set a column, replacing any existing column with the same name in any
    /// casing. The replaced column's original spelling is kept.
    pub fn insert(&mut self, name: impl Into<String>, value: C) {
        let name = name.into();
        let key = name.to_uppercase();
        match self.columns.iter_mut().find(|c| c.key == key) {
            Some(column) => column.value = value,
            None => self.columns.push(Column { name, key, value }),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: C) -> Self {
        self.insert(name, value);
        self
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&C> {
        let key = name.to_uppercase();
        self.columns
            .iter()
            .find(|c| c.key == key)
            .map(|c| &c.value)
    }

    /// `(original name, value)` pairs in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &C)> {
        self.columns.iter().map(|c| (c.name.as_str(), &c.value))
    }

    /// `(upper-cased key, original name)` pairs in insertion order.
    pub(crate) fn column_keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(|c| (c.key.as_str(), c.name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// An empty row only names its table; it is never inserted or matched.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Row<Value> {
    pub fn from_column_values(table: TableId, values: ColumnValues) -> Self {
        let mut row = Row::new(table);
        for (name, value) in values {
            row.insert(name, value);
        }
        row
    }

    pub fn to_column_values(&self) -> ColumnValues {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.value.clone()))
            .collect()
    }
}
