//! Catalog record definitions
//!
//! - `TableId`: canonical (owner, name) identity of a table
//! - `TableDescription`: what the catalog reports for a single table
//! - `ForeignKeyEdge`: a child table referencing a parent through a constraint
//! - `TriggerRecord`: a trigger attached to a table
//! - `Scn`: monotonic consistency marker usable as a restore target

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Column name / value pairs of one table row, in the order the data
/// source reported them.
pub type ColumnValues = Vec<(String, serde_json::Value)>;

/// Canonical table identity.
///
/// Owner and name are upper-cased at construction and cannot change
/// afterwards, so a `TableId` is safe to use as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId {
    owner: Option<String>,
    name: String,
}

impl TableId {
    /// A table whose owner will be supplied by the catalog's default schema.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            owner: None,
            name: name.as_ref().trim().to_uppercase(),
        }
    }

    /// A table with an explicit owner.
    pub fn qualified(owner: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self {
            owner: Some(owner.as_ref().trim().to_uppercase()),
            name: name.as_ref().trim().to_uppercase(),
        }
    }

    /// Parse `name` or `owner.name`.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [name] if !name.trim().is_empty() => Ok(Self::new(name)),
            [owner, name] if !owner.trim().is_empty() && !name.trim().is_empty() => {
                Ok(Self::qualified(owner, name))
            }
            _ => Err(StorageError::Backend(format!(
                "invalid table name '{s}': expected 'name' or 'owner.name'"
            ))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Same table, treating a missing owner on either side as a wildcard.
    pub fn refers_to(&self, other: &TableId) -> bool {
        self.name == other.name
            && match (&self.owner, &other.owner) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }

    /// `OWNER.NAME`, or `NAME` when no owner is known.
    pub fn qualified_name(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{owner}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}

/// Catalog entry for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    pub owner: String,
    pub name: String,
    /// Index-organized tables keep rows in primary-key order and do not need
    /// row movement toggled around a flashback.
    pub index_organized: bool,
}

impl TableDescription {
    pub fn table_id(&self) -> TableId {
        TableId::qualified(&self.owner, &self.name)
    }
}

/// A foreign key on `child_owner.child_name` that references the described table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyEdge {
    pub constraint_name: String,
    pub child_owner: String,
    pub child_name: String,
}

impl ForeignKeyEdge {
    pub fn child_id(&self) -> TableId {
        TableId::qualified(&self.child_owner, &self.child_name)
    }
}

/// A trigger defined on a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub trigger_name: String,
    pub owner: String,
}

impl TriggerRecord {
    pub fn qualified_name(&self) -> String {
        format!(
            "{}.{}",
            self.owner.to_uppercase(),
            self.trigger_name.to_uppercase()
        )
    }
}

/// System change number: a monotonic point in the data source's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scn(pub u64);

impl std::fmt::Display for Scn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
