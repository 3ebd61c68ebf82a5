//! Administrative statements issued while preparing and restoring fixtures.
//!
//! Backends receive the structured [`AdminStatement`]; its `Display` form is
//! the SQL text a JDBC-style driver would send, and is also what dry-run
//! scripts print.

use serde::{Deserialize, Serialize};

use crate::schema::{Scn, TableId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdminStatement {
    /// `delete from T`
    DeleteAll { table: TableId },
    /// `truncate table T`
    Truncate { table: TableId },
    /// `alter table C disable constraint K` (C is the constraint's owning table)
    DisableConstraint { table: TableId, constraint: String },
    /// `alter table C enable constraint K`
    EnableConstraint { table: TableId, constraint: String },
    /// `alter trigger G disable`
    DisableTrigger { trigger: String },
    /// `alter trigger G enable`
    EnableTrigger { trigger: String },
    /// `alter table T enable row movement`
    EnableRowMovement { table: TableId },
    /// `alter table T disable row movement`
    DisableRowMovement { table: TableId },
    /// `flashback table T to scn N`
    Flashback { table: TableId, scn: Scn },
}

impl AdminStatement {
    /// The table this statement operates on, if any.
    pub fn table(&self) -> Option<&TableId> {
        match self {
            AdminStatement::DeleteAll { table }
            | AdminStatement::Truncate { table }
            | AdminStatement::DisableConstraint { table, .. }
            | AdminStatement::EnableConstraint { table, .. }
            | AdminStatement::EnableRowMovement { table }
            | AdminStatement::DisableRowMovement { table }
            | AdminStatement::Flashback { table, .. } => Some(table),
            AdminStatement::DisableTrigger { .. } | AdminStatement::EnableTrigger { .. } => None,
        }
    }
}

impl std::fmt::Display for AdminStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminStatement::DeleteAll { table } => write!(f, "delete from {table}"),
            AdminStatement::Truncate { table } => write!(f, "truncate table {table}"),
            AdminStatement::DisableConstraint { table, constraint } => {
                write!(f, "alter table {table} disable constraint {constraint}")
            }
            AdminStatement::EnableConstraint { table, constraint } => {
                write!(f, "alter table {table} enable constraint {constraint}")
            }
            AdminStatement::DisableTrigger { trigger } => write!(f, "alter trigger {trigger} disable"),
            AdminStatement::EnableTrigger { trigger } => write!(f, "alter trigger {trigger} enable"),
            AdminStatement::EnableRowMovement { table } => {
                write!(f, "alter table {table} enable row movement")
            }
            AdminStatement::DisableRowMovement { table } => {
                write!(f, "alter table {table} disable row movement")
            }
            AdminStatement::Flashback { table, scn } => {
                write!(f, "flashback table {table} to scn {scn}")
            }
        }
    }
}
