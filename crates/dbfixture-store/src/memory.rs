//! In-memory database implementing both storage traits
//!
//! `MemoryDatabase` models just enough of a relational engine to exercise
//! fixture preparation end to end without an external server:
//! - a catalog of tables, foreign keys and triggers with a default schema
//! - table contents with a per-commit history so `flashback` can rewind them
//! - table-level referential enforcement on delete and truncate
//! - row-movement enforcement for flashback of heap tables
//! - a log of every attempted statement and injectable statement failures

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::error::StorageError;
use crate::schema::{ColumnValues, ForeignKeyEdge, Scn, TableDescription, TableId, TriggerRecord};
use crate::statement::AdminStatement;
use crate::storage_traits::*;

#[derive(Debug)]
struct TableState {
    description: TableDescription,
    rows: Vec<ColumnValues>,
    /// `(scn, contents committed at scn)`, oldest first.
    history: Vec<(Scn, Vec<ColumnValues>)>,
    row_movement: bool,
}

impl TableState {
    fn contents_at(&self, scn: Scn) -> Vec<ColumnValues> {
        self.history
            .iter()
            .rev()
            .find(|(at, _)| *at <= scn)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug)]
struct ConstraintState {
    name: String,
    child: TableId,
    parent: TableId,
    enabled: bool,
}

#[derive(Debug)]
struct TriggerState {
    table: TableId,
    record: TriggerRecord,
    enabled: bool,
}

#[derive(Debug, Default)]
struct DatabaseState {
    default_schema: Option<String>,
    tables: BTreeMap<TableId, TableState>,
    constraints: Vec<ConstraintState>,
    triggers: Vec<TriggerState>,
    scn: u64,
    statement_log: Vec<AdminStatement>,
    failing: Vec<AdminStatement>,
    failing_inserts: Vec<TableId>,
    describe_calls: HashMap<String, usize>,
}

impl DatabaseState {
    /// Resolve a possibly owner-less table reference against the catalog.
    fn lookup(&self, name: &str, owner: Option<&str>) -> StorageResult<TableId> {
        let name = name.to_uppercase();
        let owner = owner
            .map(str::to_uppercase)
            .or_else(|| self.default_schema.clone());
        let matches: Vec<&TableId> = self
            .tables
            .keys()
            .filter(|id| id.name() == name)
            .filter(|id| owner.as_deref().map_or(true, |o| id.owner() == Some(o)))
            .collect();
        match matches.as_slice() {
            [] => Err(StorageError::TableNotFound { name, owner }),
            [id] => Ok((*id).clone()),
            many => Err(StorageError::AmbiguousTable {
                name,
                matches: many.len(),
            }),
        }
    }

    fn resolve(&self, table: &TableId) -> StorageResult<TableId> {
        self.lookup(table.name(), table.owner())
            .map_err(|_| StorageError::UnknownTable {
                table: table.qualified_name(),
            })
    }

    fn table_mut(&mut self, id: &TableId) -> StorageResult<&mut TableState> {
        self.tables
            .get_mut(id)
            .ok_or_else(|| StorageError::UnknownTable {
                table: id.qualified_name(),
            })
    }

    fn commit(&mut self, id: &TableId, rows: Vec<ColumnValues>) -> StorageResult<()> {
        self.scn += 1;
        let scn = Scn(self.scn);
        let table = self.table_mut(id)?;
        table.history.push((scn, rows.clone()));
        table.rows = rows;
        Ok(())
    }

    /// Enabled constraints whose parent is `id` and whose child still has rows.
    fn blocking_children(&self, id: &TableId) -> Option<&ConstraintState> {
        self.constraints.iter().find(|c| {
            c.enabled
                && c.parent == *id
                && c.child != *id
                && self
                    .tables
                    .get(&c.child)
                    .map_or(false, |t| !t.rows.is_empty())
        })
    }

    fn constraint_mut(&mut self, table: &TableId, name: &str) -> Option<&mut ConstraintState> {
        self.constraints
            .iter_mut()
            .find(|c| c.child == *table && c.name.eq_ignore_ascii_case(name))
    }

    fn trigger_mut(&mut self, qualified: &str) -> Option<&mut TriggerState> {
        self.triggers
            .iter_mut()
            .find(|t| t.record.qualified_name().eq_ignore_ascii_case(qualified))
    }

    fn apply(&mut self, statement: &AdminStatement) -> StorageResult<()> {
        let failed = |reason: &str| StorageError::StatementFailed {
            statement: statement.to_string(),
            reason: reason.to_string(),
        };

        match statement {
            AdminStatement::DeleteAll { table } => {
                let id = self.resolve(table)?;
                if let Some(c) = self.blocking_children(&id) {
                    return Err(StorageError::ConstraintViolation {
                        constraint: c.name.clone(),
                        detail: format!("child rows exist in {}", c.child),
                    });
                }
                self.commit(&id, Vec::new())
            }
            AdminStatement::Truncate { table } => {
                let id = self.resolve(table)?;
                if let Some(c) = self
                    .constraints
                    .iter()
                    .find(|c| c.enabled && c.parent == id)
                {
                    return Err(StorageError::ConstraintViolation {
                        constraint: c.name.clone(),
                        detail: format!("{id} is referenced by enabled foreign keys"),
                    });
                }
                self.commit(&id, Vec::new())
            }
            AdminStatement::DisableConstraint { table, constraint }
            | AdminStatement::EnableConstraint { table, constraint } => {
                let id = self.resolve(table)?;
                let enable = matches!(statement, AdminStatement::EnableConstraint { .. });
                let state = self
                    .constraint_mut(&id, constraint)
                    .ok_or_else(|| failed("no such constraint"))?;
                state.enabled = enable;
                Ok(())
            }
            AdminStatement::DisableTrigger { trigger } | AdminStatement::EnableTrigger { trigger } => {
                let enable = matches!(statement, AdminStatement::EnableTrigger { .. });
                let state = self
                    .trigger_mut(trigger)
                    .ok_or_else(|| failed("no such trigger"))?;
                state.enabled = enable;
                Ok(())
            }
            AdminStatement::EnableRowMovement { table }
            | AdminStatement::DisableRowMovement { table } => {
                let id = self.resolve(table)?;
                let enable = matches!(statement, AdminStatement::EnableRowMovement { .. });
                self.table_mut(&id)?.row_movement = enable;
                Ok(())
            }
            AdminStatement::Flashback { table, scn } => {
                let id = self.resolve(table)?;
                if *scn > Scn(self.scn) {
                    return Err(failed("scn is in the future"));
                }
                let state = self.table_mut(&id)?;
                if !state.description.index_organized && !state.row_movement {
                    return Err(StorageError::RowMovementDisabled {
                        table: id.qualified_name(),
                    });
                }
                let rows = state.contents_at(*scn);
                self.commit(&id, rows)
            }
        }
    }
}

/// In-memory relational database backed by a `BTreeMap<TableId, TableState>`.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    state: Mutex<DatabaseState>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owner used for lookups that do not name one.
    pub fn with_default_schema(self, schema: impl AsRef<str>) -> Self {
        self.state().default_schema = Some(schema.as_ref().to_uppercase());
        self
    }

    fn state(&self) -> MutexGuard<'_, DatabaseState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a heap table.
    pub fn add_table(&self, owner: &str, name: &str) -> TableId {
        self.register(owner, name, false)
    }

    /// Register an index-organized table.
    pub fn add_index_organized_table(&self, owner: &str, name: &str) -> TableId {
        self.register(owner, name, true)
    }

    fn register(&self, owner: &str, name: &str, index_organized: bool) -> TableId {
        let id = TableId::qualified(owner, name);
        let description = TableDescription {
            owner: owner.to_uppercase(),
            name: name.to_uppercase(),
            index_organized,
        };
        self.state().tables.insert(
            id.clone(),
            TableState {
                description,
                rows: Vec::new(),
                history: Vec::new(),
                row_movement: false,
            },
        );
        id
    }

    /// Declare that `child` holds a foreign key named `constraint` referencing `parent`.
    pub fn add_foreign_key(&self, constraint: &str, child: &TableId, parent: &TableId) {
        self.state().constraints.push(ConstraintState {
            name: constraint.to_uppercase(),
            child: child.clone(),
            parent: parent.clone(),
            enabled: true,
        });
    }

    /// Attach a trigger to a table.
    pub fn add_trigger(&self, table: &TableId, trigger_name: &str) {
        let owner = table.owner().unwrap_or_default().to_string();
        self.state().triggers.push(TriggerState {
            table: table.clone(),
            record: TriggerRecord {
                trigger_name: trigger_name.to_uppercase(),
                owner,
            },
            enabled: true,
        });
    }

    /// Make every future execution of `statement` fail.
    pub fn fail_statement(&self, statement: AdminStatement) {
        self.state().failing.push(statement);
    }

    /// Make every future insert into `table` fail.
    pub fn fail_inserts_into(&self, table: &TableId) {
        self.state().failing_inserts.push(table.clone());
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.failing.clear();
        state.failing_inserts.clear();
    }

    /// Every statement passed to `execute`, including ones that failed.
    pub fn statement_log(&self) -> Vec<AdminStatement> {
        self.state().statement_log.clone()
    }

    pub fn clear_statement_log(&self) {
        self.state().statement_log.clear();
    }

    /// How many times `describe_table` was asked about `name`.
    pub fn describe_calls(&self, name: &str) -> usize {
        self.state()
            .describe_calls
            .get(&name.to_uppercase())
            .copied()
            .unwrap_or(0)
    }

    /// Current rows of a table, or empty when the table is unknown.
    pub fn rows(&self, table: &TableId) -> Vec<ColumnValues> {
        let state = self.state();
        state
            .resolve(table)
            .ok()
            .and_then(|id| state.tables.get(&id).map(|t| t.rows.clone()))
            .unwrap_or_default()
    }

    pub fn constraint_enabled(&self, constraint: &str) -> Option<bool> {
        self.state()
            .constraints
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(constraint))
            .map(|c| c.enabled)
    }

    pub fn trigger_enabled(&self, qualified: &str) -> Option<bool> {
        self.state()
            .triggers
            .iter()
            .find(|t| t.record.qualified_name().eq_ignore_ascii_case(qualified))
            .map(|t| t.enabled)
    }

    pub fn row_movement_enabled(&self, table: &TableId) -> Option<bool> {
        let state = self.state();
        state.tables.get(table).map(|t| t.row_movement)
    }
}

#[async_trait]
impl MetadataProvider for MemoryDatabase {
    async fn describe_table(
        &self,
        name: &str,
        owner: Option<&str>,
    ) -> StorageResult<TableDescription> {
        let mut state = self.state();
        *state.describe_calls.entry(name.to_uppercase()).or_default() += 1;
        let id = state.lookup(name, owner)?;
        state
            .tables
            .get(&id)
            .map(|t| t.description.clone())
            .ok_or_else(|| StorageError::UnknownTable {
                table: id.qualified_name(),
            })
    }

    async fn child_foreign_keys(
        &self,
        name: &str,
        owner: Option<&str>,
    ) -> StorageResult<Vec<ForeignKeyEdge>> {
        let state = self.state();
        let id = state.lookup(name, owner)?;
        Ok(state
            .constraints
            .iter()
            .filter(|c| c.parent == id)
            .map(|c| ForeignKeyEdge {
                constraint_name: c.name.clone(),
                child_owner: c.child.owner().unwrap_or_default().to_string(),
                child_name: c.child.name().to_string(),
            })
            .collect())
    }

    async fn triggers_for(
        &self,
        name: &str,
        owner: Option<&str>,
    ) -> StorageResult<Vec<TriggerRecord>> {
        let state = self.state();
        let id = state.lookup(name, owner)?;
        Ok(state
            .triggers
            .iter()
            .filter(|t| t.table == id)
            .map(|t| t.record.clone())
            .collect())
    }
}

#[async_trait]
impl DataAccess for MemoryDatabase {
    async fn execute(&self, statement: &AdminStatement) -> StorageResult<()> {
        let mut state = self.state();
        state.statement_log.push(statement.clone());
        debug!(statement = %statement, "memory database execute");
        if state.failing.contains(statement) {
            return Err(StorageError::StatementFailed {
                statement: statement.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        state.apply(statement)
    }

    async fn insert_row(&self, table: &TableId, columns: &ColumnValues) -> StorageResult<()> {
        let mut state = self.state();
        let id = state.resolve(table)?;
        if state.failing_inserts.contains(&id) {
            return Err(StorageError::Backend(format!(
                "injected insert failure for {id}"
            )));
        }
        let mut rows = state.table_mut(&id)?.rows.clone();
        rows.push(columns.clone());
        state.commit(&id, rows)
    }

    async fn select_rows(&self, table: &TableId) -> StorageResult<Vec<ColumnValues>> {
        let state = self.state();
        let id = state.resolve(table)?;
        Ok(state
            .tables
            .get(&id)
            .map(|t| t.rows.clone())
            .unwrap_or_default())
    }

    async fn current_scn(&self) -> StorageResult<Scn> {
        Ok(Scn(self.state().scn))
    }
}
