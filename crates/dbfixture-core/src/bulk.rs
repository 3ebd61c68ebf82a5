//! Dependency-ordered bulk operations over a resolved [`TableGraph`].
//!
//! Traversal orders are computed up front from the graph; statements are then
//! issued one by one through [`DataAccess`]. Each statement commits on its
//! own, so a failure part-way leaves earlier statements applied.

use std::fmt::Write as _;
use std::sync::Arc;

use dbfixture_store::{AdminStatement, DataAccess, Scn, TableId};
use tracing::debug;

use crate::dataset::{LiveDataset, Row};
use crate::error::{FixtureError, FixtureResult};
use crate::graph::{delete_order, walk_restore, RestoreVisitor, TableGraph, TableKey, TableNode};
use crate::obs;

#[derive(Clone)]
pub struct BulkOperationExecutor {
    data: Arc<dyn DataAccess>,
}

impl BulkOperationExecutor {
    pub fn new(data: Arc<dyn DataAccess>) -> Self {
        Self { data }
    }

    /// Delete every row of `table` and, first, of every table referencing it.
    pub async fn delete_table(&self, graph: &TableGraph, table: TableKey) -> FixtureResult<()> {
        self.delete_tables(graph, &[table]).await
    }

    /// Delete several tables, children before parents, each exactly once.
    pub async fn delete_tables(&self, graph: &TableGraph, tables: &[TableKey]) -> FixtureResult<()> {
        for key in delete_order(graph, tables) {
            let table = graph.table(key).id();
            self.run(table, AdminStatement::DeleteAll {
                table: table.clone(),
            })
            .await?;
        }
        Ok(())
    }

    pub async fn truncate_table(&self, graph: &TableGraph, table: TableKey) -> FixtureResult<()> {
        self.truncate_tables(graph, &[table]).await
    }

    /// Truncate in delete order. Each table's referencing constraints are
    /// disabled around its truncate.
    pub async fn truncate_tables(
        &self,
        graph: &TableGraph,
        tables: &[TableKey],
    ) -> FixtureResult<()> {
        for key in delete_order(graph, tables) {
            self.truncate_one(graph, key).await?;
        }
        Ok(())
    }

    async fn truncate_one(&self, graph: &TableGraph, key: TableKey) -> FixtureResult<()> {
        let node = graph.table(key);
        let constraints: Vec<(&TableId, &str)> = node
            .child_constraints()
            .iter()
            .map(|c| {
                let constraint = graph.constraint(*c);
                (graph.table(constraint.child()).id(), constraint.name())
            })
            .collect();

        let mut disable_error = None;
        for (child, name) in &constraints {
            let statement = AdminStatement::DisableConstraint {
                table: (*child).clone(),
                constraint: name.to_string(),
            };
            debug!(statement = %statement, "execute");
            if let Err(source) = self.data.execute(&statement).await {
                disable_error = Some(FixtureError::ConstraintToggle {
                    table: child.qualified_name(),
                    constraint: name.to_string(),
                    source,
                });
                break;
            }
        }

        let truncated = match disable_error {
            Some(_) => Ok(()),
            None => {
                self.run(node.id(), AdminStatement::Truncate {
                    table: node.id().clone(),
                })
                .await
            }
        };

        // The enable pass runs once whatever happened above.
        for (child, name) in &constraints {
            let statement = AdminStatement::EnableConstraint {
                table: (*child).clone(),
                constraint: name.to_string(),
            };
            debug!(statement = %statement, "execute");
            if let Err(err) = self.data.execute(&statement).await {
                obs::emit_constraint_enable_failed(&child.qualified_name(), name, &err);
            }
        }

        match disable_error {
            Some(err) => Err(err),
            None => truncated,
        }
    }

    /// Flash every table connected to `tables` back to `scn`, parents first,
    /// each table exactly once.
    pub async fn restore_tables(
        &self,
        graph: &TableGraph,
        tables: &[TableKey],
        scn: Scn,
    ) -> FixtureResult<()> {
        let mut plan = Vec::new();
        walk_restore(graph, tables, &mut |table: &TableNode| {
            plan.push((table.id().clone(), flashback_statements(table, scn)));
        });
        for (table, statements) in plan {
            for statement in statements {
                self.run(&table, statement).await?;
            }
        }
        Ok(())
    }

    /// Disable every trigger of `tables`.
    pub async fn disable_triggers(
        &self,
        graph: &TableGraph,
        tables: &[TableKey],
    ) -> FixtureResult<()> {
        self.toggle_triggers(graph, tables, false).await
    }

    /// Enable every trigger of `tables`.
    pub async fn enable_triggers(&self, graph: &TableGraph, tables: &[TableKey]) -> FixtureResult<()> {
        self.toggle_triggers(graph, tables, true).await
    }

    async fn toggle_triggers(
        &self,
        graph: &TableGraph,
        tables: &[TableKey],
        enable: bool,
    ) -> FixtureResult<()> {
        for &key in tables {
            let node = graph.table(key);
            for trigger in node.triggers() {
                let trigger = trigger.qualified_name().to_string();
                let statement = if enable {
                    AdminStatement::EnableTrigger { trigger }
                } else {
                    AdminStatement::DisableTrigger { trigger }
                };
                self.run(node.id(), statement).await?;
            }
        }
        Ok(())
    }

    /// Insert every non-empty row, in dataset order.
    pub async fn insert_dataset(&self, dataset: &LiveDataset) -> FixtureResult<()> {
        for row in dataset.non_empty_rows() {
            self.data
                .insert_row(row.table(), &row.to_column_values())
                .await
                .map_err(|source| FixtureError::data_access(row.table(), source))?;
        }
        Ok(())
    }

    /// Re-query every row of `tables`.
    pub async fn load_dataset(&self, tables: &[TableId]) -> FixtureResult<LiveDataset> {
        let mut dataset = LiveDataset::new();
        for table in tables {
            dataset.add_table(table.clone());
            let rows = self
                .data
                .select_rows(table)
                .await
                .map_err(|source| FixtureError::data_access(table, source))?;
            for values in rows {
                dataset.push(Row::from_column_values(table.clone(), values));
            }
        }
        Ok(dataset)
    }

    pub async fn current_scn(&self) -> FixtureResult<Scn> {
        self.data.current_scn().await.map_err(|source| FixtureError::DataAccess {
            table: "<scn>".to_string(),
            schema: None,
            source,
        })
    }

    async fn run(&self, table: &TableId, statement: AdminStatement) -> FixtureResult<()> {
        debug!(statement = %statement, "execute");
        self.data
            .execute(&statement)
            .await
            .map_err(|source| FixtureError::data_access(table, source))
    }
}

/// Statements that flash one table back to `scn`. Heap tables need row
/// movement enabled for the duration of the flashback.
pub fn flashback_statements(table: &TableNode, scn: Scn) -> Vec<AdminStatement> {
    let id = table.id().clone();
    if table.is_index_organized() {
        vec![AdminStatement::Flashback { table: id, scn }]
    } else {
        vec![
            AdminStatement::EnableRowMovement { table: id.clone() },
            AdminStatement::Flashback {
                table: id.clone(),
                scn,
            },
            AdminStatement::DisableRowMovement { table: id },
        ]
    }
}

/// Every statement a restore of `tables` would issue, in execution order.
pub fn restore_statements(graph: &TableGraph, tables: &[TableKey], scn: Scn) -> Vec<AdminStatement> {
    let mut statements = Vec::new();
    walk_restore(graph, tables, &mut |table: &TableNode| {
        statements.extend(flashback_statements(table, scn));
    });
    statements
}

/// Dry run: the text of the statements [`BulkOperationExecutor::restore_tables`]
/// would execute, without executing them.
pub fn restore_script(graph: &TableGraph, tables: &[TableKey], scn: Scn) -> String {
    let mut script = ScriptWriter {
        scn,
        script: String::new(),
    };
    walk_restore(graph, tables, &mut script);
    script.script
}

struct ScriptWriter {
    scn: Scn,
    script: String,
}

impl RestoreVisitor for ScriptWriter {
    fn restore(&mut self, table: &TableNode) {
        for statement in flashback_statements(table, self.scn) {
            // Writing to a String cannot fail.
            let _ = writeln!(self.script, "{statement};");
        }
        self.script.push('\n');
    }
}
