//! Referential graph model.
//!
//! Tables live in an append-only arena and are addressed by [`TableKey`].
//! A table's identity ([`TableId`]) is fixed when the node is created; the
//! structural decorations (constraints, triggers) are attached to the node
//! afterwards without touching the identity used by the index.
//!
//! An edge `child → parent` means the child table holds a foreign key that
//! references the parent. Every constraint is recorded once and referenced
//! from both ends: the parent's `child_constraints` and the child's
//! `parent_constraints`.

use std::collections::HashMap;

use dbfixture_store::{TableId, TriggerRecord};

/// Stable handle to a table node inside a [`TableGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableKey(usize);

impl TableKey {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Stable handle to a constraint inside a [`TableGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintKey(usize);

/// A foreign key owned by `child` that references `parent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferentialConstraint {
    name: String,
    child: TableKey,
    parent: TableKey,
}

impl ReferentialConstraint {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table that owns the foreign key.
    pub fn child(&self) -> TableKey {
        self.child
    }

    /// The table referenced by the foreign key.
    pub fn parent(&self) -> TableKey {
        self.parent
    }
}

/// A trigger on a table, used only to switch it off and on around inserts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trigger {
    qualified_name: String,
}

impl Trigger {
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }
}

impl From<TriggerRecord> for Trigger {
    fn from(record: TriggerRecord) -> Self {
        Self {
            qualified_name: record.qualified_name(),
        }
    }
}

/// Structural record for one table.
#[derive(Debug, Clone)]
pub struct TableNode {
    id: TableId,
    index_organized: bool,
    child_constraints: Vec<ConstraintKey>,
    parent_constraints: Vec<ConstraintKey>,
    triggers: Vec<Trigger>,
}

impl TableNode {
    pub fn id(&self) -> &TableId {
        &self.id
    }

    pub fn is_index_organized(&self) -> bool {
        self.index_organized
    }

    /// Constraints on other tables that reference this one.
    pub fn child_constraints(&self) -> &[ConstraintKey] {
        &self.child_constraints
    }

    /// Constraints this table holds against other tables.
    pub fn parent_constraints(&self) -> &[ConstraintKey] {
        &self.parent_constraints
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }
}

/// Snapshot of the arena sizes, used to undo a failed resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphMark {
    tables: usize,
    constraints: usize,
}

impl GraphMark {
    pub fn tables(&self) -> usize {
        self.tables
    }
}

/// Arena of tables and the referential constraints between them.
#[derive(Debug, Clone, Default)]
pub struct TableGraph {
    tables: Vec<TableNode>,
    constraints: Vec<ReferentialConstraint>,
    index: HashMap<TableId, TableKey>,
}

impl TableGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Add a bare table, or return the existing key for the same identity.
    pub fn insert_table(&mut self, id: TableId, index_organized: bool) -> TableKey {
        if let Some(key) = self.index.get(&id) {
            return *key;
        }
        let key = TableKey(self.tables.len());
        self.index.insert(id.clone(), key);
        self.tables.push(TableNode {
            id,
            index_organized,
            child_constraints: Vec::new(),
            parent_constraints: Vec::new(),
            triggers: Vec::new(),
        });
        key
    }

    pub fn key_of(&self, id: &TableId) -> Option<TableKey> {
        self.index.get(id).copied()
    }

    /// # Panics
    ///
    /// Panics if `key` was not issued by this graph.
    pub fn table(&self, key: TableKey) -> &TableNode {
        &self.tables[key.0]
    }

    pub fn constraint(&self, key: ConstraintKey) -> &ReferentialConstraint {
        &self.constraints[key.0]
    }

    pub fn tables(&self) -> impl Iterator<Item = (TableKey, &TableNode)> {
        self.tables
            .iter()
            .enumerate()
            .map(|(i, node)| (TableKey(i), node))
    }

    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintKey, &ReferentialConstraint)> {
        self.constraints
            .iter()
            .enumerate()
            .map(|(i, c)| (ConstraintKey(i), c))
    }

    /// Record that `child` references `parent` through the named constraint.
    ///
    /// The constraint is attached to both ends. Linking the same
    /// (name, child) pair twice returns the existing constraint.
    pub fn link(&mut self, name: &str, child: TableKey, parent: TableKey) -> ConstraintKey {
        let name = name.to_uppercase();
        if let Some((key, _)) = self
            .constraints()
            .find(|(_, c)| c.child == child && c.name == name)
        {
            return key;
        }
        let key = ConstraintKey(self.constraints.len());
        self.constraints.push(ReferentialConstraint {
            name,
            child,
            parent,
        });
        self.tables[parent.0].child_constraints.push(key);
        self.tables[child.0].parent_constraints.push(key);
        key
    }

    pub fn set_triggers(&mut self, key: TableKey, triggers: Vec<Trigger>) {
        self.tables[key.0].triggers = triggers;
    }

    /// Tables holding foreign keys to `key`, in constraint order.
    pub fn children(&self, key: TableKey) -> impl Iterator<Item = TableKey> + '_ {
        self.table(key)
            .child_constraints
            .iter()
            .map(move |c| self.constraints[c.0].child)
    }

    /// Tables referenced by `key`'s foreign keys, in constraint order.
    pub fn parents(&self, key: TableKey) -> impl Iterator<Item = TableKey> + '_ {
        self.table(key)
            .parent_constraints
            .iter()
            .map(move |c| self.constraints[c.0].parent)
    }

    pub fn mark(&self) -> GraphMark {
        GraphMark {
            tables: self.tables.len(),
            constraints: self.constraints.len(),
        }
    }

    /// Drop every table and constraint added after `mark`.
    pub fn rollback(&mut self, mark: GraphMark) {
        self.tables.truncate(mark.tables);
        self.constraints.truncate(mark.constraints);
        self.index.retain(|_, key| key.0 < mark.tables);
        for node in &mut self.tables {
            node.child_constraints.retain(|c| c.0 < mark.constraints);
            node.parent_constraints.retain(|c| c.0 < mark.constraints);
        }
    }
}
