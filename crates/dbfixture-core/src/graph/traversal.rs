//! Traversal orders over a resolved [`TableGraph`].
//!
//! - [`delete_order`]: children before parents, depth-first over child edges.
//! - [`walk_restore`]: parents, then self, then children, each table visited
//!   exactly once across all starting tables.
//!
//! Both walks tolerate foreign-key cycles. The delete walk enters each table
//! once; the restore walk never climbs into a table whose own parents are
//! still being walked.

use std::collections::HashSet;

use super::model::{TableGraph, TableKey, TableNode};

/// Order in which tables must be emptied so that no parent is emptied while
/// a child table still references it.
///
/// Each table appears once even when reachable from several starting tables
/// or through several paths.
pub fn delete_order(graph: &TableGraph, starts: &[TableKey]) -> Vec<TableKey> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    for &start in starts {
        visit_children_first(graph, start, &mut seen, &mut order);
    }
    order
}

fn visit_children_first(
    graph: &TableGraph,
    key: TableKey,
    seen: &mut HashSet<TableKey>,
    order: &mut Vec<TableKey>,
) {
    if !seen.insert(key) {
        return;
    }
    for child in graph.children(key) {
        visit_children_first(graph, child, seen, order);
    }
    order.push(key);
}

/// Leaf action of the restore walk.
pub trait RestoreVisitor {
    fn restore(&mut self, table: &TableNode);
}

impl<F> RestoreVisitor for F
where
    F: FnMut(&TableNode),
{
    fn restore(&mut self, table: &TableNode) {
        self(table)
    }
}

/// Walk every table connected to `starts` (through parent or child edges),
/// handing each one to `visitor` exactly once, parents before children.
pub fn walk_restore<V>(graph: &TableGraph, starts: &[TableKey], visitor: &mut V)
where
    V: RestoreVisitor + ?Sized,
{
    let mut walk = RestoreWalk {
        graph,
        restored: HashSet::new(),
        climbing: HashSet::new(),
    };
    for &start in starts {
        walk.visit(start, visitor);
    }
}

/// Restore order as a list of keys.
pub fn restore_order(graph: &TableGraph, starts: &[TableKey]) -> Vec<TableKey> {
    let mut order = Vec::new();
    walk_restore(graph, starts, &mut |table: &TableNode| {
        if let Some(key) = graph.key_of(table.id()) {
            order.push(key);
        }
    });
    order
}

struct RestoreWalk<'g> {
    graph: &'g TableGraph,
    restored: HashSet<TableKey>,
    /// Tables whose parent loop is on the current path; a foreign-key cycle
    /// is cut where it climbs back into one of them.
    climbing: HashSet<TableKey>,
}

impl RestoreWalk<'_> {
    fn visit<V>(&mut self, key: TableKey, visitor: &mut V)
    where
        V: RestoreVisitor + ?Sized,
    {
        let graph = self.graph;

        let outermost = self.climbing.insert(key);
        for parent in graph.parents(key) {
            if !self.restored.contains(&parent) && !self.climbing.contains(&parent) {
                self.visit(parent, visitor);
            }
        }
        if outermost {
            self.climbing.remove(&key);
        }

        // A table may already have been reached through a parent's child edge
        // while its own parents were being walked.
        if self.restored.insert(key) {
            visitor.restore(graph.table(key));
        }

        for child in graph.children(key) {
            if !self.restored.contains(&child) {
                self.visit(child, visitor);
            }
        }
    }
}
