//! Referential graph: model, resolution and traversal orders.

pub mod loader;
pub mod model;
pub mod traversal;

pub use loader::GraphLoader;
pub use model::{
    ConstraintKey, GraphMark, ReferentialConstraint, TableGraph, TableKey, TableNode, Trigger,
};
pub use traversal::{delete_order, restore_order, walk_restore, RestoreVisitor};
