//! dbfixture-store: catalog and data access layer for dbfixture
//!
//! This crate defines the seams between the fixture engine and a concrete
//! relational database, plus an in-memory database that satisfies them.
//!
//! ## Layer 0 - Data Access
//!
//! Focus: table identity, catalog lookups, and administrative statements.
//!
//! ## Key Components
//!
//! - `TableId`: canonical, immutable (owner, name) identity
//! - `MetadataProvider`: table descriptions, child foreign keys, triggers
//! - `DataAccess`: statements, inserts, reloads, consistency markers
//! - `AdminStatement`: the administrative statement vocabulary and its SQL text
//! - `MemoryDatabase`: in-memory implementation of both traits

mod error;
pub mod memory;
mod schema;
pub mod statement;
pub mod storage_traits;

pub use error::StorageError;
pub use memory::MemoryDatabase;
pub use schema::{ColumnValues, ForeignKeyEdge, Scn, TableDescription, TableId, TriggerRecord};
pub use statement::AdminStatement;
pub use storage_traits::{DataAccess, MetadataProvider, StorageResult};
