//! Storage trait definitions for dbfixture
//!
//! These traits define the two seams between the fixture engine and a
//! concrete database:
//! - `MetadataProvider`: catalog lookups (table existence, child foreign keys, triggers)
//! - `DataAccess`: administrative statements, row inserts, row reloads, consistency markers
//!
//! Both traits are async and backend-agnostic. An in-memory implementation
//! is provided via the `memory` module.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::schema::{ColumnValues, ForeignKeyEdge, Scn, TableDescription, TableId, TriggerRecord};
use crate::statement::AdminStatement;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// MetadataProvider: catalog access
// ---------------------------------------------------------------------------

/// Read-only view of a database catalog.
///
/// `owner` is optional in every lookup; implementations fall back to their
/// default schema when it is `None`.
///
/// Guarantees:
/// - `describe_table` returns exactly one entry, or fails with
///   `StorageError::TableNotFound` (zero matches) or
///   `StorageError::AmbiguousTable` (more than one).
/// - `child_foreign_keys` lists the tables whose foreign keys reference the
///   given table, one entry per constraint.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Canonical owner, name and organization kind of a table.
    async fn describe_table(&self, name: &str, owner: Option<&str>)
        -> StorageResult<TableDescription>;

    /// Immediate child edges: constraints on other tables that reference this one.
    async fn child_foreign_keys(
        &self,
        name: &str,
        owner: Option<&str>,
    ) -> StorageResult<Vec<ForeignKeyEdge>>;

    /// Triggers defined on the table.
    async fn triggers_for(&self, name: &str, owner: Option<&str>)
        -> StorageResult<Vec<TriggerRecord>>;
}

// ---------------------------------------------------------------------------
// DataAccess: statements and rows
// ---------------------------------------------------------------------------

/// Mutating and querying access to table contents.
///
/// Every call is expected to commit independently; no transaction boundary
/// spans more than one call.
#[async_trait]
pub trait DataAccess: Send + Sync {
    /// Execute an administrative statement.
    async fn execute(&self, statement: &AdminStatement) -> StorageResult<()>;

    /// Insert a single row using bound parameters.
    async fn insert_row(&self, table: &TableId, columns: &ColumnValues) -> StorageResult<()>;

    /// Every row of the table, columns in reported order and casing.
    async fn select_rows(&self, table: &TableId) -> StorageResult<Vec<ColumnValues>>;

    /// Current consistency marker of the data source.
    async fn current_scn(&self) -> StorageResult<Scn>;
}
