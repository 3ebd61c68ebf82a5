//! dbfixture-core: referential graph traversal and dataset matching
//!
//! ## Layer 1 - Fixture Engine
//!
//! - `graph`: resolve a table into its foreign-key component and compute
//!   delete and restore orders, tolerating cycles and diamonds
//! - `bulk`: delete, truncate and point-in-time restore in dependency-safe order
//! - `dataset`: multi-table row collections with case-insensitive columns
//! - `matcher`: bounded-time polling comparison with a mismatch report
//! - `session`: one fixture-preparation session tying the above together

pub mod bulk;
pub mod config;
pub mod dataset;
pub mod error;
pub mod graph;
pub mod matcher;
pub mod obs;
pub mod session;
pub mod telemetry;

pub use bulk::{flashback_statements, restore_script, restore_statements, BulkOperationExecutor};
pub use config::FixtureConfig;
pub use dataset::predicate::{any_value, equal_to, is_null, not_null, one_of, satisfies};
pub use dataset::{
    expected_dataset, seed_dataset, ColumnPredicate, Dataset, DatasetBuilder, ExpectedDataset,
    LiveDataset, RenderCell, Row,
};
pub use error::{FixtureError, FixtureResult};
pub use graph::{
    delete_order, restore_order, walk_restore, GraphLoader, ReferentialConstraint,
    RestoreVisitor, TableGraph, TableKey, TableNode, Trigger,
};
pub use matcher::{
    compare, ColumnMismatch, Comparison, DatabaseDatasetLoader, DatasetMatcher, DatasetSource,
    MatchOutcome, TimedPeriod, UnmatchedRow,
};
pub use session::FixtureSession;

pub use dbfixture_store::{
    AdminStatement, DataAccess, MemoryDatabase, MetadataProvider, Scn, StorageError, TableId,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
