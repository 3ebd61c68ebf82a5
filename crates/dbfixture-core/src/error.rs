//! Error taxonomy for fixture preparation.
//!
//! A failed dataset match is not an error: it is reported through
//! [`crate::matcher::MatchOutcome`].

use dbfixture_store::StorageError;
use thiserror::Error;

/// Errors produced while resolving structure or mutating fixture tables.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The table (or its owner) could not be found, or matched more than once.
    #[error("failed to load table [{table}]{} from the database: {source}", schema_suffix(.schema))]
    SchemaLoad {
        table: String,
        schema: Option<String>,
        #[source]
        source: StorageError,
    },

    /// Disabling a constraint ahead of a destructive statement failed.
    #[error("failed to disable constraint {constraint} on {table}: {source}")]
    ConstraintToggle {
        table: String,
        constraint: String,
        #[source]
        source: StorageError,
    },

    /// Any underlying statement, insert or query failure.
    #[error("data access failed for table [{table}]{}: {source}", schema_suffix(.schema))]
    DataAccess {
        table: String,
        schema: Option<String>,
        #[source]
        source: StorageError,
    },

    /// A dataset was built or used incorrectly.
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    /// Configuration could not be read.
    #[error("invalid configuration: {0}")]
    Config(String),
}

fn schema_suffix(schema: &Option<String>) -> String {
    match schema {
        Some(schema) => format!(" in schema [{schema}]"),
        None => String::new(),
    }
}

impl FixtureError {
    /// Wrap a storage failure with the table it concerned.
    pub fn data_access(table: &dbfixture_store::TableId, source: StorageError) -> Self {
        FixtureError::DataAccess {
            table: table.name().to_string(),
            schema: table.owner().map(str::to_string),
            source,
        }
    }
}

/// Convenience result alias.
pub type FixtureResult<T> = std::result::Result<T, FixtureError>;
