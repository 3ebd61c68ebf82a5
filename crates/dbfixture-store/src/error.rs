//! Error types for dbfixture-store

use thiserror::Error;

/// Errors that can occur while reading the catalog or touching table data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No catalog entry matched the requested table
    #[error("table not found: {name} (owner: {schema})", schema = .owner.as_deref().unwrap_or("<default>"))]
    TableNotFound { name: String, owner: Option<String> },

    /// More than one catalog entry matched the requested table
    #[error("table {name} is ambiguous: {matches} catalog entries matched")]
    AmbiguousTable { name: String, matches: usize },

    /// A statement referenced a table the backend does not know
    #[error("unknown table: {table}")]
    UnknownTable { table: String },

    /// A referential constraint rejected the statement
    #[error("constraint {constraint} violated: {detail}")]
    ConstraintViolation { constraint: String, detail: String },

    /// Flashback was attempted on a heap table without row movement enabled
    #[error("row movement is not enabled for table {table}")]
    RowMovementDisabled { table: String },

    /// The backend rejected the statement
    #[error("statement failed [{statement}]: {reason}")]
    StatementFailed { statement: String, reason: String },

    /// Any other backend failure (driver, connection, decoding)
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_not_found_mentions_default_owner_when_absent() {
        let err = StorageError::TableNotFound {
            name: "ORDERS".to_string(),
            owner: None,
        };
        assert_eq!(err.to_string(), "table not found: ORDERS (owner: <default>)");
    }

    #[test]
    fn statement_failed_displays_statement_text() {
        let err = StorageError::StatementFailed {
            statement: "truncate table ORDERS".to_string(),
            reason: "locked".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("truncate table ORDERS"));
        assert!(msg.contains("locked"));
    }
}
