//! Where live data comes from on each poll.

use async_trait::async_trait;
use dbfixture_store::TableId;

use crate::bulk::BulkOperationExecutor;
use crate::dataset::LiveDataset;
use crate::error::FixtureResult;

/// Produces a fresh live dataset on every call.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn load(&self) -> FixtureResult<LiveDataset>;
}

/// A fixed snapshot; every poll sees the same rows.
#[async_trait]
impl DatasetSource for LiveDataset {
    async fn load(&self) -> FixtureResult<LiveDataset> {
        Ok(self.clone())
    }
}

/// Reloads a fixed list of tables from the database.
#[derive(Clone)]
pub struct DatabaseDatasetLoader {
    executor: BulkOperationExecutor,
    tables: Vec<TableId>,
}

impl DatabaseDatasetLoader {
    pub fn new(executor: BulkOperationExecutor, tables: Vec<TableId>) -> Self {
        Self { executor, tables }
    }

    pub fn tables(&self) -> &[TableId] {
        &self.tables
    }
}

#[async_trait]
impl DatasetSource for DatabaseDatasetLoader {
    async fn load(&self) -> FixtureResult<LiveDataset> {
        self.executor.load_dataset(&self.tables).await
    }
}
