//! One fixture-preparation session.
//!
//! A [`FixtureSession`] owns the structure cache ([`GraphLoader`]) for its
//! whole lifetime and drives the bulk executor and matcher:
//!
//! ```ignore
//! let mut session = FixtureSession::with_database(db, FixtureConfig::default().with_restore(true));
//! session.begin().await?;
//! session.prepare(&seed).await?;
//! // ... code under test ...
//! let outcome = session.assert_contains(&expected).await?;
//! assert!(outcome.is_match(), "{outcome}");
//! session.finish().await?;
//! ```

use std::sync::Arc;

use dbfixture_store::{DataAccess, MetadataProvider, Scn, TableId};
use tracing::{debug, info, Instrument};

use crate::bulk::{self, BulkOperationExecutor};
use crate::config::FixtureConfig;
use crate::dataset::{Dataset, ExpectedDataset, LiveDataset};
use crate::error::FixtureResult;
use crate::graph::{restore_order, GraphLoader, TableGraph, TableKey};
use crate::matcher::{DatabaseDatasetLoader, DatasetMatcher, MatchOutcome};
use crate::obs;

pub struct FixtureSession {
    config: FixtureConfig,
    loader: GraphLoader,
    executor: BulkOperationExecutor,
    matcher: DatasetMatcher,
    restore_point: Option<Scn>,
    /// Tables prepared in this session, in first-touched order.
    touched: Vec<TableKey>,
    span: tracing::Span,
}

impl FixtureSession {
    pub fn new(
        metadata: Arc<dyn MetadataProvider>,
        data: Arc<dyn DataAccess>,
        config: FixtureConfig,
    ) -> Self {
        Self {
            matcher: DatasetMatcher::new(config.timed_period()),
            loader: GraphLoader::new(metadata),
            executor: BulkOperationExecutor::new(data),
            restore_point: None,
            touched: Vec::new(),
            span: obs::session_span(),
            config,
        }
    }

    /// Session over a backend that serves both catalog and data.
    pub fn with_database<D>(db: Arc<D>, config: FixtureConfig) -> Self
    where
        D: MetadataProvider + DataAccess + 'static,
    {
        Self::new(db.clone(), db, config)
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    pub fn graph(&self) -> &TableGraph {
        self.loader.graph()
    }

    pub fn executor(&self) -> &BulkOperationExecutor {
        &self.executor
    }

    /// Span the session's async operations run under.
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    pub fn restore_point(&self) -> Option<Scn> {
        self.restore_point
    }

    pub fn touched_tables(&self) -> impl Iterator<Item = &TableId> {
        self.touched.iter().map(|k| self.loader.graph().table(*k).id())
    }

    /// Apply the configured default schema to an owner-less table.
    pub fn qualify(&self, table: &TableId) -> TableId {
        match (table.owner(), &self.config.default_schema) {
            (None, Some(schema)) => TableId::qualified(schema, table.name()),
            _ => table.clone(),
        }
    }

    /// Record the restore point when restore is enabled.
    pub async fn begin(&mut self) -> FixtureResult<Option<Scn>> {
        let span = self.span.clone();
        self.record_restore_point().instrument(span).await
    }

    async fn record_restore_point(&mut self) -> FixtureResult<Option<Scn>> {
        if self.config.restore {
            let scn = self.executor.current_scn().await?;
            info!(scn = %scn, "recorded restore point");
            self.restore_point = Some(scn);
        }
        Ok(self.restore_point)
    }

    pub async fn resolve_tables(&mut self, tables: &[TableId]) -> FixtureResult<Vec<TableKey>> {
        let qualified: Vec<TableId> = tables.iter().map(|t| self.qualify(t)).collect();
        let span = self.span.clone();
        let keys = self.loader.resolve_all(&qualified).instrument(span.clone()).await?;
        span.in_scope(|| obs::emit_tables_resolved(keys.len(), self.loader.graph().len()));
        Ok(keys)
    }

    /// Resolve the structure of every table the dataset names.
    pub async fn resolve_dataset<C>(&mut self, dataset: &Dataset<C>) -> FixtureResult<Vec<TableKey>> {
        let tables: Vec<TableId> = dataset.tables().cloned().collect();
        self.resolve_tables(&tables).await
    }

    /// Empty the dataset's tables (and the tables referencing them), then
    /// insert the dataset with triggers disabled.
    ///
    /// Triggers are re-enabled even when an insert fails.
    pub async fn prepare(&mut self, dataset: &LiveDataset) -> FixtureResult<()> {
        let keys = self.resolve_dataset(dataset).await?;
        let span = self.span.clone();
        self.prepare_resolved(dataset, keys).instrument(span).await
    }

    async fn prepare_resolved(
        &mut self,
        dataset: &LiveDataset,
        keys: Vec<TableKey>,
    ) -> FixtureResult<()> {
        for key in &keys {
            if !self.touched.contains(key) {
                self.touched.push(*key);
            }
        }

        let graph = self.loader.graph();
        if let Some(scn) = self.restore_point {
            info!(
                scn = %scn,
                script = %bulk::restore_script(graph, &self.touched, scn),
                "restore script"
            );
        }

        self.executor.delete_tables(graph, &keys).await?;
        self.executor.disable_triggers(graph, &keys).await?;

        let canonical: Vec<(&TableId, &TableId)> = dataset
            .tables()
            .zip(&keys)
            .map(|(table, key)| (table, graph.table(*key).id()))
            .collect();
        let mut rows = dataset.clone();
        rows.retarget(|table| {
            canonical
                .iter()
                .find(|(requested, _)| *requested == table)
                .map_or_else(|| table.clone(), |(_, id)| (*id).clone())
        });

        let inserted = self.executor.insert_dataset(&rows).await;
        let enabled = self.executor.enable_triggers(graph, &keys).await;
        inserted?;
        enabled?;

        obs::emit_fixture_prepared(keys.len(), rows.non_empty_rows().count());
        Ok(())
    }

    /// Dry run of [`FixtureSession::finish`], if a restore point exists.
    pub fn restore_script(&self) -> Option<String> {
        self.restore_point
            .map(|scn| bulk::restore_script(self.loader.graph(), &self.touched, scn))
    }

    /// Flash every touched table, and every table connected to one, back to
    /// the restore point. Does nothing when restore is disabled.
    ///
    /// The restore point is kept when the restore fails, so `finish` can be
    /// retried.
    pub async fn finish(&mut self) -> FixtureResult<()> {
        let span = self.span.clone();
        self.restore_touched().instrument(span).await
    }

    async fn restore_touched(&mut self) -> FixtureResult<()> {
        let Some(scn) = self.restore_point else {
            debug!("no restore point, leaving tables as they are");
            return Ok(());
        };
        let graph = self.loader.graph();
        self.executor.restore_tables(graph, &self.touched, scn).await?;
        obs::emit_restore_completed(restore_order(graph, &self.touched).len(), scn.0);
        self.restore_point = None;
        self.touched.clear();
        Ok(())
    }

    /// Live-data source over `tables`, qualified with the default schema.
    pub fn loader_for(&self, tables: &[TableId]) -> DatabaseDatasetLoader {
        DatabaseDatasetLoader::new(
            self.executor.clone(),
            tables.iter().map(|t| self.qualify(t)).collect(),
        )
    }

    /// Poll the database until it contains `expected`, within the configured
    /// time budget.
    pub async fn assert_contains(&self, expected: &ExpectedDataset) -> FixtureResult<MatchOutcome> {
        let tables: Vec<TableId> = expected.tables().cloned().collect();
        let source = self.loader_for(&tables);
        self.matcher
            .matches(expected, &source)
            .instrument(self.span.clone())
            .await
    }
}
