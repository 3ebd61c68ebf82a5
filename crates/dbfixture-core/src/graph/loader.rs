//! Resolution of table names into a populated [`TableGraph`].
//!
//! A [`GraphLoader`] owns the graph and a memoization cache for one fixture
//! session. Entries are never invalidated: schema changes made after a table
//! was first resolved are not observed by the same loader.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dbfixture_store::{MetadataProvider, StorageError, TableId};
use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

use super::model::{TableGraph, TableKey, Trigger};
use crate::error::{FixtureError, FixtureResult};

pub struct GraphLoader {
    metadata: Arc<dyn MetadataProvider>,
    graph: TableGraph,
    /// Requested qualified name → resolved table.
    cache: HashMap<String, TableKey>,
    /// Tables whose child edges are still being resolved.
    in_progress: HashSet<TableKey>,
}

impl GraphLoader {
    pub fn new(metadata: Arc<dyn MetadataProvider>) -> Self {
        Self {
            metadata,
            graph: TableGraph::new(),
            cache: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    pub fn graph(&self) -> &TableGraph {
        &self.graph
    }

    pub fn into_graph(self) -> TableGraph {
        self.graph
    }

    /// Key of an already resolved table, without touching the catalog.
    pub fn cached(&self, table: &TableId) -> Option<TableKey> {
        self.cache.get(&table.qualified_name()).copied()
    }

    /// Resolve `table` and everything reachable from it through child
    /// foreign keys.
    ///
    /// On failure the graph and cache are left exactly as they were before
    /// the call.
    pub async fn resolve(&mut self, table: &TableId) -> FixtureResult<TableKey> {
        let mark = self.graph.mark();
        match self.resolve_inner(table.clone()).await {
            Ok(key) => Ok(key),
            Err(err) => {
                self.graph.rollback(mark);
                self.cache.retain(|_, key| key.index() < mark.tables());
                self.in_progress.clear();
                Err(err)
            }
        }
    }

    /// Resolve `name` or `owner.name`.
    pub async fn resolve_name(&mut self, name: &str) -> FixtureResult<TableKey> {
        let table = TableId::parse(name).map_err(|source| FixtureError::SchemaLoad {
            table: name.to_string(),
            schema: None,
            source,
        })?;
        self.resolve(&table).await
    }

    /// Resolve several tables, in order, sharing the cache.
    pub async fn resolve_all(&mut self, tables: &[TableId]) -> FixtureResult<Vec<TableKey>> {
        let mut keys = Vec::with_capacity(tables.len());
        for table in tables {
            keys.push(self.resolve(table).await?);
        }
        Ok(keys)
    }

    fn resolve_inner(&mut self, table: TableId) -> BoxFuture<'_, FixtureResult<TableKey>> {
        async move {
            let requested = table.qualified_name();
            if let Some(&key) = self.cache.get(&requested) {
                if self.in_progress.contains(&key) {
                    debug!(table = %requested, "foreign key cycle, linking without descent");
                }
                return Ok(key);
            }

            let description = self
                .metadata
                .describe_table(table.name(), table.owner())
                .await
                .map_err(schema_load(&table))?;
            let id = description.table_id();

            // Same table reached under a different spelling of its name.
            if let Some(key) = self.graph.key_of(&id) {
                self.cache.insert(requested, key);
                return Ok(key);
            }

            let key = self.graph.insert_table(id.clone(), description.index_organized);
            self.cache.insert(requested, key);
            self.cache.insert(id.qualified_name(), key);
            self.in_progress.insert(key);

            let edges = self
                .metadata
                .child_foreign_keys(id.name(), id.owner())
                .await
                .map_err(schema_load(&id))?;
            for edge in edges {
                let child = self.resolve_inner(edge.child_id()).await?;
                self.graph.link(&edge.constraint_name, child, key);
            }

            let triggers = self
                .metadata
                .triggers_for(id.name(), id.owner())
                .await
                .map_err(schema_load(&id))?;
            self.graph
                .set_triggers(key, triggers.into_iter().map(Trigger::from).collect());

            self.in_progress.remove(&key);
            let node = self.graph.table(key);
            debug!(
                table = %id,
                children = node.child_constraints().len(),
                parents = node.parent_constraints().len(),
                triggers = node.triggers().len(),
                "resolved table structure"
            );
            Ok(key)
        }
        .boxed()
    }
}

fn schema_load(table: &TableId) -> impl FnOnce(StorageError) -> FixtureError + '_ {
    move |source| FixtureError::SchemaLoad {
        table: table.name().to_string(),
        schema: table.owner().map(str::to_string),
        source,
    }
}
